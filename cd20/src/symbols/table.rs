use smol_str::SmolStr;
use std::collections::HashMap;

use super::SymbolId;

/// Symbols declared in one scope.
///
/// Keeps insertion order so dumps and allocation are deterministic.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scope: SmolStr,
    order: Vec<SymbolId>,
    names: HashMap<SmolStr, SymbolId>,
}

impl SymbolTable {
    pub fn new(scope: impl Into<SmolStr>) -> Self {
        Self {
            scope: scope.into(),
            order: Vec::new(),
            names: HashMap::new(),
        }
    }

    #[inline]
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }

    /// Adds the symbol, replacing an existing mapping with the same name.
    pub fn insert(&mut self, name: SmolStr, id: SymbolId) {
        match self.names.insert(name, id) {
            Some(old) => {
                // Replace in place, keeping the original position.
                if let Some(slot) = self.order.iter_mut().find(|slot| **slot == old) {
                    *slot = id;
                }
            }
            None => self.order.push(id),
        }
    }

    #[inline]
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.order.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut table = SymbolTable::new("global");
        table.insert("zeta".into(), SymbolId(0));
        table.insert("alpha".into(), SymbolId(1));
        table.insert("mid".into(), SymbolId(2));

        assert_eq!(table.symbols().collect::<Vec<_>>(), vec![SymbolId(0), SymbolId(1), SymbolId(2)]);
        assert_eq!(table.resolve("alpha"), Some(SymbolId(1)));
        assert!(table.contains("mid"));
        assert!(!table.contains("other"));
        assert_eq!(table.scope(), "global");
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut table = SymbolTable::new("main");
        table.insert("a".into(), SymbolId(0));
        table.insert("b".into(), SymbolId(1));
        table.insert("a".into(), SymbolId(7));

        assert_eq!(table.len(), 2);
        assert_eq!(table.symbols().collect::<Vec<_>>(), vec![SymbolId(7), SymbolId(1)]);
    }
}
