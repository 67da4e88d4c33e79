use smol_str::SmolStr;
use std::{collections::HashMap, fmt};

use super::{Attribute, BaseRegister, Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::{
    constants::{GLOBALS_BASE, LOCALS_BASE, PARAMS_BASE, SLOT_SIZE},
    error::{Cd20Error, Cd20Result},
    types::DataType,
};

/// Owns every symbol of a translation unit, and the scopes they live in.
///
/// Symbols are stored in one arena and referred to by [`SymbolId`].
/// Scopes are opened and closed in stack order while parsing, and
/// re-entered by name during code generation.
pub struct SymbolTableManager {
    /// Arena of all symbols, including temporaries.
    symbols: Vec<Symbol>,
    /// Every scope ever created, in creation order.
    tables: Vec<SymbolTable>,
    /// Lookup from scope name into `tables`.
    table_index: HashMap<SmolStr, usize>,
    /// Currently open scopes, innermost on top.
    stack: Vec<usize>,
    /// Interned literals. Never searched by scope.
    constants: SymbolTable,
    globals_offset: i32,
    locals_offset: i32,
    params_offset: i32,
}

impl SymbolTableManager {
    pub const CONSTANTS_SCOPE: &'static str = "constants";

    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            tables: Vec::new(),
            table_index: HashMap::new(),
            stack: Vec::new(),
            constants: SymbolTable::new(Self::CONSTANTS_SCOPE),
            globals_offset: GLOBALS_BASE,
            locals_offset: LOCALS_BASE,
            params_offset: PARAMS_BASE,
        }
    }

    /// Name of the innermost open scope.
    pub fn current_scope(&self) -> Option<&str> {
        self.stack.last().map(|index| self.tables[*index].scope())
    }

    /// Create a new, empty scope and enter it.
    ///
    /// Creating a scope with the name of an existing one replaces it.
    pub fn create_scope(&mut self, name: impl Into<SmolStr>) {
        let name = name.into();
        log::debug!("create scope {}", name);

        let index = match self.table_index.get(&name) {
            Some(index) => {
                self.tables[*index] = SymbolTable::new(name.clone());
                *index
            }
            None => {
                self.tables.push(SymbolTable::new(name.clone()));
                self.table_index.insert(name, self.tables.len() - 1);
                self.tables.len() - 1
            }
        };

        self.push_scope(index);
    }

    /// Re-open a previously created scope.
    pub fn enter_scope(&mut self, name: &str) -> Cd20Result<()> {
        let index = self
            .table_index
            .get(name)
            .copied()
            .ok_or_else(|| Cd20Error::internal(format!("unknown scope '{}'", name)))?;
        self.push_scope(index);
        Ok(())
    }

    /// Every scope starts a fresh function frame.
    fn push_scope(&mut self, index: usize) {
        self.locals_offset = LOCALS_BASE;
        self.params_offset = PARAMS_BASE;
        self.stack.push(index);
    }

    /// Close the innermost scope, returning its name.
    pub fn leave_scope(&mut self) -> Option<&str> {
        let index = self.stack.pop()?;
        Some(self.tables[index].scope())
    }

    /// Add a symbol to the innermost open scope.
    ///
    /// When a region is given, the symbol is bound to the next free offset
    /// in it. Parameters in the declarations region grow downward from the
    /// frame, locals grow upward.
    pub fn insert_symbol(&mut self, mut symbol: Symbol, region: Option<BaseRegister>) -> SymbolId {
        debug_assert!(!self.stack.is_empty(), "symbol inserted without an open scope");

        if let Some(scope) = self.current_scope() {
            symbol.scope = SmolStr::from(scope);
        }

        if let Some(register) = region {
            let offset = self.next_available_offset(register, symbol.is_parameter());
            symbol.set_storage(register, offset);
            log::debug!("{} '{}' bound to {}:{}", symbol.kind, symbol.name, register.index(), offset);
        }

        let name = symbol.name.clone();
        let id = self.alloc(symbol);
        if let Some(index) = self.stack.last() {
            self.tables[*index].insert(name, id);
        }
        id
    }

    /// Hand out the next offset of a region.
    ///
    /// Offsets of the constants region are laid out by the code manager,
    /// so zero is returned for it.
    pub fn next_available_offset(&mut self, register: BaseRegister, is_parameter: bool) -> i32 {
        let counter = match register {
            BaseRegister::Constants => return 0,
            BaseRegister::Globals => &mut self.globals_offset,
            BaseRegister::Declarations if is_parameter => {
                let offset = self.params_offset;
                self.params_offset -= SLOT_SIZE;
                return offset;
            }
            BaseRegister::Declarations => &mut self.locals_offset,
        };

        let offset = *counter;
        *counter += SLOT_SIZE;
        offset
    }

    /// Search the open scopes from innermost to outermost.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.stack
            .iter()
            .rev()
            .find_map(|index| self.tables[*index].resolve(name))
    }

    /// Whether the innermost scope declares the name.
    ///
    /// Outer scopes are not searched, so shadowing is allowed.
    pub fn contains_in_current_scope(&self, name: &str) -> bool {
        self.stack
            .last()
            .map(|index| self.tables[*index].contains(name))
            .unwrap_or(false)
    }

    /// Add a symbol to the constant pool, keyed by its literal text.
    pub fn insert_constant(&mut self, key: impl Into<SmolStr>, mut symbol: Symbol) -> SymbolId {
        symbol.scope = SmolStr::from(Self::CONSTANTS_SCOPE);
        let id = self.alloc(symbol);
        self.constants.insert(key.into(), id);
        id
    }

    pub fn resolve_constant(&self, key: &str) -> Option<SymbolId> {
        self.constants.resolve(key)
    }

    /// Pooled constants in insertion order.
    pub fn constants(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.constants.symbols()
    }

    /// Create a symbol that only carries a type, outside of any scope.
    pub fn create_temporary(&mut self, data_type: DataType, line: u32, column: u32) -> SymbolId {
        let symbol = Symbol::new(SymbolKind::Temporary, "", line, column).with_attribute(Attribute::DataType(data_type));
        self.alloc(symbol)
    }

    fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    /// Symbol behind a handle handed out by this manager.
    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    #[inline]
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    /// Type of the value a symbol yields when read or called.
    pub fn value_type(&self, id: SymbolId) -> DataType {
        let symbol = self.symbol(id);
        let data_type = if symbol.kind.is_function() {
            symbol.return_type()
        } else {
            symbol.data_type()
        };
        data_type.cloned().unwrap_or(DataType::Void)
    }

    pub fn table(&self, scope: &str) -> Option<&SymbolTable> {
        self.table_index.get(scope).map(|index| &self.tables[*index])
    }

    /// Total number of symbols, temporaries included.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTableManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Human readable dump of every scope.
impl fmt::Display for SymbolTableManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "symbol tables: {}", self.tables.len())?;
        writeln!(f, "current scope: {}", self.current_scope().unwrap_or("<none>"))?;

        for table in self.tables.iter().chain(std::iter::once(&self.constants)) {
            writeln!(f, "[{}]", table.scope())?;
            for id in table.symbols() {
                writeln!(f, "  {} {}", id, self.symbol(id))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn variable(name: &str) -> Symbol {
        Symbol::new(SymbolKind::IntVariable, name, 1, 1).with_attribute(Attribute::DataType(DataType::Int))
    }

    #[test]
    fn test_shadowing() {
        let mut manager = SymbolTableManager::new();
        manager.create_scope("global");
        let outer = manager.insert_symbol(variable("x"), Some(BaseRegister::Globals));

        manager.create_scope("inner");
        assert!(!manager.contains_in_current_scope("x"));
        let inner = manager.insert_symbol(variable("x"), Some(BaseRegister::Globals));
        assert_eq!(manager.resolve("x"), Some(inner));
        assert_eq!(manager.symbol(inner).scope, "inner");

        assert_eq!(manager.leave_scope(), Some("inner"));
        assert_eq!(manager.resolve("x"), Some(outer));
        assert_eq!(manager.resolve("y"), None);
    }

    #[test]
    fn test_offsets_per_region() {
        let mut manager = SymbolTableManager::new();
        manager.create_scope("global");
        let globals: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| manager.insert_symbol(variable(name), Some(BaseRegister::Globals)))
            .collect();
        let offsets: Vec<_> = globals
            .iter()
            .map(|id| manager.symbol(*id).storage().unwrap().offset)
            .collect();
        assert_eq!(offsets, vec![0, 8, 16]);

        manager.create_scope("__function__f");
        let param_a = manager.insert_symbol(
            variable("p").with_attribute(Attribute::IsParameter),
            Some(BaseRegister::Declarations),
        );
        let param_b = manager.insert_symbol(
            variable("q").with_attribute(Attribute::IsParameter),
            Some(BaseRegister::Declarations),
        );
        let local_a = manager.insert_symbol(variable("l"), Some(BaseRegister::Declarations));
        let local_b = manager.insert_symbol(variable("m"), Some(BaseRegister::Declarations));

        let offset = |id: SymbolId| manager.symbol(id).storage().unwrap().offset;
        assert_eq!(offset(param_a), -8);
        assert_eq!(offset(param_b), -16);
        assert_eq!(offset(local_a), 16);
        assert_eq!(offset(local_b), 24);
    }

    #[test]
    fn test_enter_scope_resets_frame() {
        let mut manager = SymbolTableManager::new();
        manager.create_scope("global");
        manager.create_scope("__function__f");
        manager.insert_symbol(variable("a"), Some(BaseRegister::Declarations));
        manager.leave_scope();

        manager.create_scope("__function__g");
        let b = manager.insert_symbol(variable("b"), Some(BaseRegister::Declarations));
        assert_eq!(manager.symbol(b).storage().unwrap().offset, 16);
        manager.leave_scope();

        assert!(manager.enter_scope("__function__f").is_ok());
        assert_eq!(manager.next_available_offset(BaseRegister::Declarations, false), 16);
        assert!(manager.enter_scope("missing").is_err());
    }

    #[test]
    fn test_constant_pool() {
        let mut manager = SymbolTableManager::new();
        manager.create_scope("global");
        let one = manager.insert_constant(
            "1",
            Symbol::new(SymbolKind::IntConstant, "1", 1, 1).with_attribute(Attribute::IntegerConstant(1)),
        );
        assert_eq!(manager.resolve_constant("1"), Some(one));
        assert_eq!(manager.resolve("1"), None);
        assert_eq!(manager.constants().collect::<Vec<_>>(), vec![one]);
        assert_eq!(manager.symbol(one).storage(), None);
    }
}
