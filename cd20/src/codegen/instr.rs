//! Instructions as placed in the code stream.
use std::fmt;

use super::Operation;
use crate::{
    constants::ADDRESS_INSTR_SIZE,
    error::{Cd20Error, Cd20Result},
    symbols::{BaseRegister, SymbolId, SymbolTableManager},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Operation followed by literal operand bytes.
    Simple { op: Operation, operands: Vec<u8> },
    /// Load of a symbol's address or value.
    ///
    /// Emitted with a placeholder operation. The concrete load and the
    /// 4-byte offset are filled in once every symbol has its storage.
    Backfill {
        op: Operation,
        symbol: SymbolId,
        operands: [u8; 4],
    },
}

impl Instruction {
    #[inline]
    pub fn simple(op: Operation) -> Self {
        Instruction::Simple { op, operands: vec![] }
    }

    #[inline]
    pub fn with_operands(op: Operation, operands: impl Into<Vec<u8>>) -> Self {
        Instruction::Simple {
            op,
            operands: operands.into(),
        }
    }

    /// Load of a symbol to be resolved later.
    ///
    /// `placeholder` must be [`Operation::PlaceholderLa`] or [`Operation::PlaceholderLv`].
    #[inline]
    pub fn backfill(placeholder: Operation, symbol: SymbolId) -> Self {
        debug_assert!(placeholder.is_placeholder(), "{} is not a placeholder", placeholder);
        Instruction::Backfill {
            op: placeholder,
            symbol,
            operands: [0; 4],
        }
    }

    #[inline]
    pub fn op(&self) -> Operation {
        match self {
            Instruction::Simple { op, .. } | Instruction::Backfill { op, .. } => *op,
        }
    }

    #[inline]
    pub fn operands(&self) -> &[u8] {
        match self {
            Instruction::Simple { operands, .. } => operands.as_slice(),
            Instruction::Backfill { operands, .. } => operands.as_slice(),
        }
    }

    /// Size in bytes, including the opcode.
    ///
    /// Backfilled loads are always full width, resolved or not.
    pub fn size(&self) -> usize {
        match self {
            Instruction::Simple { operands, .. } => 1 + operands.len(),
            Instruction::Backfill { .. } => ADDRESS_INSTR_SIZE,
        }
    }

    /// Overwrite the operand bytes of a simple instruction in place.
    pub fn patch(&mut self, bytes: &[u8]) -> Cd20Result<()> {
        match self {
            Instruction::Simple { operands, .. } if operands.len() == bytes.len() => {
                operands.copy_from_slice(bytes);
                Ok(())
            }
            other => Err(Cd20Error::internal(format!(
                "cannot patch {} operand byte(s) into {}",
                bytes.len(),
                other
            ))),
        }
    }

    /// Resolve a backfilled load against its symbol's storage.
    ///
    /// Resolving is idempotent. Simple instructions are left untouched.
    pub fn resolve(&mut self, symbols: &SymbolTableManager) -> Cd20Result<()> {
        if let Instruction::Backfill { op, symbol, operands } = self {
            let storage = symbols.symbol(*symbol).storage().ok_or_else(|| {
                Cd20Error::internal(format!(
                    "symbol {} has no storage to backfill {} with",
                    symbols.symbol(*symbol),
                    op
                ))
            })?;

            let is_address = matches!(op, Operation::PlaceholderLa | Operation::La0 | Operation::La1 | Operation::La2);
            *op = match (storage.register, is_address) {
                (BaseRegister::Constants, true) => Operation::La0,
                (BaseRegister::Constants, false) => Operation::Lv0,
                (BaseRegister::Globals, true) => Operation::La1,
                (BaseRegister::Globals, false) => Operation::Lv1,
                (BaseRegister::Declarations, true) => Operation::La2,
                (BaseRegister::Declarations, false) => Operation::Lv2,
            };
            *operands = storage.offset.to_be_bytes();
        }

        Ok(())
    }
}

/// Debug listing form: `MNEMONIC (code): operands`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = self.op();
        write!(f, "{:<5} ({:02}):", op.mnemonic(), op.code())?;
        for byte in self.operands() {
            write!(f, " {:02}", byte)?;
        }
        if let Instruction::Backfill { symbol, .. } = self {
            write!(f, " <{}>", symbol)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        symbols::{Attribute, Symbol, SymbolKind},
        types::DataType,
    };

    fn manager_with_global() -> (SymbolTableManager, SymbolId) {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("global");
        symbols.insert_symbol(
            Symbol::new(SymbolKind::IntVariable, "a", 1, 1).with_attribute(Attribute::DataType(DataType::Int)),
            Some(BaseRegister::Globals),
        );
        let id = symbols.insert_symbol(
            Symbol::new(SymbolKind::IntVariable, "b", 1, 1).with_attribute(Attribute::DataType(DataType::Int)),
            Some(BaseRegister::Globals),
        );
        (symbols, id)
    }

    #[test]
    fn test_sizes() {
        assert_eq!(Instruction::simple(Operation::Halt).size(), 1);
        assert_eq!(Instruction::with_operands(Operation::Lb, [3]).size(), 2);
        assert_eq!(Instruction::backfill(Operation::PlaceholderLv, SymbolId(0)).size(), 5);
    }

    #[test]
    fn test_resolve_by_register() {
        let (symbols, id) = manager_with_global();

        let mut value = Instruction::backfill(Operation::PlaceholderLv, id);
        let mut address = Instruction::backfill(Operation::PlaceholderLa, id);
        value.resolve(&symbols).unwrap();
        address.resolve(&symbols).unwrap();

        assert_eq!(value.op(), Operation::Lv1);
        assert_eq!(value.operands(), &[0, 0, 0, 8]);
        assert_eq!(address.op(), Operation::La1);
        assert_eq!(address.size(), 5);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let (symbols, id) = manager_with_global();

        let mut instr = Instruction::backfill(Operation::PlaceholderLa, id);
        instr.resolve(&symbols).unwrap();
        let first = instr.clone();
        instr.resolve(&symbols).unwrap();
        assert_eq!(instr, first);
    }

    #[test]
    fn test_resolve_negative_offset() {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("__function__f");
        let id = symbols.insert_symbol(
            Symbol::new(SymbolKind::IntVariable, "p", 1, 1).with_attribute(Attribute::IsParameter),
            Some(BaseRegister::Declarations),
        );

        let mut instr = Instruction::backfill(Operation::PlaceholderLv, id);
        instr.resolve(&symbols).unwrap();
        assert_eq!(instr.op(), Operation::Lv2);
        assert_eq!(instr.operands(), &[0xFF, 0xFF, 0xFF, 0xF8]);
    }

    #[test]
    fn test_resolve_unset_storage() {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("global");
        let id = symbols.insert_symbol(Symbol::new(SymbolKind::Function, "f", 1, 1), None);

        let mut instr = Instruction::backfill(Operation::PlaceholderLa, id);
        assert!(matches!(instr.resolve(&symbols), Err(Cd20Error::Internal(_))));
    }

    #[test]
    fn test_patch() {
        let mut jump = Instruction::with_operands(Operation::La0, [0; 4]);
        jump.patch(&[0, 0, 0, 42]).unwrap();
        assert_eq!(jump.operands(), &[0, 0, 0, 42]);

        assert!(jump.patch(&[1]).is_err());
        assert!(Instruction::backfill(Operation::PlaceholderLa, SymbolId(0))
            .patch(&[0; 4])
            .is_err());
    }
}
