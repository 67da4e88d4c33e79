//! Symbols and scoped symbol tables.
mod manager;
mod symbol;
mod table;

pub use self::{
    manager::SymbolTableManager,
    symbol::{Attribute, AttributeKind, BaseRegister, Storage, Symbol, SymbolId, SymbolKind},
    table::SymbolTable,
};
