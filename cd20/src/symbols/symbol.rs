use smol_str::SmolStr;
use std::fmt;

use crate::types::DataType;

/// Handle to a symbol stored in the [`SymbolTableManager`](super::SymbolTableManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    /// Carries a type for checking only. Never allocated.
    Temporary,
    IntVariable,
    IntConstant,
    RealVariable,
    RealConstant,
    BoolVariable,
    BoolConstant,
    StringConstant,
    StructOrArrayVariable,
    /// Name of a user defined type.
    TypeName,
}

impl SymbolKind {
    /// Kind of a variable that holds values of the given type.
    pub fn variable(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int => SymbolKind::IntVariable,
            DataType::Real => SymbolKind::RealVariable,
            DataType::Bool => SymbolKind::BoolVariable,
            DataType::String => SymbolKind::StringConstant,
            DataType::Void => SymbolKind::Temporary,
            DataType::Struct(_) | DataType::Array(_) => SymbolKind::StructOrArrayVariable,
        }
    }

    /// Kind of a named constant that holds a value of the given type.
    pub fn constant(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int => SymbolKind::IntConstant,
            DataType::Real => SymbolKind::RealConstant,
            DataType::Bool => SymbolKind::BoolConstant,
            DataType::String => SymbolKind::StringConstant,
            other => SymbolKind::variable(other),
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, SymbolKind::Function)
    }
}

impl fmt::Display for SymbolKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Function              => write!(f, "function"),
            Self::Temporary             => write!(f, "temporary"),
            Self::IntVariable           => write!(f, "int variable"),
            Self::IntConstant           => write!(f, "int constant"),
            Self::RealVariable          => write!(f, "real variable"),
            Self::RealConstant          => write!(f, "real constant"),
            Self::BoolVariable          => write!(f, "bool variable"),
            Self::BoolConstant          => write!(f, "bool constant"),
            Self::StringConstant        => write!(f, "string constant"),
            Self::StructOrArrayVariable => write!(f, "struct/array variable"),
            Self::TypeName              => write!(f, "type"),
        }
    }
}

/// Fact attached to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    DataType(DataType),
    IntegerConstant(i64),
    FloatConstant(f64),
    StringConstant(SmolStr),
    /// Declared return type of a function.
    ReturnType(DataType),
    /// Attached to a function, once per parameter, in declaration order.
    ParameterOf(SymbolId),
    IsParameter,
    /// Value can't be reassigned.
    Immutable,
}

/// Tag of an [`Attribute`] variant, used for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    DataType,
    IntegerConstant,
    FloatConstant,
    StringConstant,
    ReturnType,
    ParameterOf,
    IsParameter,
    Immutable,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::DataType(_) => AttributeKind::DataType,
            Attribute::IntegerConstant(_) => AttributeKind::IntegerConstant,
            Attribute::FloatConstant(_) => AttributeKind::FloatConstant,
            Attribute::StringConstant(_) => AttributeKind::StringConstant,
            Attribute::ReturnType(_) => AttributeKind::ReturnType,
            Attribute::ParameterOf(_) => AttributeKind::ParameterOf,
            Attribute::IsParameter => AttributeKind::IsParameter,
            Attribute::Immutable => AttributeKind::Immutable,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Attribute::DataType(ty) => write!(f, "type {}", ty),
            Attribute::IntegerConstant(value) => write!(f, "int {}", value),
            Attribute::FloatConstant(value) => write!(f, "real {:?}", value),
            Attribute::StringConstant(value) => write!(f, "string {:?}", value),
            Attribute::ReturnType(ty) => write!(f, "returns {}", ty),
            Attribute::ParameterOf(id) => write!(f, "param {}", id),
            Attribute::IsParameter => write!(f, "parameter"),
            Attribute::Immutable => write!(f, "immutable"),
        }
    }
}

/// Storage region, selected at runtime by a base register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseRegister {
    /// Read only code and constant area. Base register 0.
    Constants,
    /// Program lifetime variables. Base register 1.
    Globals,
    /// Current function frame. Base register 2.
    Declarations,
}

impl BaseRegister {
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            BaseRegister::Constants => 0,
            BaseRegister::Globals => 1,
            BaseRegister::Declarations => 2,
        }
    }
}

/// Location of a symbol's value at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Storage {
    pub register: BaseRegister,
    pub offset: i32,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.register.index(), self.offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: SmolStr,
    /// Declaration position.
    pub line: u32,
    pub column: u32,
    /// Name of the owning scope. Set on insertion.
    pub scope: SmolStr,
    attributes: Vec<Attribute>,
    /// Unset until the symbol is bound to a storage region.
    storage: Option<Storage>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<SmolStr>, line: u32, column: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            line,
            column,
            scope: SmolStr::default(),
            attributes: Vec::new(),
            storage: None,
        }
    }

    /// Builder style attribute.
    #[inline]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[inline]
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// First attribute with the given tag.
    pub fn attribute(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.kind() == kind)
    }

    /// All attributes with the given tag, in insertion order.
    pub fn attributes(&self, kind: AttributeKind) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(move |attr| attr.kind() == kind)
    }

    #[inline]
    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        self.attribute(kind).is_some()
    }

    pub fn data_type(&self) -> Option<&DataType> {
        match self.attribute(AttributeKind::DataType) {
            Some(Attribute::DataType(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<&DataType> {
        match self.attribute(AttributeKind::ReturnType) {
            Some(Attribute::ReturnType(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Parameters of a function, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.attributes(AttributeKind::ParameterOf).filter_map(|attr| match attr {
            Attribute::ParameterOf(id) => Some(*id),
            _ => None,
        })
    }

    #[inline]
    pub fn is_immutable(&self) -> bool {
        self.has_attribute(AttributeKind::Immutable)
    }

    #[inline]
    pub fn is_parameter(&self) -> bool {
        self.has_attribute(AttributeKind::IsParameter)
    }

    #[inline]
    pub fn storage(&self) -> Option<Storage> {
        self.storage
    }

    /// Bind the symbol to its runtime location.
    #[inline]
    pub fn set_storage(&mut self, register: BaseRegister, offset: i32) {
        self.storage = Some(Storage { register, offset });
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <{}> {}:{}", self.name, self.kind, self.line, self.column)?;
        match self.storage {
            Some(storage) => write!(f, " @{}", storage)?,
            None => write!(f, " @unset")?,
        }
        for attribute in &self.attributes {
            write!(f, " [{}]", attribute)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let symbol = Symbol::new(SymbolKind::Function, "add", 3, 6)
            .with_attribute(Attribute::ReturnType(DataType::Int))
            .with_attribute(Attribute::ParameterOf(SymbolId(4)))
            .with_attribute(Attribute::ParameterOf(SymbolId(5)));

        assert_eq!(symbol.return_type(), Some(&DataType::Int));
        assert_eq!(symbol.data_type(), None);
        assert_eq!(symbol.attributes(AttributeKind::ParameterOf).count(), 2);
        assert_eq!(symbol.parameters().collect::<Vec<_>>(), vec![SymbolId(4), SymbolId(5)]);
        assert!(!symbol.is_immutable());
    }

    #[test]
    fn test_storage_starts_unset() {
        let mut symbol = Symbol::new(SymbolKind::IntVariable, "x", 1, 1);
        assert_eq!(symbol.storage(), None);

        symbol.set_storage(BaseRegister::Globals, 8);
        assert_eq!(
            symbol.storage(),
            Some(Storage {
                register: BaseRegister::Globals,
                offset: 8
            })
        );
    }
}
