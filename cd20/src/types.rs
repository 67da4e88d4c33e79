//! Data types of CD20 values.
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Real,
    Bool,
    String,
    Void,
    /// User defined record, by type name.
    Struct(SmolStr),
    /// User defined array, by type name.
    Array(SmolStr),
}

impl DataType {
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Real)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, DataType::Bool)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void)
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        matches!(self, DataType::Struct(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array(_))
    }

    /// Whether a value of this type may be stored in a variable of the `target` type.
    ///
    /// Types are only compatible with themselves.
    #[inline]
    pub fn is_assignable_to(&self, target: &DataType) -> bool {
        self == target
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Real => write!(f, "real"),
            DataType::Bool => write!(f, "bool"),
            DataType::String => write!(f, "string"),
            DataType::Void => write!(f, "void"),
            DataType::Struct(name) => write!(f, "struct {}", name),
            DataType::Array(name) => write!(f, "array {}", name),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(DataType::Int.is_numeric());
        assert!(DataType::Real.is_numeric());
        assert!(!DataType::Bool.is_numeric());
        assert!(DataType::Bool.is_boolean());
        assert!(DataType::Void.is_void());
        assert!(DataType::Struct("point".into()).is_struct());
        assert!(DataType::Array("points".into()).is_array());
    }

    #[test]
    fn test_assignability() {
        assert!(DataType::Int.is_assignable_to(&DataType::Int));
        assert!(!DataType::Int.is_assignable_to(&DataType::Real));
        assert!(!DataType::Bool.is_assignable_to(&DataType::Real));
        assert!(!DataType::Struct("a".into()).is_assignable_to(&DataType::Struct("b".into())));
    }
}
