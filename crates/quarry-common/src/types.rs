//! Column types for Quarry tuples.

use serde::{Deserialize, Serialize};

/// Default maximum byte length of a string column.
pub const STRING_LEN: usize = 128;

/// Size of the length prefix stored in front of every string value.
pub const STRING_PREFIX_LEN: usize = 4;

/// Type of a single column.
///
/// Every type has a fixed serialized width, which is what makes the heap
/// page geometry computable from the schema alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// 32-bit signed integer, stored big-endian.
    Int,
    /// String of at most the given number of bytes, stored as a 4-byte
    /// length prefix followed by the zero-padded payload.
    String(usize),
}

impl Type {
    /// String type with the default maximum length.
    pub const fn string() -> Self {
        Type::String(STRING_LEN)
    }

    /// Returns the number of bytes a value of this type occupies on disk.
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String(max_len) => STRING_PREFIX_LEN + max_len,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::String(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => f.write_str("INT_TYPE"),
            Type::String(_) => f.write_str("STRING_TYPE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_len() {
        assert_eq!(Type::Int.len(), 4);
        assert_eq!(Type::string().len(), 132);
        assert_eq!(Type::String(10).len(), 14);
    }

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Int.to_string(), "INT_TYPE");
        assert_eq!(Type::string().to_string(), "STRING_TYPE");
    }

    #[test]
    fn test_type_equality_includes_width() {
        assert_eq!(Type::string(), Type::String(STRING_LEN));
        assert_ne!(Type::String(8), Type::String(16));
        assert_ne!(Type::Int, Type::string());
        assert!(Type::string().is_string());
        assert!(!Type::Int.is_string());
    }

    #[test]
    fn test_type_serde_roundtrip() {
        for ty in [Type::Int, Type::string(), Type::String(3)] {
            let json = serde_json::to_string(&ty).unwrap();
            let back: Type = serde_json::from_str(&json).unwrap();
            assert_eq!(ty, back);
        }
    }
}
