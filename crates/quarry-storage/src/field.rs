//! Typed column values and comparison operators.

use bytes::{Buf, BufMut};
use quarry_common::types::STRING_PREFIX_LEN;
use quarry_common::{QuarryError, Result, Type};
use std::fmt;
use std::io::ErrorKind;

/// Comparison applied by predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    /// Substring test for strings, equality for integers.
    Like,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Equals,
        CompareOp::GreaterThan,
        CompareOp::LessThan,
        CompareOp::LessThanOrEq,
        CompareOp::GreaterThanOrEq,
        CompareOp::Like,
    ];

    /// Looks an operator up by its position in [`CompareOp::ALL`].
    pub fn from_index(index: usize) -> Option<CompareOp> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Equals => "=",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEq => "<=",
            CompareOp::GreaterThanOrEq => ">=",
            CompareOp::Like => "LIKE",
        };
        f.write_str(symbol)
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Int(i32),
    String(String),
}

impl Field {
    /// Name of the value's type, as printed by [`Type`].
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Int(_) => "INT_TYPE",
            Field::String(_) => "STRING_TYPE",
        }
    }

    /// Returns true if this value can be stored in a column of type `ty`.
    pub fn matches(&self, ty: Type) -> bool {
        matches!(
            (self, ty),
            (Field::Int(_), Type::Int) | (Field::String(_), Type::String(_))
        )
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Field::Int(v) => Some(*v),
            Field::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s),
            Field::Int(_) => None,
        }
    }

    /// Evaluates `self op other`.
    ///
    /// Both values must have the same type.
    pub fn compare(&self, op: CompareOp, other: &Field) -> Result<bool> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Ok(match op {
                CompareOp::Equals | CompareOp::Like => a == b,
                CompareOp::GreaterThan => a > b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
                CompareOp::GreaterThanOrEq => a >= b,
            }),
            (Field::String(a), Field::String(b)) => Ok(match op {
                CompareOp::Equals => a == b,
                CompareOp::GreaterThan => a > b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
                CompareOp::GreaterThanOrEq => a >= b,
                CompareOp::Like => a.contains(b.as_str()),
            }),
            _ => Err(QuarryError::TypeMismatch {
                expected: self.type_name().to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Reads one value of type `ty` from `buf`, consuming exactly `ty.len()` bytes.
    pub fn parse(ty: Type, buf: &mut impl Buf) -> Result<Field> {
        if buf.remaining() < ty.len() {
            return Err(QuarryError::Io(ErrorKind::UnexpectedEof.into()));
        }
        match ty {
            Type::Int => Ok(Field::Int(buf.get_i32())),
            Type::String(max_len) => {
                let len = (buf.get_i32().max(0) as usize).min(max_len);
                let mut raw = vec![0u8; len];
                buf.copy_to_slice(&mut raw);
                buf.advance(max_len - len);
                Ok(Field::String(String::from_utf8_lossy(&raw).into_owned()))
            }
        }
    }

    /// Writes the value as a column of type `ty`, using exactly `ty.len()` bytes.
    ///
    /// Strings longer than the column width are cut at the last character
    /// boundary that fits.
    pub fn serialize_into(&self, ty: Type, buf: &mut impl BufMut) -> Result<()> {
        match (self, ty) {
            (Field::Int(v), Type::Int) => buf.put_i32(*v),
            (Field::String(s), Type::String(max_len)) => {
                let mut len = s.len().min(max_len);
                while !s.is_char_boundary(len) {
                    len -= 1;
                }
                buf.put_i32(len as i32);
                buf.put_slice(&s.as_bytes()[..len]);
                buf.put_bytes(0, ty.len() - STRING_PREFIX_LEN - len);
            }
            _ => {
                return Err(QuarryError::TypeMismatch {
                    expected: ty.to_string(),
                    actual: self.type_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{v}"),
            Field::String(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Field::Int(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::String(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_compare_all_ops() {
        let three = Field::Int(3);
        let five = Field::Int(5);
        assert!(three.compare(CompareOp::LessThan, &five).unwrap());
        assert!(three.compare(CompareOp::LessThanOrEq, &five).unwrap());
        assert!(!three.compare(CompareOp::GreaterThan, &five).unwrap());
        assert!(!three.compare(CompareOp::GreaterThanOrEq, &five).unwrap());
        assert!(!three.compare(CompareOp::Equals, &five).unwrap());
        assert!(five.compare(CompareOp::GreaterThanOrEq, &five).unwrap());
        assert!(five.compare(CompareOp::Like, &Field::Int(5)).unwrap());
        assert!(!five.compare(CompareOp::Like, &three).unwrap());
    }

    #[test]
    fn test_string_compare_and_like() {
        let apple = Field::from("apple");
        let pie = Field::from("apple pie");
        assert!(apple.compare(CompareOp::LessThan, &pie).unwrap());
        assert!(pie.compare(CompareOp::Like, &Field::from("le p")).unwrap());
        assert!(!apple.compare(CompareOp::Like, &pie).unwrap());
        assert!(apple.compare(CompareOp::Equals, &Field::from("apple")).unwrap());
    }

    #[test]
    fn test_compare_type_mismatch() {
        let err = Field::Int(1)
            .compare(CompareOp::Equals, &Field::from("1"))
            .unwrap_err();
        assert!(matches!(err, QuarryError::TypeMismatch { .. }));
        assert_eq!(err.to_string(), "Type mismatch: expected INT_TYPE, got STRING_TYPE");
    }

    #[test]
    fn test_int_wire_format_is_big_endian() {
        let mut buf = Vec::new();
        Field::Int(0x0102_0304).serialize_into(Type::Int, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4]);

        let parsed = Field::parse(Type::Int, &mut &buf[..]).unwrap();
        assert_eq!(parsed, Field::Int(0x0102_0304));
    }

    #[test]
    fn test_string_wire_format_is_padded() {
        let ty = Type::String(8);
        let mut buf = Vec::new();
        Field::from("hey").serialize_into(ty, &mut buf).unwrap();
        assert_eq!(buf.len(), ty.len());
        assert_eq!(&buf[..4], &[0, 0, 0, 3]);
        assert_eq!(&buf[4..7], b"hey");
        assert!(buf[7..].iter().all(|b| *b == 0));

        let mut cursor = &buf[..];
        assert_eq!(Field::parse(ty, &mut cursor).unwrap(), Field::from("hey"));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_string_truncated_to_column_width() {
        let ty = Type::String(4);
        let mut buf = Vec::new();
        Field::from("héllo").serialize_into(ty, &mut buf).unwrap();
        assert_eq!(buf.len(), ty.len());
        assert_eq!(Field::parse(ty, &mut &buf[..]).unwrap(), Field::from("hél"));

        // The 2-byte 'é' would straddle the limit, so only "h" survives.
        let ty = Type::String(2);
        let mut buf = Vec::new();
        Field::from("héllo").serialize_into(ty, &mut buf).unwrap();
        assert_eq!(Field::parse(ty, &mut &buf[..]).unwrap(), Field::from("h"));
    }

    #[test]
    fn test_parse_short_buffer() {
        let err = Field::parse(Type::Int, &mut &[0u8, 1][..]).unwrap_err();
        assert!(matches!(err, QuarryError::Io(_)));
    }

    #[test]
    fn test_serialize_type_mismatch() {
        let mut buf = Vec::new();
        let err = Field::Int(1).serialize_into(Type::string(), &mut buf).unwrap_err();
        assert!(matches!(err, QuarryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_compare_op_display_and_index() {
        let symbols: Vec<String> = CompareOp::ALL.iter().map(|op| op.to_string()).collect();
        assert_eq!(symbols, vec!["=", ">", "<", "<=", ">=", "LIKE"]);
        assert_eq!(CompareOp::from_index(5), Some(CompareOp::Like));
        assert_eq!(CompareOp::from_index(6), None);
    }
}
