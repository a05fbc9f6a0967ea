//! The PackStream value grammar.

use std::collections::HashMap;
use std::fmt;

use super::Int64;

/// Type alias for PackStream maps (string keys, arbitrary values).
pub type ValueMap = HashMap<String, Value>;

/// A value in the PackStream grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(Int64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    Struct(Structure),
    /// The host-language "undefined" sentinel. Never appears on the wire:
    /// map entries holding it are dropped before the header count is
    /// emitted, list elements holding it are packed as `Null`, and the
    /// unpacker never produces it.
    Undefined,
}

impl Value {
    /// Returns the value as a string reference, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Integer` variant.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(i.as_i64()),
            _ => None,
        }
    }
}

/// A tagged structure: a one-byte signature naming the semantic type within
/// the hosting protocol, plus its fields.
///
/// Used symmetrically on both paths: as pack input, and as the decode result
/// whenever no mapper is registered for the signature. Equality is
/// structural.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub signature: u8,
    pub fields: Vec<Value>,
}

impl Structure {
    pub fn new(signature: u8, fields: Vec<Value>) -> Self {
        Self { signature, fields }
    }
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(Int64::new(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(Int64::from(i))
    }
}

impl From<Int64> for Value {
    fn from(i: Int64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Self::Map(m)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Self::Struct(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Struct(s) => {
                write!(f, "Structure<0x{:02X}>(", s.signature)?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ")")
            }
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_equality_is_structural() {
        let a = Structure::new(0x4E, vec![Value::from(1), Value::from("x")]);
        let b = Structure::new(0x4E, vec![Value::from(1), Value::from("x")]);
        assert_eq!(a, b);
        assert_ne!(a, Structure::new(0x4F, vec![Value::from(1), Value::from("x")]));
        assert_ne!(a, Structure::new(0x4E, vec![Value::from(1)]));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(5).as_str(), None);
        assert_eq!(Value::from(5).as_int(), Some(5));
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn display_struct() {
        let v = Value::from(Structure::new(0x4E, vec![Value::from(1)]));
        assert_eq!(v.to_string(), "Structure<0x4E>(1)");
    }
}
