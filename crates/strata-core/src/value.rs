//! Neutral value and type model.
//!
//! Every application field maps to exactly one [`SqlType`] tag, and every
//! runtime value crossing the generator boundary is a [`Value`]. Dialect
//! generators own the translation between these neutral forms and the
//! engine-specific literal/column syntax, so nothing above the generator
//! layer ever sees dialect text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-neutral type tag for a column.
///
/// The set is deliberately closed: a field whose host type does not map to
/// one of these tags is a schema-definition error, caught when the model is
/// built, never at statement-execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Boolean flag. Stored as an integer on engines without a bool type.
    Bool,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Variable-length text, optionally length-constrained per field.
    Text,
    /// Raw byte string.
    Bytes,
    /// Calendar date (ISO-8601 `YYYY-MM-DD`).
    Date,
    /// Wall-clock time (ISO-8601 `HH:MM:SS`).
    Time,
    /// Date and time (ISO-8601, no zone at this layer).
    DateTime,
    /// 2D point. Only PostgreSQL renders this natively; other dialects
    /// store the textual form.
    Point,
}

impl SqlType {
    /// Parse a type tag from its metadata-stream spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(SqlType::Bool),
            "smallint" | "i16" => Some(SqlType::SmallInt),
            "int" | "integer" | "i32" => Some(SqlType::Int),
            "bigint" | "i64" => Some(SqlType::BigInt),
            "float" | "f32" => Some(SqlType::Float),
            "double" | "f64" => Some(SqlType::Double),
            "text" | "string" => Some(SqlType::Text),
            "bytes" | "blob" => Some(SqlType::Bytes),
            "date" => Some(SqlType::Date),
            "time" => Some(SqlType::Time),
            "datetime" | "timestamp" => Some(SqlType::DateTime),
            "point" => Some(SqlType::Point),
            _ => None,
        }
    }

    /// Canonical metadata-stream spelling of this tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SqlType::Bool => "bool",
            SqlType::SmallInt => "smallint",
            SqlType::Int => "int",
            SqlType::BigInt => "bigint",
            SqlType::Float => "float",
            SqlType::Double => "double",
            SqlType::Text => "text",
            SqlType::Bytes => "bytes",
            SqlType::Date => "date",
            SqlType::Time => "time",
            SqlType::DateTime => "datetime",
            SqlType::Point => "point",
        }
    }

    /// Whether this tag is one of the signed integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, SqlType::SmallInt | SqlType::Int | SqlType::BigInt)
    }

    /// Whether this tag is numeric (integer or floating point).
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, SqlType::Float | SqlType::Double)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value in neutral form.
///
/// Date/time variants carry ISO-8601 text; the generators quote or convert
/// as the engine requires. `Point` is `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(String),
    Time(String),
    DateTime(String),
    Point(f64, f64),
}

impl Value {
    /// True if this is `Value::Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract an integer, coercing from `Bool` (SQLite stores flags as
    /// 0/1) and numeric text.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Extract text without coercion.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => f.write_str(s),
            Value::Point(x, y) => write!(f, "({x},{y})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_parse_roundtrip() {
        for t in [
            SqlType::Bool,
            SqlType::SmallInt,
            SqlType::Int,
            SqlType::BigInt,
            SqlType::Float,
            SqlType::Double,
            SqlType::Text,
            SqlType::Bytes,
            SqlType::Date,
            SqlType::Time,
            SqlType::DateTime,
            SqlType::Point,
        ] {
            assert_eq!(SqlType::parse(t.name()), Some(t));
        }
        assert_eq!(SqlType::parse("nonsense"), None);
    }

    #[test]
    fn test_sql_type_aliases() {
        assert_eq!(SqlType::parse("i32"), Some(SqlType::Int));
        assert_eq!(SqlType::parse("String"), Some(SqlType::Text));
        assert_eq!(SqlType::parse("TIMESTAMP"), Some(SqlType::DateTime));
    }

    #[test]
    fn test_value_int_coercion() {
        assert_eq!(Value::Bool(true).as_int(), Some(1));
        assert_eq!(Value::Text("42".into()).as_int(), Some(42));
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn test_value_from_impls() {
        assert_eq!(Value::from(7i32), Value::Int(7));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert!(Value::Null.is_null());
    }
}
