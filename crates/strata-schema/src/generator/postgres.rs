//! PostgreSQL generator.
//!
//! Diverges from the shared defaults in: SERIAL auto-increment types,
//! bytea literals, native geometric types and operators, and `ILIKE`.

use super::{SqlGenerator, quote_text};
use strata_core::model::TypeCapabilities;
use strata_core::{FieldModel, SqlType, Value};
use strata_query::{CompareOp, Phrase};

/// SQL generator for PostgreSQL.
pub struct PostgresGenerator;

impl TypeCapabilities for PostgresGenerator {
    fn dialect_name(&self) -> &'static str {
        "postgres"
    }
}

impl SqlGenerator for PostgresGenerator {
    fn field_type(&self, field: &FieldModel) -> String {
        match field.sql_type {
            SqlType::Bool => "BOOLEAN".to_string(),
            SqlType::SmallInt => if field.is_auto_increment {
                "SMALLSERIAL"
            } else {
                "SMALLINT"
            }
            .to_string(),
            SqlType::Int => if field.is_auto_increment {
                "SERIAL"
            } else {
                "INTEGER"
            }
            .to_string(),
            SqlType::BigInt => if field.is_auto_increment {
                "BIGSERIAL"
            } else {
                "BIGINT"
            }
            .to_string(),
            SqlType::Float => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Text => match field.max_length {
                Some(len) => format!("VARCHAR({len})"),
                None => "TEXT".to_string(),
            },
            SqlType::Bytes => "BYTEA".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "TIMESTAMP".to_string(),
            SqlType::Point => "POINT".to_string(),
        }
    }

    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Bytes(b) => format!("'\\x{}'", super::hex(b)),
            Value::Point(x, y) => format!("point({x}, {y})"),
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Text(s) => quote_text(s),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => quote_text(s),
        }
    }

    fn render_condition(&self, phrase: &Phrase) -> String {
        match phrase {
            Phrase::Compare {
                field,
                op: CompareOp::ILike,
                value,
            } => format!(
                "{} ILIKE {}",
                self.render_field(field),
                self.escape_value(value)
            ),
            Phrase::WithinCircle {
                field,
                center: (x, y),
                radius,
            } => format!(
                "{} <@ circle '(({x},{y}),{radius})'",
                self.render_field(field)
            ),
            other => self.default_condition(other),
        }
    }
}
