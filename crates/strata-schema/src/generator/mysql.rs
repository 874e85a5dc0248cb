//! MySQL / MariaDB generator.
//!
//! Diverges from the shared defaults in: backtick identifiers, backslash
//! escaping inside string literals, `AUTO_INCREMENT` on the column
//! declaration, `TINYINT(1)` booleans, spatial text constructors, and the
//! offset-without-limit pagination idiom.

use super::SqlGenerator;
use strata_core::model::TypeCapabilities;
use strata_core::{FieldModel, SqlType, Value};

/// SQL generator for MySQL and MariaDB.
pub struct MySqlGenerator;

impl TypeCapabilities for MySqlGenerator {
    fn dialect_name(&self) -> &'static str {
        "mysql"
    }
}

impl SqlGenerator for MySqlGenerator {
    fn field_type(&self, field: &FieldModel) -> String {
        match field.sql_type {
            SqlType::Bool => "TINYINT(1)".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Int => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Text => match field.max_length {
                Some(len) => format!("VARCHAR({len})"),
                // Keyed text needs a bounded type; TEXT columns cannot be
                // indexed without a prefix length.
                None if field.is_primary_key || field.is_unique => "VARCHAR(255)".to_string(),
                None => "TEXT".to_string(),
            },
            SqlType::Bytes => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME".to_string(),
            SqlType::Point => "POINT".to_string(),
        }
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn field_declare(&self, field: &FieldModel) -> String {
        let mut out = format!("{} {}", self.quote_ident(&field.name), self.field_type(field));
        if field.not_null || field.is_primary_key {
            out.push_str(" NOT NULL");
        }
        if field.is_auto_increment {
            out.push_str(" AUTO_INCREMENT");
        }
        if field.is_unique {
            out.push_str(" UNIQUE");
        }
        if let Some(default) = &field.default_value {
            out.push_str(" DEFAULT ");
            out.push_str(&self.escape_value(&Value::Text(default.clone())));
        }
        out
    }

    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            // Backslash is an escape character in MySQL string literals, so
            // it must be doubled alongside the quote.
            Value::Text(s) => quote_mysql_text(s),
            Value::Bytes(b) => format!("X'{}'", super::hex(b)),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => quote_mysql_text(s),
            Value::Point(x, y) => format!("ST_GeomFromText('POINT({x} {y})')"),
        }
    }

    fn unescape_value(&self, sql_type: SqlType, raw: &Value) -> Value {
        if sql_type == SqlType::Point {
            if let Value::Text(s) = raw {
                if let Some(p) = parse_wkt_point(s) {
                    return Value::Point(p.0, p.1);
                }
            }
        }
        super::unescape_default(sql_type, raw)
    }

    fn append_skip_take(&self, sql: &mut String, skip: Option<u64>, take: Option<u64>) {
        match (skip, take) {
            (Some(skip), Some(take)) => sql.push_str(&format!(" LIMIT {take} OFFSET {skip}")),
            (None, Some(take)) => sql.push_str(&format!(" LIMIT {take}")),
            // MySQL has no offset-without-limit form; the manual's idiom is
            // an effectively unbounded limit.
            (Some(skip), None) => {
                sql.push_str(&format!(" LIMIT 18446744073709551615 OFFSET {skip}"));
            }
            (None, None) => {}
        }
    }

    fn alter_column_type(&self, table: &strata_core::TableModel, field: &FieldModel) -> String {
        format!(
            "ALTER TABLE {} MODIFY COLUMN {} {}",
            self.quote_ident(&table.table_name),
            self.quote_ident(&field.name),
            self.field_type(field)
        )
    }
}

fn quote_mysql_text(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Parse `POINT(x y)` well-known text.
fn parse_wkt_point(s: &str) -> Option<(f64, f64)> {
    let inner = s
        .trim()
        .strip_prefix("POINT(")
        .and_then(|r| r.strip_suffix(')'))?;
    let (x, y) = inner.trim().split_once(' ')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
