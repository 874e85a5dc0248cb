//! SQL Server generator.
//!
//! Diverges from the shared defaults in: bracket identifiers,
//! `IDENTITY(1,1)` auto-increment, `BIT` booleans, `N''` unicode string
//! literals, `0x` binary literals, `OFFSET/FETCH` pagination, and the
//! `master` administrative database.

use super::SqlGenerator;
use strata_core::model::TypeCapabilities;
use strata_core::{FieldModel, SqlType, TableModel, Value};

/// SQL generator for Microsoft SQL Server.
pub struct SqlServerGenerator;

impl TypeCapabilities for SqlServerGenerator {
    fn dialect_name(&self) -> &'static str {
        "sqlserver"
    }
}

impl SqlGenerator for SqlServerGenerator {
    fn field_type(&self, field: &FieldModel) -> String {
        match field.sql_type {
            SqlType::Bool => "BIT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Int => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Float => "REAL".to_string(),
            SqlType::Double => "FLOAT".to_string(),
            SqlType::Text => match field.max_length {
                Some(len) => format!("NVARCHAR({len})"),
                None if field.is_primary_key || field.is_unique => "NVARCHAR(450)".to_string(),
                None => "NVARCHAR(MAX)".to_string(),
            },
            SqlType::Bytes => "VARBINARY(MAX)".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME2".to_string(),
            SqlType::Point => "NVARCHAR(64)".to_string(),
        }
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn field_declare(&self, field: &FieldModel) -> String {
        let mut out = format!("{} {}", self.quote_ident(&field.name), self.field_type(field));
        if field.is_auto_increment {
            out.push_str(" IDENTITY(1,1)");
        }
        if field.not_null || field.is_primary_key {
            out.push_str(" NOT NULL");
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
            Value::Text(s) => format!("N{}", super::quote_text(s)),
            Value::Bytes(b) => format!("0x{}", super::hex(b)),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => super::quote_text(s),
            Value::Point(x, y) => super::quote_text(&format!("({x},{y})")),
        }
    }

    /// FETCH cannot appear without OFFSET, so a bare take gets `OFFSET 0`.
    /// Callers must have an ORDER BY in place already; `select_command`
    /// below takes care of that.
    fn append_skip_take(&self, sql: &mut String, skip: Option<u64>, take: Option<u64>) {
        if skip.is_none() && take.is_none() {
            return;
        }
        sql.push_str(&format!(" OFFSET {} ROWS", skip.unwrap_or(0)));
        if let Some(take) = take {
            sql.push_str(&format!(" FETCH NEXT {take} ROWS ONLY"));
        }
    }

    /// T-SQL rejects OFFSET/FETCH without an ORDER BY, so a paginated
    /// SELECT orders by the primary key (first column when there is none).
    fn select_command(
        &self,
        table: &TableModel,
        condition: Option<&strata_query::Phrase>,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> String {
        let mut sql = format!("SELECT * FROM {}", self.quote_ident(&table.table_name));
        if let Some(p) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_condition(p));
        }
        if skip.is_some() || take.is_some() {
            if let Some(order) = table.primary_field().or_else(|| table.fields.first()) {
                sql.push_str(&format!(" ORDER BY {}", self.quote_ident(&order.name)));
            }
        }
        self.append_skip_take(&mut sql, skip, take);
        sql
    }

    fn alter_column_type(&self, table: &TableModel, field: &FieldModel) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            self.quote_ident(&table.table_name),
            self.quote_ident(&field.name),
            self.field_type(field)
        )
    }

    /// Database creation runs against `master`, never against the target.
    fn master_database_name(&self, _database: &str) -> String {
        "master".to_string()
    }
}
