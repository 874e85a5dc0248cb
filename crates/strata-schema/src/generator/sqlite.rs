//! SQLite generator.
//!
//! Diverges from the shared defaults in: the four storage-class column
//! types, the inline `INTEGER PRIMARY KEY [AUTOINCREMENT]` declaration
//! (which replaces the table-level constraint), `LIMIT -1` for
//! offset-without-limit, and lenient value readback to absorb the
//! engine's dynamic typing.

use super::SqlGenerator;
use strata_core::model::TypeCapabilities;
use strata_core::{FieldModel, SqlType, TableModel, Value};

/// SQL generator for SQLite.
pub struct SqliteGenerator;

impl TypeCapabilities for SqliteGenerator {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }
}

impl SqlGenerator for SqliteGenerator {
    fn field_type(&self, field: &FieldModel) -> String {
        match field.sql_type {
            SqlType::Bool
            | SqlType::SmallInt
            | SqlType::Int
            | SqlType::BigInt => "INTEGER".to_string(),
            SqlType::Float | SqlType::Double => "REAL".to_string(),
            SqlType::Text
            | SqlType::Date
            | SqlType::Time
            | SqlType::DateTime
            | SqlType::Point => "TEXT".to_string(),
            SqlType::Bytes => "BLOB".to_string(),
        }
    }

    /// Primary keys are declared inline; `AUTOINCREMENT` is only valid in
    /// the exact `INTEGER PRIMARY KEY AUTOINCREMENT` spelling.
    fn field_declare(&self, field: &FieldModel) -> String {
        let mut out = format!("{} {}", self.quote_ident(&field.name), self.field_type(field));
        if field.is_primary_key {
            out.push_str(" PRIMARY KEY");
            if field.is_auto_increment {
                out.push_str(" AUTOINCREMENT");
            }
            return out;
        }
        if field.not_null {
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

    /// Inline declaration covers the key; never emit the table-level form.
    fn primary_key_constraint(&self, _table: &TableModel) -> String {
        String::new()
    }

    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Text(s) => super::quote_text(s),
            Value::Bytes(b) => format!("X'{}'", super::hex(b)),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => super::quote_text(s),
            Value::Point(x, y) => super::quote_text(&format!("({x},{y})")),
        }
    }

    fn append_skip_take(&self, sql: &mut String, skip: Option<u64>, take: Option<u64>) {
        match (skip, take) {
            (Some(skip), Some(take)) => sql.push_str(&format!(" LIMIT {take} OFFSET {skip}")),
            (None, Some(take)) => sql.push_str(&format!(" LIMIT {take}")),
            // OFFSET requires a LIMIT clause; -1 means unbounded.
            (Some(skip), None) => sql.push_str(&format!(" LIMIT -1 OFFSET {skip}")),
            (None, None) => {}
        }
    }

    /// SQLite cannot retype a column, and its dynamic typing makes the
    /// operation unnecessary: existing values keep their storage class and
    /// readback coerces per field type. Emitted as a comment so the
    /// synchronization log still records the decision.
    fn alter_column_type(&self, table: &TableModel, field: &FieldModel) -> String {
        format!(
            "-- column {}.{} keeps its storage class; SQLite does not retype columns",
            table.table_name, field.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::metadata::{DatabaseMeta, EntityMeta};
    use strata_core::DatabaseModel;

    fn model() -> DatabaseModel {
        let db = DatabaseMeta::new("lite", 1)
            .table(
                EntityMeta::new("Author")
                    .field("id", "int")
                    .primary_auto_increment("id")
                    .field("name", "text")
                    .not_null("name")
                    .field("active", "bool"),
                "authors",
            )
            .table(
                EntityMeta::new("Post")
                    .field("id", "int")
                    .primary_auto_increment("id")
                    .field("author_id", "int")
                    .foreign_key("author_id", "author", "Author"),
                "posts",
            );
        DatabaseModel::build(&db, &SqliteGenerator).unwrap()
    }

    #[test]
    fn test_inline_primary_key_autoincrement() {
        let m = model();
        let g = SqliteGenerator;
        let sql = g.create_table(&m, &m.tables[0]);
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        // Inline declaration replaces the table-level constraint.
        assert!(!sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_storage_classes() {
        let m = model();
        let g = SqliteGenerator;
        let author = &m.tables[0];
        assert_eq!(g.field_type(author.field("name").unwrap()), "TEXT");
        assert_eq!(g.field_type(author.field("active").unwrap()), "INTEGER");
    }

    #[test]
    fn test_fk_constraint_survives_inline_pk() {
        let m = model();
        let g = SqliteGenerator;
        let sql = g.create_table(&m, &m.tables[1]);
        assert!(sql.contains("FOREIGN KEY (\"author_id\") REFERENCES \"authors\"(\"id\")"));
    }

    #[test]
    fn test_bool_escapes_as_integer() {
        let g = SqliteGenerator;
        assert_eq!(g.escape_value(&Value::Bool(true)), "1");
        assert_eq!(g.escape_value(&Value::Text("a'b".into())), "'a''b'");
    }

    #[test]
    fn test_offset_without_limit() {
        let g = SqliteGenerator;
        let mut sql = String::from("SELECT * FROM \"t\"");
        g.append_skip_take(&mut sql, Some(10), None);
        assert_eq!(sql, "SELECT * FROM \"t\" LIMIT -1 OFFSET 10");
    }

    #[test]
    fn test_weakly_typed_readback() {
        let g = SqliteGenerator;
        // The engine hands integers back for booleans and text for dates.
        assert_eq!(
            g.unescape_value(SqlType::Bool, &Value::Int(1)),
            Value::Bool(true)
        );
        assert_eq!(
            g.unescape_value(SqlType::Bool, &Value::Int(0)),
            Value::Bool(false)
        );
        assert_eq!(
            g.unescape_value(SqlType::Date, &Value::Text("2024-02-29".into())),
            Value::Date("2024-02-29".into())
        );
        assert_eq!(
            g.unescape_value(SqlType::Double, &Value::Int(3)),
            Value::Double(3.0)
        );
        assert_eq!(
            g.unescape_value(SqlType::Point, &Value::Text("(0.5,9)".into())),
            Value::Point(0.5, 9.0)
        );
    }

    #[test]
    fn test_retype_is_a_recorded_noop() {
        let m = model();
        let g = SqliteGenerator;
        let sql = g.alter_column_type(&m.tables[0], m.tables[0].field("name").unwrap());
        assert!(sql.starts_with("--"));
    }
}
