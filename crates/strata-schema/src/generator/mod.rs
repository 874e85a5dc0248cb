//! The SQL generator trait and its shared default behavior.
//!
//! One [`SqlGenerator`] exists per dialect. The trait carries default
//! method bodies for everything the four engines agree on; each dialect
//! overrides only the points where its syntax diverges, mirroring the
//! override sets listed in each dialect module. Generators are stateless
//! and chosen once per connection from the driver identifier (see
//! [`crate::driver`]).
//!
//! Value escaping renders typed [`Value`]s into dialect-safe literals by
//! construction; raw input never reaches statement text unescaped.

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

pub use mysql::MySqlGenerator;
pub use postgres::PostgresGenerator;
pub use sqlite::SqliteGenerator;
pub use sqlserver::SqlServerGenerator;

use strata_core::model::TypeCapabilities;
use strata_core::{DatabaseModel, FieldModel, SqlType, TableModel, Value};
use strata_query::{CompareOp, FieldRef, Phrase};

/// Dialect-polymorphic SQL text generation.
///
/// Capability predicates come from [`TypeCapabilities`] so the model
/// builder can consult them without seeing this trait.
pub trait SqlGenerator: TypeCapabilities {
    /// Column type syntax for a field, honoring length hints and
    /// auto-increment where the dialect expresses it in the type.
    fn field_type(&self, field: &FieldModel) -> String;

    /// Quote an identifier. ANSI double quotes by default.
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Full column definition: name, type, nullability, uniqueness,
    /// default. Dialects that declare keys inline (SQLite) override this.
    fn field_declare(&self, field: &FieldModel) -> String {
        let mut out = format!("{} {}", self.quote_ident(&field.name), self.field_type(field));
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

    /// Render a typed value as a dialect-safe literal.
    fn escape_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Text(s) => quote_text(s),
            Value::Bytes(b) => format!("X'{}'", hex(b)),
            Value::Date(s) | Value::Time(s) | Value::DateTime(s) => quote_text(s),
            Value::Point(x, y) => quote_text(&format!("({x},{y})")),
        }
    }

    /// Map a driver-returned value back to the neutral type, absorbing
    /// engine quirks (integers standing in for booleans, text dates).
    fn unescape_value(&self, sql_type: SqlType, raw: &Value) -> Value {
        unescape_default(sql_type, raw)
    }

    /// Append pagination syntax. Default is independent LIMIT / OFFSET
    /// clauses (PostgreSQL shape).
    fn append_skip_take(&self, sql: &mut String, skip: Option<u64>, take: Option<u64>) {
        if let Some(take) = take {
            sql.push_str(&format!(" LIMIT {take}"));
        }
        if let Some(skip) = skip {
            sql.push_str(&format!(" OFFSET {skip}"));
        }
    }

    /// Render a condition tree as WHERE-clause text.
    ///
    /// Dialects overriding this for specific node shapes delegate the rest
    /// to [`SqlGenerator::default_condition`]; recursion re-enters the
    /// override for nested nodes.
    fn render_condition(&self, phrase: &Phrase) -> String {
        self.default_condition(phrase)
    }

    /// Shared rendering for every node shape. Not meant to be overridden.
    fn default_condition(&self, phrase: &Phrase) -> String {
        match phrase {
            Phrase::Compare { field, op, value } => match op {
                CompareOp::ILike => format!(
                    "LOWER({}) LIKE LOWER({})",
                    self.render_field(field),
                    self.escape_value(value)
                ),
                _ => format!(
                    "{} {} {}",
                    self.render_field(field),
                    compare_token(*op),
                    self.escape_value(value)
                ),
            },
            Phrase::CompareField { left, op, right } => match op {
                CompareOp::ILike => format!(
                    "LOWER({}) LIKE LOWER({})",
                    self.render_field(left),
                    self.render_field(right)
                ),
                _ => format!(
                    "{} {} {}",
                    self.render_field(left),
                    compare_token(*op),
                    self.render_field(right)
                ),
            },
            Phrase::In { field, values } => {
                let list: Vec<String> = values.iter().map(|v| self.escape_value(v)).collect();
                format!("{} IN ({})", self.render_field(field), list.join(", "))
            }
            Phrase::Between { field, low, high } => format!(
                "{} BETWEEN {} AND {}",
                self.render_field(field),
                self.escape_value(low),
                self.escape_value(high)
            ),
            Phrase::Null { field, negated } => format!(
                "{} IS {}NULL",
                self.render_field(field),
                if *negated { "NOT " } else { "" }
            ),
            Phrase::WithinCircle { field, .. } => {
                tracing::warn!(
                    dialect = self.dialect_name(),
                    field = %field.name,
                    "Point containment is not supported by this dialect; condition renders false"
                );
                "1 = 0".to_string()
            }
            Phrase::And(a, b) => format!(
                "({} AND {})",
                self.render_condition(a),
                self.render_condition(b)
            ),
            Phrase::Or(a, b) => format!(
                "({} OR {})",
                self.render_condition(a),
                self.render_condition(b)
            ),
            Phrase::Not(inner) => format!("NOT ({})", self.render_condition(inner)),
        }
    }

    /// Qualified, quoted column reference.
    fn render_field(&self, field: &FieldRef) -> String {
        format!(
            "{}.{}",
            self.quote_ident(&field.table),
            self.quote_ident(&field.name)
        )
    }

    /// Table-level primary key clause, or empty when the dialect declares
    /// the key inline on the column.
    fn primary_key_constraint(&self, table: &TableModel) -> String {
        match table.primary_field() {
            Some(f) => format!("PRIMARY KEY ({})", self.quote_ident(&f.name)),
            None => String::new(),
        }
    }

    /// Administrative database to connect to for creating the target
    /// database. Identity for every engine except SQL Server.
    fn master_database_name(&self, database: &str) -> String {
        database.to_string()
    }

    /// CREATE TABLE statement including primary-key and foreign-key
    /// constraints resolved through the model.
    fn create_table(&self, model: &DatabaseModel, table: &TableModel) -> String {
        let mut parts: Vec<String> = table.fields.iter().map(|f| self.field_declare(f)).collect();

        let pk = self.primary_key_constraint(table);
        if !pk.is_empty() {
            parts.push(pk);
        }

        for rel in &table.relations {
            if let Some(target) = model.relation_target(rel) {
                if let Some(target_pk) = target.primary_field() {
                    parts.push(format!(
                        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
                        self.quote_ident(&format!(
                            "fk_{}_{}",
                            table.table_name, rel.local_field
                        )),
                        self.quote_ident(&rel.local_field),
                        self.quote_ident(&target.table_name),
                        self.quote_ident(&target_pk.name)
                    ));
                }
            }
        }

        format!(
            "CREATE TABLE {} ({})",
            self.quote_ident(&table.table_name),
            parts.join(", ")
        )
    }

    /// ALTER TABLE ... ADD a new column.
    fn add_column(&self, table: &TableModel, field: &FieldModel) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_ident(&table.table_name),
            self.field_declare(field)
        )
    }

    /// ALTER TABLE ... retype an existing column. ANSI/PostgreSQL shape by
    /// default.
    fn alter_column_type(&self, table: &TableModel, field: &FieldModel) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote_ident(&table.table_name),
            self.quote_ident(&field.name),
            self.field_type(field)
        )
    }

    /// INSERT from (column, value) pairs. The caller decides which columns
    /// participate (changed fields, minus generated keys).
    fn insert_command(&self, table: &TableModel, values: &[(String, Value)]) -> String {
        let columns: Vec<String> = values.iter().map(|(c, _)| self.quote_ident(c)).collect();
        let literals: Vec<String> = values.iter().map(|(_, v)| self.escape_value(v)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(&table.table_name),
            columns.join(", "),
            literals.join(", ")
        )
    }

    /// UPDATE of the given (column, value) pairs keyed by primary key.
    fn update_command(
        &self,
        table: &TableModel,
        sets: &[(String, Value)],
        pk_field: &FieldModel,
        pk_value: &Value,
    ) -> String {
        let assignments: Vec<String> = sets
            .iter()
            .map(|(c, v)| format!("{} = {}", self.quote_ident(c), self.escape_value(v)))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.quote_ident(&table.table_name),
            assignments.join(", "),
            self.quote_ident(&pk_field.name),
            self.escape_value(pk_value)
        )
    }

    /// DELETE keyed by primary key.
    fn delete_command(
        &self,
        table: &TableModel,
        pk_field: &FieldModel,
        pk_value: &Value,
    ) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_ident(&table.table_name),
            self.quote_ident(&pk_field.name),
            self.escape_value(pk_value)
        )
    }

    /// SELECT * with optional condition and pagination.
    fn select_command(
        &self,
        table: &TableModel,
        condition: Option<&Phrase>,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> String {
        let mut sql = format!("SELECT * FROM {}", self.quote_ident(&table.table_name));
        if let Some(p) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_condition(p));
        }
        self.append_skip_take(&mut sql, skip, take);
        sql
    }
}

/// ANSI comparison tokens shared by every dialect. `ILike` never reaches
/// here; it is handled structurally.
fn compare_token(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Like | CompareOp::ILike => "LIKE",
    }
}

/// Single-quote a string, doubling embedded quotes.
pub(crate) fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Shared coercion from driver-returned values to neutral form.
pub(crate) fn unescape_default(sql_type: SqlType, raw: &Value) -> Value {
    if raw.is_null() {
        return Value::Null;
    }
    match sql_type {
        SqlType::Bool => match raw {
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Bool(*i != 0),
            Value::Text(s) => Value::Bool(matches!(
                s.to_ascii_lowercase().as_str(),
                "t" | "true" | "1"
            )),
            other => other.clone(),
        },
        SqlType::SmallInt | SqlType::Int | SqlType::BigInt => {
            raw.as_int().map_or_else(|| raw.clone(), Value::Int)
        }
        SqlType::Float | SqlType::Double => match raw {
            Value::Double(d) => Value::Double(*d),
            Value::Int(i) => Value::Double(*i as f64),
            Value::Text(s) => s.parse().map_or_else(|_| raw.clone(), Value::Double),
            other => other.clone(),
        },
        SqlType::Text => match raw {
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        },
        SqlType::Bytes => match raw {
            Value::Bytes(b) => Value::Bytes(b.clone()),
            Value::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
            other => other.clone(),
        },
        SqlType::Date => coerce_temporal(raw, Value::Date),
        SqlType::Time => coerce_temporal(raw, Value::Time),
        SqlType::DateTime => coerce_temporal(raw, Value::DateTime),
        SqlType::Point => match raw {
            Value::Point(x, y) => Value::Point(*x, *y),
            Value::Text(s) => parse_point(s).map_or_else(|| raw.clone(), |(x, y)| Value::Point(x, y)),
            other => other.clone(),
        },
    }
}

fn coerce_temporal(raw: &Value, wrap: fn(String) -> Value) -> Value {
    match raw {
        Value::Text(s) => wrap(s.clone()),
        Value::Date(s) | Value::Time(s) | Value::DateTime(s) => wrap(s.clone()),
        other => other.clone(),
    }
}

/// Parse `(x,y)` point text.
pub(crate) fn parse_point(s: &str) -> Option<(f64, f64)> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (x, y) = inner.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    //! Shared default bodies, rendered through the SQLite generator (it
    //! overrides none of the condition or DML defaults).

    use super::*;
    use strata_core::metadata::{DatabaseMeta, EntityMeta};

    #[test]
    fn test_condition_shapes() {
        let g = SqliteGenerator;
        let id = FieldRef::new("t", "id");
        let name = FieldRef::new("t", "name");
        let other = FieldRef::new("u", "id");

        assert_eq!(g.render_condition(&id.eq(5)), "\"t\".\"id\" = 5");
        assert_eq!(g.render_condition(&id.ne(5)), "\"t\".\"id\" <> 5");
        assert_eq!(
            g.render_condition(&id.in_values([1, 2, 3])),
            "\"t\".\"id\" IN (1, 2, 3)"
        );
        assert_eq!(
            g.render_condition(&id.between(1, 9)),
            "\"t\".\"id\" BETWEEN 1 AND 9"
        );
        assert_eq!(g.render_condition(&name.is_null()), "\"t\".\"name\" IS NULL");
        assert_eq!(
            g.render_condition(&name.is_not_null()),
            "\"t\".\"name\" IS NOT NULL"
        );
        assert_eq!(
            g.render_condition(&id.eq_field(&other)),
            "\"t\".\"id\" = \"u\".\"id\""
        );
        assert_eq!(
            g.render_condition(&!id.eq(1)),
            "NOT (\"t\".\"id\" = 1)"
        );
        assert_eq!(
            g.render_condition(&(id.eq(1) | (id.gt(10) & name.like("A%")))),
            "(\"t\".\"id\" = 1 OR (\"t\".\"id\" > 10 AND \"t\".\"name\" LIKE 'A%'))"
        );
    }

    #[test]
    fn test_dml_from_pairs() {
        let db = DatabaseMeta::new("dml", 1).table(
            EntityMeta::new("Author")
                .field("id", "int")
                .primary_auto_increment("id")
                .field("name", "text"),
            "authors",
        );
        let model = strata_core::DatabaseModel::build(&db, &SqliteGenerator).unwrap();
        let table = &model.tables[0];
        let g = SqliteGenerator;

        assert_eq!(
            g.insert_command(table, &[("name".to_string(), Value::from("Ada"))]),
            "INSERT INTO \"authors\" (\"name\") VALUES ('Ada')"
        );
        let pk = table.primary_field().unwrap();
        assert_eq!(
            g.update_command(
                table,
                &[("name".to_string(), Value::from("Grace"))],
                pk,
                &Value::Int(4)
            ),
            "UPDATE \"authors\" SET \"name\" = 'Grace' WHERE \"id\" = 4"
        );
        assert_eq!(
            g.delete_command(table, pk, &Value::Int(4)),
            "DELETE FROM \"authors\" WHERE \"id\" = 4"
        );
        let cond = FieldRef::new("authors", "name").like("A%");
        assert_eq!(
            g.select_command(table, Some(&cond), None, Some(5)),
            "SELECT * FROM \"authors\" WHERE \"authors\".\"name\" LIKE 'A%' LIMIT 5"
        );
    }

    #[test]
    fn test_field_declare_default_value() {
        let db = DatabaseMeta::new("decl", 1).table(
            EntityMeta::new("T")
                .field("status", "text")
                .not_null("status")
                .default_value("status", "draft"),
            "t",
        );
        let model = strata_core::DatabaseModel::build(&db, &SqliteGenerator).unwrap();
        let g = SqliteGenerator;
        assert_eq!(
            g.field_declare(&model.tables[0].fields[0]),
            "\"status\" TEXT NOT NULL DEFAULT 'draft'"
        );
    }
}
