//! The metadata stream.
//!
//! Schema models are built from a flat stream of `(kind, name, value)`
//! triples rather than from reflection. Applications describe their record
//! types with the [`EntityMeta`] and [`DatabaseMeta`] builders, which emit
//! the triples; anything able to produce the same stream (a code generator,
//! a file loader) can implement [`MetadataProvider`] instead.
//!
//! Payload conventions:
//!
//! - `Field` entries carry the neutral type tag in `value` (`"int"`,
//!   `"text"`, ...).
//! - `ForeignKey` entries carry the target entity in `name` and
//!   `keyField::relationName` in `value`, so one entry binds the local key
//!   column and the named relation in a single triple.
//! - `Table` entries carry the entity name in `name` and the database table
//!   name in `value`.
//! - `DbVersion` carries the integer schema version in `name`.

use serde::{Deserialize, Serialize};

/// Kind discriminator of one metadata triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaKind {
    Table,
    Field,
    PrimaryKey,
    AutoIncrement,
    ForeignKey,
    Unique,
    Length,
    DefaultValue,
    NotNull,
    Enum,
    DbVersion,
    Display,
}

/// One `(kind, name, value)` triple from the metadata stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub kind: MetaKind,
    pub name: String,
    pub value: String,
}

impl MetaEntry {
    /// Build a triple.
    pub fn new(kind: MetaKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Source of metadata for one database definition.
///
/// `database_entries` yields the definition-level stream (`Table` and
/// `DbVersion` entries); `entity_entries` yields the per-record-type stream
/// for each declared entity. The model builder re-extracts each declared
/// entity through this second call, matching the way the declaring type and
/// its record types are described independently.
pub trait MetadataProvider {
    /// Identity of the database definition. Used as the model cache key.
    fn database_name(&self) -> &str;

    /// Definition-level entries: one `Table` per record type plus one
    /// `DbVersion`.
    fn database_entries(&self) -> Vec<MetaEntry>;

    /// Entries for one declared entity, or `None` if the entity is unknown.
    fn entity_entries(&self, entity: &str) -> Option<Vec<MetaEntry>>;
}

/// Declarative description of one record type.
///
/// The builder methods append triples in call order; field declaration
/// order is column order in generated DDL.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    entity: String,
    entries: Vec<MetaEntry>,
}

impl EntityMeta {
    /// Start describing the record type named `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            entries: Vec::new(),
        }
    }

    /// Name of the described record type.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Declare a scalar field with its neutral type tag.
    pub fn field(mut self, name: &str, type_tag: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::Field, name, type_tag));
        self
    }

    /// Mark a declared field as the primary key.
    pub fn primary_key(mut self, name: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::PrimaryKey, name, ""));
        self
    }

    /// Mark a declared field as auto-increment.
    pub fn auto_increment(mut self, name: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::AutoIncrement, name, ""));
        self
    }

    /// Shorthand for a primary-key auto-increment field.
    pub fn primary_auto_increment(self, name: &str) -> Self {
        self.primary_key(name).auto_increment(name)
    }

    /// Mark a declared field as unique.
    pub fn unique(mut self, name: &str) -> Self {
        self.entries.push(MetaEntry::new(MetaKind::Unique, name, ""));
        self
    }

    /// Constrain the maximum length of a text field.
    pub fn length(mut self, name: &str, len: u32) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::Length, name, len.to_string()));
        self
    }

    /// Give a declared field a default-value expression.
    pub fn default_value(mut self, name: &str, value: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::DefaultValue, name, value));
        self
    }

    /// Mark a declared field NOT NULL.
    pub fn not_null(mut self, name: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::NotNull, name, "1"));
        self
    }

    /// Mark a declared field as an enumeration stored by variant name.
    pub fn enumeration(mut self, name: &str) -> Self {
        self.entries.push(MetaEntry::new(MetaKind::Enum, name, "1"));
        self
    }

    /// Attach a human-readable display name to a field.
    pub fn display(mut self, name: &str, display: &str) -> Self {
        self.entries
            .push(MetaEntry::new(MetaKind::Display, name, display));
        self
    }

    /// Declare a foreign key: `key_field` holds the value, `relation` is
    /// the relation's name, `target` is the referenced entity. The key
    /// field itself must be declared separately with [`EntityMeta::field`].
    pub fn foreign_key(mut self, key_field: &str, relation: &str, target: &str) -> Self {
        self.entries.push(MetaEntry::new(
            MetaKind::ForeignKey,
            target,
            format!("{key_field}::{relation}"),
        ));
        self
    }

    /// The accumulated triples.
    #[must_use]
    pub fn entries(&self) -> &[MetaEntry] {
        &self.entries
    }
}

/// Declarative description of one database definition: a named set of
/// entities plus a schema version.
#[derive(Debug, Clone)]
pub struct DatabaseMeta {
    name: String,
    version: u32,
    tables: Vec<(EntityMeta, String)>,
}

impl DatabaseMeta {
    /// Start a definition with its identity name and schema version.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            tables: Vec::new(),
        }
    }

    /// Declare one record type, giving its database table name.
    pub fn table(mut self, entity: EntityMeta, table_name: &str) -> Self {
        self.tables.push((entity, table_name.to_string()));
        self
    }
}

impl MetadataProvider for DatabaseMeta {
    fn database_name(&self) -> &str {
        &self.name
    }

    fn database_entries(&self) -> Vec<MetaEntry> {
        let mut out: Vec<MetaEntry> = self
            .tables
            .iter()
            .map(|(entity, table)| MetaEntry::new(MetaKind::Table, entity.entity(), table.clone()))
            .collect();
        out.push(MetaEntry::new(
            MetaKind::DbVersion,
            self.version.to_string(),
            "",
        ));
        out
    }

    fn entity_entries(&self, entity: &str) -> Option<Vec<MetaEntry>> {
        self.tables
            .iter()
            .find(|(e, _)| e.entity() == entity)
            .map(|(e, _)| e.entries().to_vec())
    }
}

/// Split a `ForeignKey` payload into `(key_field, relation_name)`.
#[must_use]
pub fn split_foreign_key_payload(value: &str) -> Option<(&str, &str)> {
    value.split_once("::")
}
