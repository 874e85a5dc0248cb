//! The schema model: tables, fields, and relations derived from the
//! metadata stream.
//!
//! A [`DatabaseModel`] is built exactly once per database definition (see
//! [`crate::registry`]), is immutable afterwards, and is shared read-only
//! by every connection for the life of the process. Construction is where
//! all configuration errors surface: an unsupported primary-key type or an
//! unresolved foreign key fails the build, so misconfigured mappings never
//! reach statement execution.

use crate::error::{Error, Result};
use crate::metadata::{MetaKind, MetadataProvider, split_foreign_key_payload};
use crate::value::SqlType;
use serde::{Deserialize, Serialize};

/// Per-dialect capability predicates consulted while the model is built.
///
/// Implemented by every SQL generator. Kept as its own seam so the model
/// builder does not depend on the generator crate.
pub trait TypeCapabilities {
    /// Dialect name for diagnostics.
    fn dialect_name(&self) -> &'static str;

    /// Whether a column of this type may serve as a primary key.
    fn supports_primary_key(&self, sql_type: SqlType) -> bool {
        sql_type.is_numeric() || sql_type == SqlType::Text
    }

    /// Whether a column of this type may auto-increment.
    fn supports_auto_increment(&self, sql_type: SqlType) -> bool {
        sql_type.is_integer()
    }
}

/// One scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModel {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_unique: bool,
    pub is_enum: bool,
    /// Maximum length for text columns. `None` means unconstrained.
    pub max_length: Option<u32>,
    /// Default-value expression, rendered verbatim into DDL.
    pub default_value: Option<String>,
    /// Human-readable name for host UIs; no effect on SQL.
    pub display_name: Option<String>,
}

impl FieldModel {
    fn new(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            not_null: false,
            is_primary_key: false,
            is_auto_increment: false,
            is_unique: false,
            is_enum: false,
            max_length: None,
            default_value: None,
            display_name: None,
        }
    }
}

/// One foreign key. The target is recorded by entity name during
/// construction and resolved to a table index in a second pass, once every
/// table is registered; the reference is referential, never owning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationModel {
    /// Field on the owning table holding the key value.
    pub local_field: String,
    /// Name of the relation as declared.
    pub relation_name: String,
    /// Entity name of the referenced record type.
    pub target_entity: String,
    /// Index of the referenced table in the owning [`DatabaseModel`].
    /// `None` only during construction; a built model has every relation
    /// resolved.
    pub target: Option<usize>,
}

/// One record type: its table name and exclusively-owned fields and
/// relations. Field order is declaration order and is significant (it is
/// DDL column order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    pub entity_name: String,
    pub table_name: String,
    pub fields: Vec<FieldModel>,
    pub relations: Vec<RelationModel>,
}

impl TableModel {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary-key field, if one is declared.
    #[must_use]
    pub fn primary_field(&self) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.is_primary_key)
    }

    /// The auto-increment field, if one is declared.
    #[must_use]
    pub fn auto_increment_field(&self) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.is_auto_increment)
    }
}

/// The full schema model: ordered tables plus the schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseModel {
    /// Identity of the database definition this model was built from.
    pub name: String,
    /// Monotonically increasing schema version.
    pub version: u32,
    pub tables: Vec<TableModel>,
}

impl DatabaseModel {
    /// Build a model from a metadata provider, validating every field
    /// against the active dialect's capability predicates.
    ///
    /// Failures are configuration errors: this runs at schema-definition
    /// time and failing fast is correct.
    pub fn build(provider: &dyn MetadataProvider, caps: &dyn TypeCapabilities) -> Result<Self> {
        let mut version: Option<u32> = None;
        let mut declared: Vec<(String, String)> = Vec::new();

        for entry in provider.database_entries() {
            match entry.kind {
                MetaKind::Table => declared.push((entry.name.clone(), entry.value.clone())),
                MetaKind::DbVersion => {
                    let v: u32 = entry.name.parse().map_err(|_| Error::InvalidMetadata {
                        name: provider.database_name().to_string(),
                        reason: format!("schema version `{}` is not an integer", entry.name),
                    })?;
                    version = Some(v);
                }
                _ => {
                    return Err(Error::InvalidMetadata {
                        name: provider.database_name().to_string(),
                        reason: format!("unexpected {:?} entry at database level", entry.kind),
                    });
                }
            }
        }

        let version = version.ok_or_else(|| Error::InvalidMetadata {
            name: provider.database_name().to_string(),
            reason: "missing DbVersion entry".to_string(),
        })?;

        // Pass 1: materialize every declared table from its own entries.
        let mut tables = Vec::with_capacity(declared.len());
        for (entity, table_name) in &declared {
            let entries = provider
                .entity_entries(entity)
                .ok_or_else(|| Error::UnknownEntity(entity.clone()))?;
            tables.push(build_table(entity, table_name, &entries)?);
        }

        // Pass 2: resolve relation targets by entity name. Foreign keys may
        // reference tables declared later in scan order, so this cannot be
        // folded into pass 1.
        let index_of = |entity: &str| tables.iter().position(|t: &TableModel| t.entity_name == entity);
        let mut resolved: Vec<Vec<usize>> = Vec::with_capacity(tables.len());
        for table in &tables {
            let mut targets = Vec::with_capacity(table.relations.len());
            for rel in &table.relations {
                let target =
                    index_of(&rel.target_entity).ok_or_else(|| Error::UnresolvedRelation {
                        entity: table.entity_name.clone(),
                        relation: rel.relation_name.clone(),
                        target: rel.target_entity.clone(),
                    })?;
                targets.push(target);
            }
            resolved.push(targets);
        }
        for (table, targets) in tables.iter_mut().zip(resolved) {
            for (rel, target) in table.relations.iter_mut().zip(targets) {
                rel.target = Some(target);
            }
        }

        // Validate primary-key / auto-increment claims against the dialect.
        for table in &tables {
            for field in &table.fields {
                if field.is_primary_key && !caps.supports_primary_key(field.sql_type) {
                    return Err(Error::UnsupportedPrimaryKey {
                        field: format!("{}.{}", table.entity_name, field.name),
                        sql_type: field.sql_type,
                        dialect: caps.dialect_name(),
                    });
                }
                if field.is_auto_increment && !caps.supports_auto_increment(field.sql_type) {
                    return Err(Error::UnsupportedAutoIncrement {
                        field: format!("{}.{}", table.entity_name, field.name),
                        sql_type: field.sql_type,
                        dialect: caps.dialect_name(),
                    });
                }
            }
        }

        tracing::info!(
            database = provider.database_name(),
            version,
            tables = tables.len(),
            "Schema model built"
        );

        Ok(Self {
            name: provider.database_name().to_string(),
            version,
            tables,
        })
    }

    /// Look up a table by entity name.
    #[must_use]
    pub fn table_by_entity(&self, entity: &str) -> Option<&TableModel> {
        self.tables.iter().find(|t| t.entity_name == entity)
    }

    /// Look up a table by database table name.
    #[must_use]
    pub fn table_by_name(&self, table_name: &str) -> Option<&TableModel> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    /// The table a relation resolves to.
    #[must_use]
    pub fn relation_target(&self, relation: &RelationModel) -> Option<&TableModel> {
        relation.target.and_then(|i| self.tables.get(i))
    }
}

fn build_table(entity: &str, table_name: &str, entries: &[crate::metadata::MetaEntry]) -> Result<TableModel> {
    let mut fields: Vec<FieldModel> = Vec::new();
    let mut relations: Vec<RelationModel> = Vec::new();

    let invalid = |reason: String| Error::InvalidMetadata {
        name: entity.to_string(),
        reason,
    };

    for entry in entries {
        match entry.kind {
            MetaKind::Field => {
                let sql_type = SqlType::parse(&entry.value)
                    .ok_or_else(|| invalid(format!("unknown type tag `{}`", entry.value)))?;
                fields.push(FieldModel::new(&entry.name, sql_type));
            }
            MetaKind::ForeignKey => {
                let (key_field, relation_name) = split_foreign_key_payload(&entry.value)
                    .ok_or_else(|| invalid(format!("malformed foreign key `{}`", entry.value)))?;
                relations.push(RelationModel {
                    local_field: key_field.to_string(),
                    relation_name: relation_name.to_string(),
                    target_entity: entry.name.clone(),
                    target: None,
                });
            }
            kind => {
                // Remaining kinds annotate an already-declared field.
                let field = fields
                    .iter_mut()
                    .find(|f| f.name == entry.name)
                    .ok_or_else(|| {
                        invalid(format!("{kind:?} names undeclared field `{}`", entry.name))
                    })?;
                match kind {
                    MetaKind::PrimaryKey => field.is_primary_key = true,
                    MetaKind::AutoIncrement => field.is_auto_increment = true,
                    MetaKind::Unique => field.is_unique = true,
                    MetaKind::NotNull => field.not_null = true,
                    MetaKind::Enum => field.is_enum = true,
                    MetaKind::Length => {
                        let len: u32 = entry.value.parse().map_err(|_| {
                            invalid(format!("length `{}` is not an integer", entry.value))
                        })?;
                        field.max_length = Some(len);
                    }
                    MetaKind::DefaultValue => field.default_value = Some(entry.value.clone()),
                    MetaKind::Display => field.display_name = Some(entry.value.clone()),
                    MetaKind::Table | MetaKind::DbVersion => {
                        return Err(invalid(format!("unexpected {kind:?} entry at entity level")));
                    }
                    MetaKind::Field | MetaKind::ForeignKey => unreachable!(),
                }
            }
        }
    }

    Ok(TableModel {
        entity_name: entity.to_string(),
        table_name: table_name.to_string(),
        fields,
        relations,
    })
}
