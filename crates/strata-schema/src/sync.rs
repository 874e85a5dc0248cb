//! Schema synchronization.
//!
//! On connect, the synchronizer compares the schema version stored in the
//! database against the version the model declares and emits whatever DDL
//! closes the gap: everything for a fresh database, additive migrations for
//! an outdated one, nothing for a current one. The database side of the
//! comparison lives in a marker table holding the version number and a JSON
//! snapshot of the model that created it; the snapshot is what makes
//! column-level diffing possible without introspecting the engine's
//! catalog.
//!
//! DDL execution is continue-on-error: a failing statement is logged and
//! recorded in the report, and synchronization proceeds, so one bad
//! statement does not strand the rest of the schema.

use crate::generator::SqlGenerator;
use crate::order::creation_order;
use strata_core::{
    Backend, DatabaseModel, Error, FieldModel, Result, SqlType, TableModel, Value,
};

/// Name of the marker table holding the version and model snapshot.
pub const SCHEMA_TABLE: &str = "__strata_schema";

/// Where a connection stands relative to its schema model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No synchronization has run on this connection.
    NotConnected,
    /// The stored version could not be read or interpreted.
    SchemaUnknown,
    /// The database matches the model version.
    SchemaCurrent,
    /// The database carries a newer version than the model; this build of
    /// the application is behind and no DDL is emitted.
    SchemaStale,
}

/// Lifecycle callbacks fired after structural DDL has run.
pub trait SyncHooks {
    /// The database was empty and the full schema was just created.
    fn database_created(&mut self, model: &DatabaseModel) {
        let _ = model;
    }

    /// The schema was migrated from `old` to `new`.
    fn database_updated(&mut self, old: &DatabaseModel, new: &DatabaseModel) {
        let _ = (old, new);
    }
}

/// No-op hooks for callers that do not care about lifecycle events.
pub struct NoHooks;

impl SyncHooks for NoHooks {}

/// One statement that failed during synchronization.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub sql: String,
    pub message: String,
}

/// What a synchronization run did.
#[derive(Debug)]
pub struct SyncReport {
    /// Statements executed successfully, in order.
    pub statements: Vec<String>,
    /// Statements that failed, with driver messages.
    pub failures: Vec<SyncFailure>,
    /// Whether the full schema was created from scratch.
    pub created: bool,
    /// Whether an existing schema was migrated forward.
    pub updated: bool,
    pub state: SyncState,
}

impl SyncReport {
    fn empty(state: SyncState) -> Self {
        Self {
            statements: Vec::new(),
            failures: Vec::new(),
            created: false,
            updated: false,
            state,
        }
    }
}

/// Drives a database to the schema its model declares.
pub struct Synchronizer<'a> {
    model: &'a DatabaseModel,
    generator: &'a dyn SqlGenerator,
}

impl<'a> Synchronizer<'a> {
    #[must_use]
    pub fn new(model: &'a DatabaseModel, generator: &'a dyn SqlGenerator) -> Self {
        Self { model, generator }
    }

    /// Compare stored and declared versions and run the DDL that closes
    /// the gap.
    #[tracing::instrument(skip_all, fields(database = %self.model.name))]
    pub fn synchronize(
        &self,
        backend: &mut dyn Backend,
        hooks: &mut dyn SyncHooks,
    ) -> Result<SyncReport> {
        let stored = self.stored_version(backend)?;

        match stored {
            None => self.create_fresh(backend, hooks),
            Some(stored) if stored == u64::from(self.model.version) => {
                tracing::debug!(
                    database = %self.model.name,
                    version = self.model.version,
                    "Schema is current"
                );
                Ok(SyncReport::empty(SyncState::SchemaCurrent))
            }
            Some(stored) if stored > u64::from(self.model.version) => {
                tracing::warn!(
                    database = %self.model.name,
                    stored,
                    declared = self.model.version,
                    "Database schema is newer than this build; skipping synchronization"
                );
                Ok(SyncReport::empty(SyncState::SchemaStale))
            }
            Some(stored) => self.upgrade(backend, hooks, stored),
        }
    }

    /// Read the stored schema version. `None` means the marker table does
    /// not exist, which is how a fresh database announces itself.
    fn stored_version(&self, backend: &mut dyn Backend) -> Result<Option<u64>> {
        let sql = format!(
            "SELECT {} FROM {}",
            self.generator.quote_ident("db_version"),
            self.generator.quote_ident(SCHEMA_TABLE)
        );
        match backend.query_value(&sql)? {
            None => Ok(None),
            Some(v) => {
                let version = v.as_int().ok_or_else(|| {
                    Error::Backend(format!("stored schema version is not an integer: {v}"))
                })?;
                let version = u64::try_from(version).map_err(|_| {
                    Error::Backend(format!("stored schema version is negative: {version}"))
                })?;
                Ok(Some(version))
            }
        }
    }

    fn create_fresh(
        &self,
        backend: &mut dyn Backend,
        hooks: &mut dyn SyncHooks,
    ) -> Result<SyncReport> {
        tracing::info!(
            database = %self.model.name,
            version = self.model.version,
            tables = self.model.tables.len(),
            "Creating schema"
        );
        let mut report = SyncReport::empty(SyncState::SchemaCurrent);
        report.created = true;

        for index in creation_order(self.model) {
            let sql = self
                .generator
                .create_table(self.model, &self.model.tables[index]);
            self.exec(backend, sql, &mut report);
        }

        let marker = marker_table();
        let sql = self.generator.create_table(self.model, &marker);
        self.exec(backend, sql, &mut report);
        let sql = self
            .generator
            .insert_command(&marker, &self.marker_values()?);
        self.exec(backend, sql, &mut report);

        hooks.database_created(self.model);
        Ok(report)
    }

    fn upgrade(
        &self,
        backend: &mut dyn Backend,
        hooks: &mut dyn SyncHooks,
        stored: u64,
    ) -> Result<SyncReport> {
        tracing::info!(
            database = %self.model.name,
            from = stored,
            to = self.model.version,
            "Upgrading schema"
        );
        let mut report = SyncReport::empty(SyncState::SchemaCurrent);
        report.updated = true;

        let old = self.stored_snapshot(backend, stored)?;

        for index in creation_order(self.model) {
            let table = &self.model.tables[index];
            match old.table_by_name(&table.table_name) {
                None => {
                    let sql = self.generator.create_table(self.model, table);
                    self.exec(backend, sql, &mut report);
                }
                Some(old_table) => {
                    self.diff_columns(backend, table, old_table, &mut report);
                }
            }
        }

        // Tables and columns removed from the model are left in place;
        // migrations are additive only.

        let marker = marker_table();
        let sets = self.marker_values()?;
        let assignments: Vec<String> = sets
            .iter()
            .map(|(c, v)| {
                format!(
                    "{} = {}",
                    self.generator.quote_ident(c),
                    self.generator.escape_value(v)
                )
            })
            .collect();
        let sql = format!(
            "UPDATE {} SET {}",
            self.generator.quote_ident(&marker.table_name),
            assignments.join(", ")
        );
        self.exec(backend, sql, &mut report);

        hooks.database_updated(&old, self.model);
        Ok(report)
    }

    fn diff_columns(
        &self,
        backend: &mut dyn Backend,
        table: &TableModel,
        old_table: &TableModel,
        report: &mut SyncReport,
    ) {
        for field in &table.fields {
            match old_table.field(&field.name) {
                None => {
                    let sql = self.generator.add_column(table, field);
                    self.exec(backend, sql, report);
                }
                Some(old_field) if old_field.sql_type != field.sql_type => {
                    let sql = self.generator.alter_column_type(table, field);
                    self.exec(backend, sql, report);
                }
                Some(_) => {}
            }
        }
    }

    /// Read and decode the model snapshot stored alongside the version. A
    /// missing snapshot downgrades the diff to table-level (every table
    /// looks new) but keeps the stored version, so upgrade notifications
    /// still report where the schema came from; a corrupt snapshot is an
    /// error.
    fn stored_snapshot(&self, backend: &mut dyn Backend, stored: u64) -> Result<DatabaseModel> {
        let sql = format!(
            "SELECT {} FROM {}",
            self.generator.quote_ident("model_json"),
            self.generator.quote_ident(SCHEMA_TABLE)
        );
        match backend.query_value(&sql)? {
            Some(Value::Text(json)) => Ok(serde_json::from_str(&json)?),
            _ => {
                tracing::warn!(
                    database = %self.model.name,
                    "Schema snapshot is missing; column-level diffing unavailable"
                );
                Ok(DatabaseModel {
                    name: self.model.name.clone(),
                    version: u32::try_from(stored).unwrap_or(u32::MAX),
                    tables: Vec::new(),
                })
            }
        }
    }

    fn marker_values(&self) -> Result<Vec<(String, Value)>> {
        let json = serde_json::to_string(self.model)?;
        Ok(vec![
            (
                "db_version".to_string(),
                Value::Int(i64::from(self.model.version)),
            ),
            ("model_json".to_string(), Value::Text(json)),
        ])
    }

    fn exec(&self, backend: &mut dyn Backend, sql: String, report: &mut SyncReport) {
        tracing::debug!(sql = %sql, "DDL");
        match backend.execute(&sql) {
            Ok(_) => report.statements.push(sql),
            Err(e) => {
                tracing::warn!(error = %e, sql = %sql, "DDL statement failed; continuing");
                report.failures.push(SyncFailure {
                    sql,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// The marker table, expressed as an ordinary table model so its DDL and
/// DML go through the active generator like everything else.
fn marker_table() -> TableModel {
    let column = |name: &str, sql_type: SqlType, not_null: bool| FieldModel {
        name: name.to_string(),
        sql_type,
        not_null,
        is_primary_key: false,
        is_auto_increment: false,
        is_unique: false,
        is_enum: false,
        max_length: None,
        default_value: None,
        display_name: None,
    };
    TableModel {
        entity_name: SCHEMA_TABLE.to_string(),
        table_name: SCHEMA_TABLE.to_string(),
        fields: vec![
            column("db_version", SqlType::Int, true),
            column("model_json", SqlType::Text, false),
        ],
        relations: Vec::new(),
    }
}
