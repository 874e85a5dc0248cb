//! The database handle: configuration, connect-time synchronization, and
//! the save entry point.
//!
//! A [`Database`] ties together one schema model, one dialect generator,
//! and one transport. Opening it builds (or reuses) the model, picks the
//! generator from the configured driver, and synchronizes the live schema;
//! afterwards, table sets attach to it and [`Database::save_changes`]
//! flushes everything they have accumulated.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use strata_core::{Backend, DatabaseModel, MetadataProvider, Result, registry};
use strata_query::Phrase;
use strata_schema::{
    NoHooks, SqlGenerator, SyncHooks, SyncReport, SyncState, Synchronizer, generator_for_driver,
};
use strata_session::{SaveContext, TableSetBase};

/// Connection configuration.
///
/// Host, port, and credentials are carried for the transport's benefit;
/// this layer only interprets `driver` (generator choice) and
/// `database_name`.
#[derive(Debug, Clone)]
pub struct Config {
    driver: String,
    database_name: String,
    host: String,
    port: Option<u16>,
    username: String,
    password: String,
}

impl Config {
    #[must_use]
    pub fn new(driver: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            database_name: database_name.into(),
            host: "localhost".to_string(),
            port: None,
            username: String::new(),
            password: String::new(),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port_number(&self) -> Option<u16> {
        self.port
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn user_password(&self) -> &str {
        &self.password
    }
}

/// An open, synchronized connection to one database.
pub struct Database {
    config: Config,
    connection_name: String,
    model: Arc<DatabaseModel>,
    generator: Box<dyn SqlGenerator>,
    backend: Box<dyn Backend>,
    state: SyncState,
    last_sync: SyncReport,
    sets: Vec<Rc<RefCell<dyn TableSetBase>>>,
}

impl Database {
    /// Open a connection: pick the generator, build or reuse the schema
    /// model, and synchronize the live schema.
    pub fn open(
        config: Config,
        provider: &dyn MetadataProvider,
        backend: Box<dyn Backend>,
    ) -> Result<Self> {
        Self::open_with_hooks(config, provider, backend, &mut NoHooks)
    }

    /// [`Database::open`] with lifecycle hooks for schema creation and
    /// upgrade events.
    pub fn open_with_hooks(
        config: Config,
        provider: &dyn MetadataProvider,
        mut backend: Box<dyn Backend>,
        hooks: &mut dyn SyncHooks,
    ) -> Result<Self> {
        let generator = generator_for_driver(config.driver())?;

        // Capability validation depends on the dialect, so the cache key
        // carries it: the same definition opened against two engines yields
        // two models.
        let key = format!("{}::{}", provider.database_name(), generator.dialect_name());
        let model = registry::get_or_build(&key, || {
            DatabaseModel::build(provider, generator.as_ref())
        })?;

        let connection_name = format!(
            "{}_{}",
            config.database_name(),
            registry::next_connection_id()
        );

        let report =
            Synchronizer::new(&model, generator.as_ref()).synchronize(backend.as_mut(), hooks)?;
        tracing::info!(
            connection = %connection_name,
            dialect = generator.dialect_name(),
            state = ?report.state,
            statements = report.statements.len(),
            failures = report.failures.len(),
            "Database opened"
        );

        Ok(Self {
            config,
            connection_name,
            model,
            generator,
            backend,
            state: report.state,
            last_sync: report,
            sets: Vec::new(),
        })
    }

    /// Register a table set so [`Database::save_changes`] includes it.
    pub fn attach(&mut self, set: Rc<RefCell<dyn TableSetBase>>) {
        self.sets.push(set);
    }

    /// Flush every attached table set. Returns the total rows affected by
    /// successful statements; rows whose statements failed are logged,
    /// skipped, and stay pending.
    #[tracing::instrument(skip(self), fields(connection = %self.connection_name))]
    pub fn save_changes(&mut self) -> Result<u64> {
        let mut ctx = SaveContext {
            model: &self.model,
            generator: self.generator.as_ref(),
            backend: self.backend.as_mut(),
        };
        let mut affected = 0u64;
        for set in &self.sets {
            affected += set.borrow_mut().save(&mut ctx)?;
        }
        tracing::debug!(
            connection = %self.connection_name,
            affected,
            "Save pass complete"
        );
        Ok(affected)
    }

    /// Detach every row from every attached set without touching the
    /// database.
    pub fn clean_up(&mut self) {
        for set in &self.sets {
            set.borrow_mut().clear_rows();
        }
        tracing::debug!(connection = %self.connection_name, "Table sets cleared");
    }

    /// SELECT text for an entity through the active generator.
    pub fn select_sql(
        &self,
        entity: &str,
        condition: Option<&Phrase>,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> Result<String> {
        let table = self
            .model
            .table_by_entity(entity)
            .ok_or_else(|| strata_core::Error::UnknownEntity(entity.to_string()))?;
        Ok(self.generator.select_command(table, condition, skip, take))
    }

    /// The database to administer from when creating this one; `master`
    /// on SQL Server, the database itself elsewhere.
    #[must_use]
    pub fn maintenance_database_name(&self) -> String {
        self.generator
            .master_database_name(self.config.database_name())
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    #[must_use]
    pub fn model(&self) -> &DatabaseModel {
        &self.model
    }

    #[must_use]
    pub fn generator(&self) -> &dyn SqlGenerator {
        self.generator.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// What synchronization did when this connection opened.
    #[must_use]
    pub fn sync_report(&self) -> &SyncReport {
        &self.last_sync
    }

    /// Direct transport access, for callers running their own queries.
    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::backend::testing::RecordingBackend;
    use strata_core::metadata::{DatabaseMeta, EntityMeta};
    use strata_query::FieldRef;

    fn provider(name: &str) -> DatabaseMeta {
        DatabaseMeta::new(name, 1).table(
            EntityMeta::new("Author")
                .field("id", "int")
                .primary_auto_increment("id")
                .field("name", "text"),
            "authors",
        )
    }

    #[test]
    fn test_config_builder() {
        let c = Config::new("postgres", "blog")
            .host("db.internal")
            .port(5432)
            .username("app")
            .password("secret");
        assert_eq!(c.driver(), "postgres");
        assert_eq!(c.database_name(), "blog");
        assert_eq!(c.host_name(), "db.internal");
        assert_eq!(c.port_number(), Some(5432));
        assert_eq!(c.user_name(), "app");
    }

    #[test]
    fn test_open_creates_fresh_schema() {
        let db = Database::open(
            Config::new("sqlite", "db_open_fresh"),
            &provider("db_open_fresh"),
            Box::new(RecordingBackend::new()),
        )
        .unwrap();

        assert_eq!(db.state(), SyncState::SchemaCurrent);
        assert!(db.sync_report().created);
        assert!(db.connection_name().starts_with("db_open_fresh_"));
        assert_eq!(db.model().tables.len(), 1);
    }

    #[test]
    fn test_unknown_driver_fails_open() {
        let err = Database::open(
            Config::new("oracle", "db_open_unknown"),
            &provider("db_open_unknown"),
            Box::new(RecordingBackend::new()),
        )
        .err()
        .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_select_sql_renders_for_the_active_dialect() {
        let db = Database::open(
            Config::new("sqlite", "db_select"),
            &provider("db_select"),
            Box::new(RecordingBackend::new()),
        )
        .unwrap();

        let cond = FieldRef::new("authors", "name").like("A%");
        let sql = db
            .select_sql("Author", Some(&cond), Some(10), None)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"authors\" WHERE \"authors\".\"name\" LIKE 'A%' LIMIT -1 OFFSET 10"
        );
    }

    #[test]
    fn test_maintenance_database_is_master_on_sqlserver() {
        let db = Database::open(
            Config::new("mssql", "db_master"),
            &provider("db_master"),
            Box::new(RecordingBackend::new()),
        )
        .unwrap();
        assert_eq!(db.maintenance_database_name(), "master");
    }
}
