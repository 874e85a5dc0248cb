//! Strata: a schema-model ORM core with multi-dialect SQL generation.
//!
//! The facade crate re-exports the workspace surface:
//!
//! - schema metadata, the model, records, and values from `strata-core`
//! - condition trees from `strata-query`
//! - dialect generators and the synchronizer from `strata-schema`
//! - table sets and the save pipeline from `strata-session`
//! - the [`Database`] handle and its [`Config`] from this crate
//!
//! A typical application declares its entities through a
//! [`MetadataProvider`], opens a [`Database`] against one of the four
//! supported engines, attaches [`TableSet`]s, and calls
//! [`Database::save_changes`].

pub mod database;

pub use database::{Config, Database};

pub use strata_core::{
    Backend, ChangeTracker, DatabaseMeta, DatabaseModel, EntityMeta, Error, ExecResult,
    FieldModel, MetaEntry, MetaKind, MetadataProvider, Record, RelationModel, Result, Row,
    RowStatus, SqlType, TableModel, TypeCapabilities, Value, row,
};
pub use strata_query::{CompareOp, FieldRef, Phrase};
pub use strata_schema::{
    MySqlGenerator, NoHooks, PostgresGenerator, SqlGenerator, SqlServerGenerator,
    SqliteGenerator, SyncFailure, SyncHooks, SyncReport, SyncState, Synchronizer,
    generator_for_driver,
};
pub use strata_session::{SaveContext, TableSet, TableSetBase, save_one};
