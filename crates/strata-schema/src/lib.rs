//! Dialect SQL generators and schema synchronization.
//!
//! This crate turns the neutral schema model and condition trees from
//! `strata-core` and `strata-query` into engine-specific SQL text, and
//! drives a connected database to the schema its model declares. One
//! [`SqlGenerator`] exists per supported engine (PostgreSQL, MySQL, SQLite,
//! SQL Server); [`generator_for_driver`] picks one from a driver
//! identifier, and [`Synchronizer`] runs the version comparison and DDL on
//! connect.

pub mod driver;
pub mod generator;
pub mod order;
pub mod sync;

pub use driver::generator_for_driver;
pub use generator::{
    MySqlGenerator, PostgresGenerator, SqlGenerator, SqlServerGenerator, SqliteGenerator,
};
pub use order::creation_order;
pub use sync::{
    NoHooks, SCHEMA_TABLE, SyncFailure, SyncHooks, SyncReport, SyncState, Synchronizer,
};
