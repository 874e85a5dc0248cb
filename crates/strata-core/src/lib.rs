//! Core types for Strata.
//!
//! `strata-core` is the foundation layer for the workspace. It defines the
//! neutral value model, the metadata stream, the schema model and its
//! builder, per-record change tracking, and the transport seam every other
//! crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Data model**: [`SqlType`], [`Value`], [`FieldModel`], [`TableModel`],
//!   and [`DatabaseModel`] are shared across the generator, synchronizer,
//!   and session crates.
//! - **Contract layer**: [`MetadataProvider`] is how applications declare
//!   schemas; [`Backend`] is how generated SQL reaches a server; [`Record`]
//!   is what the save pipeline operates on.
//! - **Shared state**: [`registry`] memoizes one immutable model per
//!   database definition for the life of the process.
//!
//! # Who Uses This Crate
//!
//! - `strata-query` builds condition trees over [`Value`].
//! - `strata-schema` implements [`TypeCapabilities`] per dialect and turns
//!   model elements into SQL text.
//! - `strata-session` drives [`Record`] state through the save pipeline.
//! - The `strata` facade wires all of it to a [`Backend`].

pub mod backend;
pub mod error;
pub mod metadata;
pub mod model;
pub mod record;
pub mod registry;
pub mod value;

pub use backend::{Backend, ExecResult};
pub use error::{Error, Result};
pub use metadata::{DatabaseMeta, EntityMeta, MetaEntry, MetaKind, MetadataProvider};
pub use model::{DatabaseModel, FieldModel, RelationModel, TableModel, TypeCapabilities};
pub use record::{ChangeTracker, Record, Row, RowStatus, row};
pub use value::{SqlType, Value};
