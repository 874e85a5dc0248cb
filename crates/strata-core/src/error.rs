//! Error taxonomy.
//!
//! Two classes matter here and they never mix:
//!
//! - **Configuration errors** are produced while a schema model is built or
//!   a connection is opened: an unsupported primary-key type, an unresolved
//!   relation target, an unknown driver identifier. These are programming
//!   errors; callers are expected to treat them as fatal at startup rather
//!   than retry.
//! - **Execution errors** are produced by the transport while running a
//!   single DDL/DML statement. They are recoverable: the failing statement
//!   and driver text are logged, the record or migration step is skipped,
//!   and processing continues.
//!
//! Saving a record with nothing changed and similar no-ops are not errors
//! at all and never surface here.

use crate::value::SqlType;
use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by the schema model, generators, synchronizer, and
/// save pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A field is declared primary key but the active dialect cannot index
    /// that type. Configuration error.
    #[error("field `{field}` of type {sql_type} is not supported as a primary key by the {dialect} dialect")]
    UnsupportedPrimaryKey {
        field: String,
        sql_type: SqlType,
        dialect: &'static str,
    },

    /// A field is declared auto-increment on a type the active dialect
    /// cannot auto-increment. Configuration error.
    #[error("field `{field}` of type {sql_type} is not supported as auto-increment by the {dialect} dialect")]
    UnsupportedAutoIncrement {
        field: String,
        sql_type: SqlType,
        dialect: &'static str,
    },

    /// A foreign key names an entity that is not declared in the same
    /// schema model. Configuration error.
    #[error("relation `{relation}` on `{entity}` references undeclared entity `{target}`")]
    UnresolvedRelation {
        entity: String,
        relation: String,
        target: String,
    },

    /// The connection configuration names a driver with no known generator.
    /// Configuration error.
    #[error("no SQL generator for driver `{0}`")]
    UnknownDriver(String),

    /// A metadata entry could not be interpreted (bad version number, bad
    /// type tag, malformed foreign-key payload). Configuration error.
    #[error("invalid metadata for `{name}`: {reason}")]
    InvalidMetadata { name: String, reason: String },

    /// A table declared in the database definition yielded no metadata.
    /// Configuration error.
    #[error("entity `{0}` is declared as a table but has no metadata")]
    UnknownEntity(String),

    /// A single statement failed at the transport. Recoverable: the caller
    /// logs it and moves on.
    #[error("statement failed: {message}; sql: {sql}")]
    Execution { sql: String, message: String },

    /// The transport itself failed outside any particular statement.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored schema snapshot could not be decoded.
    #[error("corrupt schema snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error belongs to the configuration class, meaning it
    /// must abort startup and retrying is pointless.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedPrimaryKey { .. }
                | Error::UnsupportedAutoIncrement { .. }
                | Error::UnresolvedRelation { .. }
                | Error::UnknownDriver(_)
                | Error::InvalidMetadata { .. }
                | Error::UnknownEntity(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let e = Error::UnknownDriver("foo".into());
        assert!(e.is_configuration());

        let e = Error::Execution {
            sql: "DELETE FROM t".into(),
            message: "locked".into(),
        };
        assert!(!e.is_configuration());
    }

    #[test]
    fn test_display_carries_statement_text() {
        let e = Error::Execution {
            sql: "INSERT INTO t VALUES (1)".into(),
            message: "constraint violation".into(),
        };
        let text = e.to_string();
        assert!(text.contains("INSERT INTO t VALUES (1)"));
        assert!(text.contains("constraint violation"));
    }
}
