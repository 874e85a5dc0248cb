//! The transport seam.
//!
//! Everything in this workspace produces SQL text; shipping that text to a
//! server is the job of an external collaborator implementing [`Backend`].
//! The trait is synchronous and minimal on purpose: the synchronizer and
//! the save pipeline run to completion on the calling thread, and timeouts
//! or pooling belong to whatever sits behind the trait.

use crate::error::Result;
use crate::value::Value;

/// Outcome of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    /// Rows the statement touched.
    pub rows_affected: u64,
    /// Key generated for an auto-increment column, when the driver reports
    /// one.
    pub last_insert_id: Option<Value>,
}

/// Synchronous statement transport to a live database.
pub trait Backend {
    /// Execute one DDL or DML statement.
    fn execute(&mut self, sql: &str) -> Result<ExecResult>;

    /// Run a query expected to yield at most one scalar (version markers,
    /// snapshot lookups). `Ok(None)` means the object queried does not
    /// exist, which is how an empty or missing database announces itself.
    fn query_value(&mut self, sql: &str) -> Result<Option<Value>>;
}

pub mod testing {
    //! Scriptable transport double for tests.

    use super::{Backend, ExecResult};
    use crate::error::{Error, Result};
    use crate::value::Value;
    use std::collections::VecDeque;

    /// Records every statement it is handed, hands out sequential generated
    /// keys for INSERTs, and replays scripted answers for scalar queries.
    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        /// Every executed statement, in order.
        pub statements: Vec<String>,
        /// Every scalar query, in order.
        pub queries: Vec<String>,
        scripted: VecDeque<Option<Value>>,
        fail_patterns: Vec<String>,
        next_key: i64,
    }

    impl RecordingBackend {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the answer for the next scalar query. Unqueued queries
        /// answer `None`, the shape of an empty database.
        pub fn push_query_value(&mut self, value: Option<Value>) {
            self.scripted.push_back(value);
        }

        /// Make any statement containing `pattern` fail.
        pub fn fail_on(&mut self, pattern: &str) {
            self.fail_patterns.push(pattern.to_string());
        }

        /// Statements containing `needle`, in execution order.
        #[must_use]
        pub fn matching(&self, needle: &str) -> Vec<&str> {
            self.statements
                .iter()
                .filter(|s| s.contains(needle))
                .map(String::as_str)
                .collect()
        }
    }

    impl Backend for RecordingBackend {
        fn execute(&mut self, sql: &str) -> Result<ExecResult> {
            if let Some(p) = self.fail_patterns.iter().find(|p| sql.contains(p.as_str())) {
                return Err(Error::Execution {
                    sql: sql.to_string(),
                    message: format!("scripted failure on `{p}`"),
                });
            }
            self.statements.push(sql.to_string());
            let last_insert_id = if sql.trim_start().starts_with("INSERT") {
                self.next_key += 1;
                Some(Value::Int(self.next_key))
            } else {
                None
            };
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id,
            })
        }

        fn query_value(&mut self, sql: &str) -> Result<Option<Value>> {
            self.queries.push(sql.to_string());
            Ok(self.scripted.pop_front().unwrap_or(None))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_insert_yields_sequential_keys() {
            let mut b = RecordingBackend::new();
            let r1 = b.execute("INSERT INTO t (a) VALUES (1)").unwrap();
            let r2 = b.execute("INSERT INTO t (a) VALUES (2)").unwrap();
            assert_eq!(r1.last_insert_id, Some(Value::Int(1)));
            assert_eq!(r2.last_insert_id, Some(Value::Int(2)));
            assert_eq!(b.statements.len(), 2);
        }

        #[test]
        fn test_scripted_failure() {
            let mut b = RecordingBackend::new();
            b.fail_on("boom");
            assert!(b.execute("UPDATE boom SET x = 1").is_err());
            // Failed statements are not recorded as executed.
            assert!(b.statements.is_empty());
        }

        #[test]
        fn test_query_script_exhausts_to_none() {
            let mut b = RecordingBackend::new();
            b.push_query_value(Some(Value::Int(3)));
            assert_eq!(b.query_value("SELECT v").unwrap(), Some(Value::Int(3)));
            assert_eq!(b.query_value("SELECT v").unwrap(), None);
        }
    }
}
