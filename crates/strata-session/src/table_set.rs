//! Per-entity collections of tracked rows.
//!
//! A [`TableSet`] holds the rows of one record type that this connection
//! knows about. Saving walks every row and emits whatever its status calls
//! for; a statement failure on one row is logged and skipped so the rest of
//! the set still saves. [`TableSetBase`] is the type-erased face the
//! database handle drives without knowing the record type.

use crate::save::{SaveContext, save_one};
use strata_core::{Record, Result, Row, RowStatus};

/// Type-erased table set operations, one per registered record type.
pub trait TableSetBase {
    /// Save every pending row. Returns rows affected by successful
    /// statements; failed rows are logged, skipped, and keep their pending
    /// status for a later retry.
    fn save(&mut self, ctx: &mut SaveContext<'_>) -> Result<u64>;

    /// Detach every row without touching the database.
    fn clear_rows(&mut self);

    /// Rows currently attached.
    fn row_count(&self) -> usize;
}

/// The tracked rows of one record type.
pub struct TableSet<T: Record> {
    rows: Vec<Row<T>>,
}

impl<T: Record> Default for TableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> TableSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Attach a row for insertion on the next save.
    pub fn append(&mut self, row: Row<T>) {
        {
            let mut record = row.borrow_mut();
            if record.tracker().status() == RowStatus::NewlyCreated {
                record.tracker_mut().set_status(RowStatus::MarkedForInsert);
            }
        }
        self.rows.push(row);
    }

    /// Mark an attached row for deletion on the next save.
    pub fn remove(&mut self, row: &Row<T>) {
        row.borrow_mut()
            .tracker_mut()
            .set_status(RowStatus::MarkedForDelete);
    }

    /// The attached rows, in attachment order.
    #[must_use]
    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }
}

impl<T: Record> TableSetBase for TableSet<T> {
    fn save(&mut self, ctx: &mut SaveContext<'_>) -> Result<u64> {
        let mut affected = 0u64;
        let mut kept = Vec::with_capacity(self.rows.len());

        for row in self.rows.drain(..) {
            let status = row.borrow().tracker().status();
            let outcome = save_one(ctx, &mut *row.borrow_mut());
            match outcome {
                Ok(n) => {
                    affected += n;
                    // A deleted row leaves the set; everything else stays.
                    if status != RowStatus::MarkedForDelete {
                        kept.push(row);
                    }
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        entity = row.borrow().entity_name(),
                        error = %e,
                        "Row save failed; skipping"
                    );
                    kept.push(row);
                }
            }
        }

        self.rows = kept;
        Ok(affected)
    }

    fn clear_rows(&mut self) {
        self.rows.clear();
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}
