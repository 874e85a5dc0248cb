//! Per-record lifecycle state and change tracking.
//!
//! Every row-backed object carries a [`ChangeTracker`]: its [`RowStatus`]
//! plus the set of field names written since the last save. The save
//! pipeline reads both to decide between INSERT, UPDATE, DELETE, and no-op.
//!
//! Rows are shared single-threaded handles ([`Row<T>`] is
//! `Rc<RefCell<T>>`): a child record can hold its parent across table sets
//! without owning it, which is what lets the pipeline save a referenced
//! parent before the record that points at it.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Shared handle to a row-backed object.
pub type Row<T> = Rc<RefCell<T>>;

/// Wrap a record in a shared row handle.
pub fn row<T>(record: T) -> Row<T> {
    Rc::new(RefCell::new(record))
}

/// Lifecycle status of a row-backed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Constructed in memory, not yet attached to a table set.
    NewlyCreated,
    /// Materialized from the database; writes move it to `Modified`.
    Fetched,
    /// Attached to a table set and awaiting INSERT.
    MarkedForInsert,
    /// Fetched and since written to; awaiting UPDATE.
    Modified,
    /// Awaiting DELETE; detached from its set once the DELETE succeeds.
    MarkedForDelete,
}

/// Dirty-state bookkeeping for one record.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    status: RowStatus,
    changed: BTreeSet<String>,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    /// Tracker for a freshly constructed record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: RowStatus::NewlyCreated,
            changed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> RowStatus {
        self.status
    }

    pub fn set_status(&mut self, status: RowStatus) {
        self.status = status;
    }

    /// Record a field write. `value_changed` is whether the new value
    /// differs from the old one; while the record is new or pending insert
    /// every write counts, changed or not.
    pub fn note_write(&mut self, field: &str, value_changed: bool) {
        let always_dirty = matches!(
            self.status,
            RowStatus::NewlyCreated | RowStatus::MarkedForInsert
        );
        if !(value_changed || always_dirty) {
            return;
        }
        self.changed.insert(field.to_string());
        if self.status == RowStatus::Fetched {
            self.status = RowStatus::Modified;
        }
    }

    /// Field names written since the last save, in stable order.
    #[must_use]
    pub fn changed_fields(&self) -> &BTreeSet<String> {
        &self.changed
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Transition after a successful INSERT or UPDATE: the record now
    /// mirrors the database row.
    pub fn mark_saved(&mut self) {
        self.changed.clear();
        self.status = RowStatus::Fetched;
    }

    /// Drop accumulated changes without saving.
    pub fn clear_changes(&mut self) {
        self.changed.clear();
    }
}

/// A row-backed object the save pipeline can operate on.
///
/// Implementations write through [`ChangeTracker::note_write`] in their
/// field setters and expose their values in neutral form.
pub trait Record {
    /// Entity name matching the table declaration in the schema model.
    fn entity_name(&self) -> &'static str;

    fn tracker(&self) -> &ChangeTracker;

    fn tracker_mut(&mut self) -> &mut ChangeTracker;

    /// Current value of a field in neutral form.
    fn field_value(&self, field: &str) -> Value;

    /// Write a field in neutral form. Used by the pipeline to populate
    /// foreign-key columns from a freshly saved parent.
    fn set_field_value(&mut self, field: &str, value: Value);

    /// Value of the primary-key field.
    fn primary_value(&self) -> Value;

    /// Write the primary-key field, e.g. with a generated key after INSERT.
    fn set_primary_value(&mut self, value: Value);

    /// In-memory parent handle for a named relation, if one is attached.
    /// The default is a record with no attached parents.
    fn parent(&self, relation_name: &str) -> Option<Row<dyn Record>> {
        let _ = relation_name;
        None
    }
}
