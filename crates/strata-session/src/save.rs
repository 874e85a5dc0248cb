//! Statement emission for one record.
//!
//! [`save_one`] dispatches on the record's [`RowStatus`] and produces at
//! most one INSERT, UPDATE, or DELETE through the active generator. The
//! insert path walks attached parents first, so a referenced record is in
//! the database (and has its generated key) before the row pointing at it
//! is written.

use strata_core::{Backend, DatabaseModel, Error, Record, Result, RowStatus, TableModel, Value};
use strata_schema::SqlGenerator;

/// Everything the pipeline needs to turn records into executed statements.
pub struct SaveContext<'a> {
    pub model: &'a DatabaseModel,
    pub generator: &'a dyn SqlGenerator,
    pub backend: &'a mut dyn Backend,
}

/// Save one record according to its status. Returns the rows affected;
/// zero for a record with nothing to do.
pub fn save_one(ctx: &mut SaveContext<'_>, record: &mut dyn Record) -> Result<u64> {
    match record.tracker().status() {
        RowStatus::NewlyCreated | RowStatus::MarkedForInsert => insert_record(ctx, record),
        RowStatus::Modified => update_record(ctx, record),
        RowStatus::MarkedForDelete => delete_record(ctx, record),
        RowStatus::Fetched => Ok(0),
    }
}

fn table_for<'m>(model: &'m DatabaseModel, record: &dyn Record) -> Result<&'m TableModel> {
    model
        .table_by_entity(record.entity_name())
        .ok_or_else(|| Error::UnknownEntity(record.entity_name().to_string()))
}

fn insert_record(ctx: &mut SaveContext<'_>, record: &mut dyn Record) -> Result<u64> {
    let table = table_for(ctx.model, record)?;

    // Parents first: an attached parent that is still pending lands in the
    // database now, and its key is copied into this record's foreign-key
    // column before the INSERT text is built.
    for rel in &table.relations {
        let Some(parent) = record.parent(&rel.relation_name) else {
            continue;
        };
        {
            let mut parent = parent.borrow_mut();
            // Only flush parents with a pending write. A parent marked for
            // deletion belongs to its own set's save pass; running it here
            // would delete the row this record is about to reference.
            if matches!(
                parent.tracker().status(),
                RowStatus::NewlyCreated | RowStatus::MarkedForInsert | RowStatus::Modified
            ) {
                save_one(ctx, &mut *parent)?;
            }
        }
        let key = parent.borrow().primary_value();
        record.set_field_value(&rel.local_field, key);
    }

    let changed = record.tracker().changed_fields().clone();
    let values: Vec<(String, Value)> = table
        .fields
        .iter()
        .filter(|f| !f.is_auto_increment)
        .filter(|f| changed.is_empty() || changed.contains(&f.name))
        .map(|f| (f.name.clone(), record.field_value(&f.name)))
        .collect();

    let sql = ctx.generator.insert_command(table, &values);
    tracing::debug!(entity = record.entity_name(), sql = %sql, "INSERT");
    let result = ctx.backend.execute(&sql)?;

    if table.auto_increment_field().is_some() {
        if let Some(key) = result.last_insert_id {
            record.set_primary_value(key);
        }
    }
    record.tracker_mut().mark_saved();
    Ok(result.rows_affected)
}

fn update_record(ctx: &mut SaveContext<'_>, record: &mut dyn Record) -> Result<u64> {
    let table = table_for(ctx.model, record)?;
    let Some(pk_field) = table.primary_field() else {
        return Err(Error::InvalidMetadata {
            name: table.entity_name.clone(),
            reason: "UPDATE requires a primary key".to_string(),
        });
    };

    // Modified with nothing actually changed is a no-op, not an error.
    let changed = record.tracker().changed_fields();
    let sets: Vec<(String, Value)> = changed
        .iter()
        .filter(|name| *name != &pk_field.name)
        .map(|name| (name.clone(), record.field_value(name)))
        .collect();
    if sets.is_empty() {
        record.tracker_mut().mark_saved();
        return Ok(0);
    }

    let sql = ctx
        .generator
        .update_command(table, &sets, pk_field, &record.primary_value());
    tracing::debug!(entity = record.entity_name(), sql = %sql, "UPDATE");
    let result = ctx.backend.execute(&sql)?;
    record.tracker_mut().mark_saved();
    Ok(result.rows_affected)
}

fn delete_record(ctx: &mut SaveContext<'_>, record: &mut dyn Record) -> Result<u64> {
    let table = table_for(ctx.model, record)?;
    let Some(pk_field) = table.primary_field() else {
        return Err(Error::InvalidMetadata {
            name: table.entity_name.clone(),
            reason: "DELETE requires a primary key".to_string(),
        });
    };

    let sql = ctx
        .generator
        .delete_command(table, pk_field, &record.primary_value());
    tracing::debug!(entity = record.entity_name(), sql = %sql, "DELETE");
    let result = ctx.backend.execute(&sql)?;
    Ok(result.rows_affected)
}
