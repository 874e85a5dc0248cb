//! Dialect-neutral condition trees for Strata.
//!
//! This crate owns the logical half of query construction: [`Phrase`]
//! trees built from [`FieldRef`]s and neutral values. The textual half —
//! operator tokens, escaping, pagination syntax — lives with the dialect
//! generators in `strata-schema`, which render these trees via
//! `SqlGenerator::render_condition`.

pub mod phrase;

pub use phrase::{CompareOp, FieldRef, Phrase};
