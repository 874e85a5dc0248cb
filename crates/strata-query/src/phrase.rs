//! Condition trees.
//!
//! A [`Phrase`] is the logical structure of a WHERE clause: comparisons,
//! conjunction, disjunction, negation. It carries field references and
//! neutral [`Value`]s and knows no SQL syntax at all; each dialect
//! generator renders the same tree into its own operator tokens and
//! escaping rules. That split is what lets one query-construction API
//! serve four dialects.
//!
//! Trees compose with `&`, `|`, and `!`:
//!
//! ```
//! use strata_query::FieldRef;
//!
//! let name = FieldRef::new("authors", "name");
//! let id = FieldRef::new("authors", "id");
//! let cond = name.like("A%") & !id.eq(1);
//! ```

use serde::{Deserialize, Serialize};
use strata_core::Value;

/// A reference to a column, qualified by table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub table: String,
    pub name: String,
}

impl FieldRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn eq(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Le, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(&self, value: impl Into<Value>) -> Phrase {
        self.compare(CompareOp::Ge, value)
    }

    /// SQL LIKE with the dialect's default case sensitivity.
    pub fn like(&self, pattern: impl Into<String>) -> Phrase {
        self.compare(CompareOp::Like, Value::Text(pattern.into()))
    }

    /// Case-insensitive match. Renders as `ILIKE` where the dialect has
    /// it and as a lowered `LIKE` elsewhere.
    pub fn ilike(&self, pattern: impl Into<String>) -> Phrase {
        self.compare(CompareOp::ILike, Value::Text(pattern.into()))
    }

    /// Compare against another column instead of a value.
    pub fn eq_field(&self, other: &FieldRef) -> Phrase {
        Phrase::CompareField {
            left: self.clone(),
            op: CompareOp::Eq,
            right: other.clone(),
        }
    }

    pub fn is_null(&self) -> Phrase {
        Phrase::Null {
            field: self.clone(),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Phrase {
        Phrase::Null {
            field: self.clone(),
            negated: true,
        }
    }

    pub fn in_values<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Phrase {
        Phrase::In {
            field: self.clone(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Phrase {
        Phrase::Between {
            field: self.clone(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Geometric test: the point column lies within the circle of `radius`
    /// around `(x, y)`. Only PostgreSQL renders this natively.
    pub fn within_circle(&self, x: f64, y: f64, radius: f64) -> Phrase {
        Phrase::WithinCircle {
            field: self.clone(),
            center: (x, y),
            radius,
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Phrase {
        Phrase::Compare {
            field: self.clone(),
            op,
            value: value.into(),
        }
    }
}

/// Comparison operator in a condition node. Tokens are owned by the
/// rendering dialect, not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,
}

/// One node of a condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Phrase {
    /// `field <op> value`
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Value,
    },
    /// `left <op> right` over two columns.
    CompareField {
        left: FieldRef,
        op: CompareOp,
        right: FieldRef,
    },
    /// `field IN (values...)`
    In { field: FieldRef, values: Vec<Value> },
    /// `field BETWEEN low AND high`
    Between {
        field: FieldRef,
        low: Value,
        high: Value,
    },
    /// `field IS [NOT] NULL`
    Null { field: FieldRef, negated: bool },
    /// Point-in-circle containment (PostgreSQL geometry).
    WithinCircle {
        field: FieldRef,
        center: (f64, f64),
        radius: f64,
    },
    And(Box<Phrase>, Box<Phrase>),
    Or(Box<Phrase>, Box<Phrase>),
    Not(Box<Phrase>),
}

impl Phrase {
    pub fn and(self, other: Phrase) -> Phrase {
        Phrase::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Phrase) -> Phrase {
        Phrase::Or(Box::new(self), Box::new(other))
    }
}

impl std::ops::BitAnd for Phrase {
    type Output = Phrase;
    fn bitand(self, rhs: Phrase) -> Phrase {
        self.and(rhs)
    }
}

impl std::ops::BitOr for Phrase {
    type Output = Phrase;
    fn bitor(self, rhs: Phrase) -> Phrase {
        self.or(rhs)
    }
}

impl std::ops::Not for Phrase {
    type Output = Phrase;
    fn not(self) -> Phrase {
        Phrase::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_construction() {
        let f = FieldRef::new("authors", "id");
        let p = f.eq(5);
        assert_eq!(
            p,
            Phrase::Compare {
                field: f.clone(),
                op: CompareOp::Eq,
                value: Value::Int(5),
            }
        );
    }

    #[test]
    fn test_operator_overloads_nest() {
        let name = FieldRef::new("authors", "name");
        let id = FieldRef::new("authors", "id");
        let p = name.like("A%") & (id.gt(10) | id.is_null());

        let Phrase::And(left, right) = p else {
            panic!("expected And at root");
        };
        assert!(matches!(*left, Phrase::Compare { .. }));
        assert!(matches!(*right, Phrase::Or(_, _)));
    }

    #[test]
    fn test_negation() {
        let id = FieldRef::new("t", "id");
        let p = !id.eq(1);
        assert!(matches!(p, Phrase::Not(_)));
    }

    #[test]
    fn test_in_and_between() {
        let id = FieldRef::new("t", "id");
        let p = id.in_values([1, 2, 3]);
        let Phrase::In { values, .. } = p else {
            panic!("expected In");
        };
        assert_eq!(values.len(), 3);

        let p = id.between(1, 9);
        assert!(matches!(p, Phrase::Between { .. }));
    }

    #[test]
    fn test_field_to_field_comparison() {
        let a = FieldRef::new("posts", "author_id");
        let b = FieldRef::new("authors", "id");
        let p = a.eq_field(&b);
        assert!(matches!(p, Phrase::CompareField { op: CompareOp::Eq, .. }));
    }

    #[test]
    fn test_tree_knows_no_sql() {
        // The tree serializes structurally; nothing in it is dialect text.
        let p = FieldRef::new("t", "name").ilike("x%");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"op\":\"ILike\""));
        assert!(!json.contains("LOWER"));
    }
}
