//! Metadata filter predicates evaluated against `Meta` maps.
//!
//! Supports equality and set membership on scalar fields, composed with
//! `All` (AND) and `Any` (OR). Predicates are validated before use; a
//! malformed predicate is an `InvalidInput` and is never retried.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{Meta, MetaValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every entry.
    True,
    /// Field present and equal to the value.
    Eq(String, MetaValue),
    /// Field present and contained in the value set.
    In(String, Vec<MetaValue>),
    /// All sub-predicates match. `All(vec![])` matches everything.
    All(Vec<Predicate>),
    /// At least one sub-predicate matches.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Predicate::Eq(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<String>, values: Vec<MetaValue>) -> Self {
        Predicate::In(field.into(), values)
    }

    /// AND-combine with another predicate, flattening nested `All`s and
    /// skipping `True` so injected tenant filters do not pile up wrappers.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::All(mut left), Predicate::All(right)) => {
                left.extend(right);
                Predicate::All(left)
            }
            (Predicate::All(mut left), p) => {
                left.push(p);
                Predicate::All(left)
            }
            (p, Predicate::All(mut right)) => {
                right.insert(0, p);
                Predicate::All(right)
            }
            (a, b) => Predicate::All(vec![a, b]),
        }
    }

    pub fn matches(&self, meta: &Meta) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Eq(field, value) => meta.get(field) == Some(value),
            Predicate::In(field, values) => {
                meta.get(field).map(|v| values.contains(v)).unwrap_or(false)
            }
            Predicate::All(preds) => preds.iter().all(|p| p.matches(meta)),
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(meta)),
        }
    }

    /// Structural validation. Empty field names, empty `In` sets and empty
    /// `Any` branches can never match anything and are treated as caller
    /// bugs rather than silently returning no results.
    pub fn validate(&self) -> Result<()> {
        match self {
            Predicate::True => Ok(()),
            Predicate::Eq(field, _) => {
                if field.is_empty() {
                    return Err(EngineError::InvalidInput("empty predicate field".to_string()));
                }
                Ok(())
            }
            Predicate::In(field, values) => {
                if field.is_empty() {
                    return Err(EngineError::InvalidInput("empty predicate field".to_string()));
                }
                if values.is_empty() {
                    return Err(EngineError::InvalidInput(format!(
                        "empty In set for field '{}'",
                        field
                    )));
                }
                Ok(())
            }
            Predicate::All(preds) => preds.iter().try_for_each(Predicate::validate),
            Predicate::Any(preds) => {
                if preds.is_empty() {
                    return Err(EngineError::InvalidInput("empty Any predicate".to_string()));
                }
                preds.iter().try_for_each(Predicate::validate)
            }
        }
    }
}
