//! Error types for row operations.
//!
//! [`ArrayError`] is the single error type returned by the merge engine, the
//! bucket cleaners, the flattener, the numeric helpers and group-id
//! generation. Variants carry the offending values so callers can report
//! them without re-rendering anything.

use thiserror::Error;

use crate::model::{Key, Value};

/// Errors returned by `rowmerge` operations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ArrayError {
    /// A value was expected to be a collection (row or bucket) but was not.
    #[error("a value must be a collection (row or bucket) instead of: {value}")]
    TypeMismatch {
        /// The value that was provided.
        value: Value,
    },

    /// A group definition or column extraction referenced a missing column.
    #[error("column `{column}` is not defined in row: {row}")]
    UndefinedColumn {
        /// The missing column.
        column: Key,
        /// The row that lacked it.
        row: Value,
    },

    /// A group definition could not be interpreted.
    #[error("bad value provided for group id generation: {definition}")]
    InvalidGroupDefinition {
        /// Rendering of the rejected definition.
        definition: String,
    },

    /// Flattening found two values claiming the same named key.
    #[error(
        "conflict during flatten merge for key `{key}` between existing {existing} and conflict {conflict}"
    )]
    MergeConflict {
        /// The colliding key.
        key: Key,
        /// Value already present in the flattened result.
        existing: Value,
        /// Incoming bucket element.
        conflict: Value,
    },

    /// A value could not be coerced to a number.
    #[error("cannot sum {reason} (partial sum {partial}): {value}")]
    NumericCoercion {
        /// Why the coercion failed.
        reason: String,
        /// The running total when the bad operand was met.
        partial: String,
        /// The offending value.
        value: Value,
    },

    /// `weighted_mean` was given different numbers of values and weights.
    #[error("different number of values ({values}) and weights ({weights}) for weighted mean")]
    WeightCountMismatch {
        /// Number of values.
        values: usize,
        /// Number of weights.
        weights: usize,
    },
}
