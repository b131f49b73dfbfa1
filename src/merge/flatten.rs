//! One-level flatten of a row of buckets.
//!
//! Typically applied to the result of extracting one column from many
//! bucketed rows: every bucket is spread into a single flat row.

use crate::error::ArrayError;
use crate::model::{Collection, Key, Row, Value};

/// Spread the buckets of `row` into one flat row.
///
/// - Non-bucket values are copied under their own key.
/// - Integer-labelled bucket values are appended positionally.
/// - String-labelled bucket values are inserted under their label.
///
/// Nested buckets inside bucket values are not flattened.
///
/// # Errors
/// Returns [`ArrayError::MergeConflict`] when a string label is already
/// present in the result.
pub fn flatten_merge_buckets<C: Collection + ?Sized>(row: &C) -> Result<Row, ArrayError> {
    let mut result = Row::new();
    for (key, value) in row.entries() {
        let Value::Bucket(bucket) = value else {
            result.insert(key.clone(), value.clone());
            continue;
        };
        for (label, element) in bucket.iter() {
            match label {
                Key::Int(_) => {
                    result.push(element.clone());
                }
                Key::Str(_) => {
                    if let Some(existing) = result.get(label) {
                        tracing::debug!(%label, "flatten found a colliding label");
                        return Err(ArrayError::MergeConflict {
                            key: label.clone(),
                            existing: existing.clone(),
                            conflict: element.clone(),
                        });
                    }
                    result.insert(label.clone(), element.clone());
                }
            }
        }
    }
    Ok(result)
}
