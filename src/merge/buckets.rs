//! Conflict-preserving merge into column buckets.
//!
//! [`merge_in_column_buckets`] turns every column of two rows into a
//! [`Bucket`]: the existing row's values are wrapped (unless they already are
//! buckets, which are kept as accumulators) and the conflict row's values are
//! appended. Keys present in only one row still end up bucketed.
//!
//! Folding N rows through it yields, per column, a bucket holding one value
//! per row that defined the column. Rows that lack the column contribute
//! nothing (no null padding). When labels are supplied each value is stored
//! under the label of the row it came from.

use tracing::instrument;

use crate::model::{Bucket, Collection, Key, Row, Value};

/// Merge two rows into per-column buckets.
///
/// `existing_label` tags values wrapped from `existing`; `conflict_label`
/// tags values appended from `conflict`. Without a label values are appended
/// positionally. A labelled append replaces whatever the label already held.
#[instrument(skip_all, fields(existing = existing.len(), conflict = conflict.len()))]
pub fn merge_in_column_buckets<E, C>(
    existing: &E,
    conflict: &C,
    existing_label: Option<&Key>,
    conflict_label: Option<&Key>,
) -> Row
where
    E: Collection + ?Sized,
    C: Collection + ?Sized,
{
    fold_into_column_buckets(existing.to_row(), conflict, existing_label, conflict_label)
}

/// Owned form of [`merge_in_column_buckets`]: consumes the accumulator row
/// instead of copying it, which is what a fold over many rows wants.
pub fn fold_into_column_buckets<C>(
    existing: Row,
    conflict: &C,
    existing_label: Option<&Key>,
    conflict_label: Option<&Key>,
) -> Row
where
    C: Collection + ?Sized,
{
    let mut merged = Row::new();
    for (column, value) in existing {
        let bucket = match value {
            Value::Bucket(bucket) => bucket,
            other => {
                let mut bucket = Bucket::new();
                bucket.put(existing_label, other);
                bucket
            }
        };
        merged.insert(column, bucket);
    }

    for (column, conflict_value) in conflict.entries() {
        let slot = merged.get_or_insert_with(column.clone(), || Value::Bucket(Bucket::new()));
        let Value::Bucket(bucket) = slot else {
            // Every column of `merged` was bucketed above.
            continue;
        };

        match conflict_value {
            Value::Bucket(incoming) => {
                for value in incoming.values() {
                    bucket.put(conflict_label, value.clone());
                }
            }
            other => bucket.put(conflict_label, other.clone()),
        }
    }

    tracing::debug!(columns = merged.len(), "merged rows into column buckets");
    merged
}
