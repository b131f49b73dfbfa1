//! Post-merge cleaning passes.
//!
//! The usual pipeline is merge → [`clean_merge_duplicates`] →
//! [`clean_merge_buckets`]: the first pass deduplicates buckets and collapses
//! those left with a single value, the second turns remaining buckets into
//! plain rows. Both skip the columns listed in
//! [`CleanOptions::excluded_columns`].

use serde::Deserialize;

use crate::model::{Collection, Key, Row, Value};

/// Options shared by the cleaning passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanOptions {
    /// Columns left exactly as they are.
    #[serde(default)]
    pub excluded_columns: Vec<Key>,
}

impl CleanOptions {
    /// Options excluding `columns`.
    pub fn excluding<I, K>(columns: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            excluded_columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    fn is_excluded(&self, column: &Key) -> bool {
        self.excluded_columns.contains(column)
    }
}

/// Replace every bucket with its plain row form.
///
/// Labels become keys; unlabelled values stay positional. Non-bucket values
/// and excluded columns pass through.
pub fn clean_merge_buckets<C: Collection + ?Sized>(row: &C, options: &CleanOptions) -> Row {
    let mut out = Row::new();
    for (column, value) in row.entries() {
        let cleaned = match value {
            Value::Bucket(bucket) if !options.is_excluded(column) => {
                Value::Row(bucket.clone().into_row())
            }
            other => other.clone(),
        };
        out.insert(column.clone(), cleaned);
    }
    out
}

/// Deduplicate every bucket and collapse those holding a single distinct
/// value into that value.
///
/// Buckets with several distinct values stay buckets (deduplicated) for
/// [`clean_merge_buckets`] to flatten afterwards.
pub fn clean_merge_duplicates<C: Collection + ?Sized>(row: &C, options: &CleanOptions) -> Row {
    let mut out = Row::new();
    let mut collapsed = 0_usize;
    for (column, value) in row.entries() {
        let cleaned = match value {
            Value::Bucket(bucket) if !options.is_excluded(column) => {
                let distinct = bucket.unique();
                if distinct.len() == 1 {
                    collapsed += 1;
                    distinct.into_iter().next().map(|(_, v)| v).unwrap_or_default()
                } else {
                    Value::Bucket(distinct)
                }
            }
            other => other.clone(),
        };
        out.insert(column.clone(), cleaned);
    }
    tracing::debug!(collapsed, "collapsed single-valued buckets");
    out
}
