//! Merge buckets.
//!
//! A [`Bucket`] accumulates the values that several rows hold for the same
//! column. Values are appended positionally or under an explicit label (the
//! name of the row they came from). A bucket never collapses by itself:
//! collapsing is done by [`Bucket::reduce_if_unique`] or by the cleaners in
//! [`crate::merge::clean`].

use super::key::Key;
use super::row::Row;
use super::value::Value;
use crate::unique::unique;

/// An ordered, optionally labelled multi-value accumulator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bucket(Row);

impl Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub const fn new() -> Self {
        Self(Row::new())
    }

    /// Create a bucket holding `values` positionally.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(Row::list(values))
    }

    /// Number of accumulated values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a value positionally.
    pub fn push(&mut self, value: impl Into<Value>) -> Key {
        self.0.push(value)
    }

    /// Store a value under `label`, replacing whatever the label held.
    pub fn insert_labelled(&mut self, label: impl Into<Key>, value: impl Into<Value>) {
        self.0.insert(label, value);
    }

    /// Append under `label` when given, positionally otherwise.
    pub fn put(&mut self, label: Option<&Key>, value: impl Into<Value>) {
        match label {
            Some(label) => self.insert_labelled(label, value),
            None => {
                self.push(value);
            }
        }
    }

    /// Iterate `(label, value)` pairs in accumulation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.0.iter()
    }

    /// Iterate values in accumulation order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Borrow the underlying row.
    #[must_use]
    pub const fn as_row(&self) -> &Row {
        &self.0
    }

    /// Plain row form: labels become keys, unlabelled values stay positional.
    #[must_use]
    pub fn into_row(self) -> Row {
        self.0
    }

    /// A copy keeping only the first occurrence of each distinct value.
    #[must_use]
    pub fn unique(&self) -> Self {
        Self(unique(&self.0))
    }

    /// The single distinct value this bucket holds, if there is exactly one.
    #[must_use]
    pub fn reduce_if_unique(&self) -> Option<Value> {
        let distinct = unique(&self.0);
        if distinct.len() == 1 {
            distinct.first().cloned()
        } else {
            None
        }
    }
}

impl From<Row> for Bucket {
    fn from(row: Row) -> Self {
        Self(row)
    }
}

impl<V: Into<Value>> FromIterator<V> for Bucket {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Self::from_values(iter)
    }
}

impl IntoIterator for Bucket {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
