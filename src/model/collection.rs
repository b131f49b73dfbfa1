//! The [`Collection`] capability.
//!
//! The merge engine, the cleaners and group-id generation accept anything
//! that can be counted, iterated in order and looked up by key. [`Row`],
//! [`Bucket`] and [`Chain`](crate::chain::Chain) implement it.

use super::bucket::Bucket;
use super::key::Key;
use super::row::Row;
use super::value::Value;
use crate::error::ArrayError;

/// Countable, iterable, keyed-accessible collection of values.
pub trait Collection {
    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&Key, &Value)> + '_>;

    /// Value at `key`.
    fn get(&self, key: &Key) -> Option<&Value>;

    /// Returns `true` if `key` is present, even when its value is null.
    fn key_exists(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Materialize the entries as a plain [`Row`].
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        for (key, value) in self.entries() {
            row.insert(key.clone(), value.clone());
        }
        row
    }
}

impl Collection for Row {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&Key, &Value)> + '_> {
        Box::new(self.iter())
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        Self::get(self, key)
    }

    fn to_row(&self) -> Row {
        self.clone()
    }
}

impl Collection for Bucket {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&Key, &Value)> + '_> {
        Box::new(self.iter())
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        self.as_row().get(key)
    }

    fn to_row(&self) -> Row {
        self.as_row().clone()
    }
}

/// View `value` as a collection.
///
/// # Errors
/// Returns [`ArrayError::TypeMismatch`] unless `value` is a row or a bucket.
pub fn as_collection(value: &Value) -> Result<&dyn Collection, ArrayError> {
    match value {
        Value::Row(row) => Ok(row),
        Value::Bucket(bucket) => Ok(bucket),
        other => Err(ArrayError::TypeMismatch {
            value: other.clone(),
        }),
    }
}

/// Returns `true` if `key` exists in `collection`.
pub fn key_exists<C: Collection + ?Sized>(key: &Key, collection: &C) -> bool {
    collection.key_exists(key)
}
