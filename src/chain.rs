//! Chainable wrapper over a [`Row`].
//!
//! [`Chain`] gives a fluent API over a row of rows: extract a column, group
//! rows by id, merge groups preserving conflicts, deduplicate. It implements
//! [`Collection`], so everything in [`crate::merge`] and
//! [`crate::group`] accepts it directly.

use crate::error::ArrayError;
use crate::group::{GroupDefinition, GroupIdOptions, generate_group_id};
use crate::merge::fold_into_column_buckets;
use crate::model::{Collection, Key, Row, Value, as_collection};
use crate::numeric::{Number, sum};
use crate::unique::unique;

/// A fluent wrapper around a [`Row`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chain {
    data: Row,
}

impl Chain {
    /// Wrap `data`.
    #[must_use]
    pub const fn new(data: Row) -> Self {
        Self { data }
    }

    /// Borrow the wrapped row.
    #[must_use]
    pub const fn as_row(&self) -> &Row {
        &self.data
    }

    /// Unwrap into the plain row.
    #[must_use]
    pub fn into_row(self) -> Row {
        self.data
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.data.iter()
    }

    /// Append `other`: string keys overwrite, integer keys are renumbered and
    /// appended.
    #[must_use]
    pub fn merge_with<C: Collection + ?Sized>(mut self, other: &C) -> Self {
        for (key, value) in other.entries() {
            if key.is_int() {
                self.data.push(value.clone());
            } else {
                self.data.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// Extract `column` from every row, keeping the outer keys.
    ///
    /// # Errors
    /// Returns [`ArrayError::TypeMismatch`] for entries that are not rows and
    /// [`ArrayError::UndefinedColumn`] for rows lacking the column.
    pub fn column(&self, column: impl Into<Key>) -> Result<Self, ArrayError> {
        let column = column.into();
        let mut out = Row::new();
        for (key, value) in &self.data {
            let row = as_collection(value)?;
            let Some(cell) = row.get(&column) else {
                return Err(ArrayError::UndefinedColumn {
                    column,
                    row: value.clone(),
                });
            };
            out.insert(key.clone(), cell.clone());
        }
        Ok(Self::new(out))
    }

    /// Split entries into rows keyed by `group_of(value, key)`, keeping each
    /// entry's key inside its group.
    #[must_use]
    pub fn group_in_arrays<F>(self, mut group_of: F) -> Self
    where
        F: FnMut(&Value, &Key) -> Key,
    {
        let mut out = Row::new();
        for (key, value) in self.data {
            let group = group_of(&value, &key);
            let slot = out.get_or_insert_with(group, || Value::Row(Row::new()));
            if let Value::Row(members) = slot {
                members.insert(key, value);
            }
        }
        Self::new(out)
    }

    /// Group rows by [`generate_group_id`], keeping each row's key inside
    /// its group.
    ///
    /// # Errors
    /// Fails like [`generate_group_id`], or with
    /// [`ArrayError::TypeMismatch`] for entries that are not rows.
    pub fn group_by(
        &self,
        definitions: &[GroupDefinition],
        options: &GroupIdOptions,
    ) -> Result<Self, ArrayError> {
        let mut out = Row::new();
        for (key, value) in &self.data {
            let id = generate_group_id(as_collection(value)?, definitions, options)?;
            let slot = out.get_or_insert_with(Key::from(id), || Value::Row(Row::new()));
            if let Value::Row(members) = slot {
                members.insert(key.clone(), value.clone());
            }
        }
        Ok(Self::new(out))
    }

    /// Group rows by [`generate_group_id`] and merge the rows of each group
    /// into column buckets.
    ///
    /// A group with a single row keeps the row as is.
    ///
    /// # Errors
    /// Fails like [`Chain::group_by`].
    pub fn group_merging(
        &self,
        definitions: &[GroupDefinition],
        options: &GroupIdOptions,
    ) -> Result<Self, ArrayError> {
        let mut out = Row::new();
        for (_, value) in &self.data {
            let row = as_collection(value)?;
            let id = Key::from(generate_group_id(row, definitions, options)?);
            match out.get_mut(&id) {
                Some(slot) => {
                    if let Value::Row(existing) = std::mem::take(slot) {
                        *slot = Value::Row(fold_into_column_buckets(existing, row, None, None));
                    }
                }
                None => {
                    out.insert(id, row.to_row());
                }
            }
        }
        tracing::debug!(groups = out.len(), rows = self.data.len(), "merged rows by group");
        Ok(Self::new(out))
    }

    /// Keep the first occurrence of each distinct value.
    #[must_use]
    pub fn unique(&self) -> Self {
        Self::new(unique(&self.data))
    }

    /// Total of the values.
    ///
    /// # Errors
    /// See [`crate::numeric::sum`].
    pub fn sum(&self) -> Result<Number, ArrayError> {
        sum(&self.data)
    }
}

impl From<Row> for Chain {
    fn from(data: Row) -> Self {
        Self::new(data)
    }
}

impl Collection for Chain {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&Key, &Value)> + '_> {
        Box::new(self.data.iter())
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        self.data.get(key)
    }

    fn to_row(&self) -> Row {
        self.data.clone()
    }
}
