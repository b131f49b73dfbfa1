//! Ordered key→value rows.
//!
//! A [`Row`] keeps its entries in insertion order. Overwriting an existing
//! key keeps that entry's position; [`Row::push`] appends under the next free
//! integer key, which is one past the largest integer key the row has ever
//! held (or `0`).
//!
//! Lookups are linear. Rows handled by the merge engine are records, not
//! tables, so a handful of entries is the common case.

use super::key::Key;
use super::value::Value;

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// An ordered mapping from [`Key`] to [`Value`] with unique keys.
#[derive(Clone, Debug, Default)]
pub struct Row {
    entries: Vec<(Key, Value)>,
    next_index: i64,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
        }
    }

    /// Create a list-like row: values keyed `0..n`.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut row = Self::new();
        for value in values {
            row.push(value);
        }
        row
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the row has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Value stored at `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Mutable access to the value stored at `key`.
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        let i = self.position(key)?;
        Some(&mut self.entries[i].1)
    }

    /// Returns `true` if `key` is present (even when its value is null).
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.position(key).is_some()
    }

    /// Insert or overwrite `key`. Overwriting keeps the entry's position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(i) = self.position(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        if let Key::Int(n) = key
            && n >= self.next_index
        {
            self.next_index = n.saturating_add(1);
        }
        self.entries.push((key, value));
        None
    }

    /// Append `value` under the next free integer key and return that key.
    pub fn push(&mut self, value: impl Into<Value>) -> Key {
        let key = Key::Int(self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        self.entries.push((key.clone(), value.into()));
        key
    }

    /// Remove `key`, returning its value. Later pushes do not reuse the index.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        let i = self.position(key)?;
        Some(self.entries.remove(i).1)
    }

    /// Return the value at `key`, inserting `default()` at the end first if
    /// the key is absent.
    pub fn get_or_insert_with(&mut self, key: Key, default: impl FnOnce() -> Value) -> &mut Value {
        let i = match self.position(&key) {
            Some(i) => i,
            None => {
                self.insert(key, default());
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate entries in order with mutable values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Key, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// The first value, in order.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.entries.first().map(|(_, v)| v)
    }

    /// Returns `true` when the keys are exactly `0, 1, …, n-1` in order.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .zip(0_i64..)
            .all(|((k, _), i)| *k == Key::Int(i))
    }
}

/// Equality by key: two rows are equal when they hold the same keys mapped to
/// equal values, whatever the entry order.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl<K: Into<Key>, V: Into<Value>> Extend<(K, V)> for Row {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Row {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a Key, &'a Value);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (Key, Value)>,
        fn(&'a (Key, Value)) -> (&'a Key, &'a Value),
    >;

    fn into_iter(self) -> Self::IntoIter {
        let split: fn(&'a (Key, Value)) -> (&'a Key, &'a Value) = |(k, v)| (k, v);
        self.entries.iter().map(split)
    }
}

/// Build a [`Row`] from `key => value` pairs.
///
/// ```
/// use rowmerge::row;
///
/// let r = row! { "entry_1" => "plop", 4 => "lolo" };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::model::Row::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::model::Row::new();
        $( row.insert($key, $value); )+
        row
    }};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_uses_next_integer_key() {
        let mut row = Row::new();
        row.insert("name", "x");
        row.insert(5, 1);
        assert_eq!(row.push(2), Key::Int(6));
        assert_eq!(row.push(3), Key::Int(7));
    }

    #[test]
    fn push_on_empty_row_starts_at_zero() {
        let mut row = Row::new();
        assert_eq!(row.push("a"), Key::Int(0));
        assert!(row.is_list());
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut row = row! { "a" => 1, "b" => 2, "c" => 3 };
        let old = row.insert("b", 20);
        assert_eq!(old, Some(Value::Int(2)));
        let keys: Vec<String> = row.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(row.get(&Key::from("b")), Some(&Value::Int(20)));
    }

    #[test]
    fn removed_index_is_not_reused() {
        let mut row = Row::list([1, 2]);
        row.remove(&Key::Int(1));
        assert_eq!(row.push(3), Key::Int(2));
        assert!(!row.is_list());
    }

    #[test]
    fn null_values_still_count_as_present() {
        let row = row! { "count" => Value::Null };
        assert!(row.contains_key(&Key::from("count")));
        assert_eq!(row.get(&Key::from("count")), Some(&Value::Null));
    }

    #[test]
    fn equality_ignores_entry_order() {
        let a = row! { "x" => 1, "y" => 2 };
        let b = row! { "y" => 2, "x" => 1 };
        assert_eq!(a, b);
        assert_ne!(a, row! { "x" => 1 });
    }

    #[test]
    fn get_or_insert_with_appends_missing_key() {
        let mut row = row! { "a" => 1 };
        *row.get_or_insert_with(Key::from("b"), || Value::Int(0)) = Value::Int(9);
        *row.get_or_insert_with(Key::from("a"), || Value::Int(0)) = Value::Int(5);
        assert_eq!(row, row! { "a" => 5, "b" => 9 });
    }
}
