//! Deterministic group identifiers.
//!
//! [`generate_group_id`] derives a string naming the group a row belongs to
//! from a list of [`GroupDefinition`]s. Each definition contributes one
//! `part_name → value` pair; parts are sorted by name before rendering so the
//! identifier does not depend on the order definitions were given in. Names
//! spelling an integer sort numerically, ahead of the other names.
//!
//! Rendering of a part value:
//!
//! | value   | rendered as                 |
//! |---------|-----------------------------|
//! | row     | `array_<crc32>`             |
//! | bucket  | `Bucket_<crc32>`            |
//! | object  | `<TypeName>_<crc32>`        |
//! | `true`  | `1`                         |
//! | `false`, null | empty string          |
//! | other   | its natural string form     |
//!
//! The hash is the CRC32 of the value's canonical form, as 8 lowercase hex
//! digits.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ArrayError;
use crate::model::{Collection, Key, Row, Value};

/// Computes a group value from a row. `None` leaves the part out of the id.
pub type DeriveFn = Arc<dyn Fn(&Row) -> Option<Value> + Send + Sync>;

// ---------------------------------------------------------------------------
// GroupBy / GroupDefinition
// ---------------------------------------------------------------------------

/// Where a group part takes its value from.
#[derive(Clone)]
pub enum GroupBy {
    /// The value of a named column. The part is named after the column.
    Column(String),
    /// The value of a numbered column. The part is named after the index.
    Index(i64),
    /// A value computed from the row, under a caller-chosen part name.
    Derived {
        /// Part name. Must be stable across calls and non-empty.
        label: String,
        /// The computation.
        derive: DeriveFn,
    },
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Self::Index(index) => f.debug_tuple("Index").field(index).finish(),
            Self::Derived { label, .. } => f
                .debug_struct("Derived")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

/// One rule contributing a part to a group id.
#[derive(Clone, Debug)]
pub struct GroupDefinition {
    /// Prepended to the part name as `<prefix>_`.
    pub prefix: Option<String>,
    /// The source of the part value.
    pub by: GroupBy,
}

impl GroupDefinition {
    /// Group by a named column.
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            by: GroupBy::Column(name.into()),
        }
    }

    /// Group by a numbered column.
    #[must_use]
    pub const fn index(index: i64) -> Self {
        Self {
            prefix: None,
            by: GroupBy::Index(index),
        }
    }

    /// Group by a value computed from the row.
    pub fn derived<F>(label: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&Row) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            prefix: None,
            by: GroupBy::Derived {
                label: label.into(),
                derive: Arc::new(derive),
            },
        }
    }

    /// Set the part-name prefix.
    #[must_use]
    pub fn prefixed(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn part_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}_{name}"),
            None => name.to_owned(),
        }
    }
}

impl From<&str> for GroupDefinition {
    fn from(name: &str) -> Self {
        Self::column(name)
    }
}

impl From<String> for GroupDefinition {
    fn from(name: String) -> Self {
        Self::column(name)
    }
}

impl From<i64> for GroupDefinition {
    fn from(index: i64) -> Self {
        Self::index(index)
    }
}

impl From<i32> for GroupDefinition {
    fn from(index: i32) -> Self {
        Self::index(i64::from(index))
    }
}

impl TryFrom<&Value> for GroupDefinition {
    type Error = ArrayError;

    /// Strings name columns, integers number them; anything else is rejected.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(name) if !name.is_empty() => Ok(Self::column(name.clone())),
            Value::Int(index) => Ok(Self::index(*index)),
            other => Err(ArrayError::InvalidGroupDefinition {
                definition: other.to_string(),
            }),
        }
    }
}

impl FromStr for GroupDefinition {
    type Err = ArrayError;

    /// Parse `[prefix=]column` where a canonical integer column is an index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, column) = match s.split_once('=') {
            Some((prefix, column)) => (Some(prefix), column),
            None => (None, s),
        };
        if column.is_empty() || prefix.is_some_and(str::is_empty) {
            return Err(ArrayError::InvalidGroupDefinition {
                definition: format!("{s:?}"),
            });
        }
        let definition = match Key::parse(column) {
            Key::Int(index) => Self::index(index),
            Key::Str(name) => Self::column(name),
        };
        Ok(match prefix {
            Some(prefix) => definition.prefixed(prefix),
            None => definition,
        })
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Separators used when rendering a group id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupIdOptions {
    /// Between a part name and its value (default `":"`).
    #[serde(default = "default_key_value_separator")]
    pub key_value_separator: String,
    /// Between parts (default `"-"`).
    #[serde(default = "default_groups_separator")]
    pub groups_separator: String,
}

impl Default for GroupIdOptions {
    fn default() -> Self {
        Self {
            key_value_separator: default_key_value_separator(),
            groups_separator: default_groups_separator(),
        }
    }
}

fn default_key_value_separator() -> String {
    ":".to_owned()
}

fn default_groups_separator() -> String {
    "-".to_owned()
}

impl GroupIdOptions {
    /// Effective separators: empty strings fall back to the defaults.
    fn separators(&self) -> (&str, &str) {
        let kv = if self.key_value_separator.is_empty() {
            ":"
        } else {
            &self.key_value_separator
        };
        let groups = if self.groups_separator.is_empty() {
            "-"
        } else {
            &self.groups_separator
        };
        (kv, groups)
    }
}

// ---------------------------------------------------------------------------
// generate_group_id
// ---------------------------------------------------------------------------

/// CRC32 of the canonical form of `value`, as 8 lowercase hex digits.
#[must_use]
pub fn content_hash(value: &Value) -> String {
    format!("{:08x}", crc32fast::hash(value.canonical().as_bytes()))
}

fn render(value: &Value) -> String {
    match value {
        Value::Row(_) => format!("array_{}", content_hash(value)),
        Value::Bucket(_) => format!("Bucket_{}", content_hash(value)),
        Value::Object(o) => format!("{}_{}", o.type_name, content_hash(value)),
        scalar => scalar.scalar_string().unwrap_or_default(),
    }
}

fn column_value<C: Collection + ?Sized>(row: &C, column: Key) -> Result<Value, ArrayError> {
    row.get(&column)
        .cloned()
        .ok_or_else(|| ArrayError::UndefinedColumn {
            column,
            row: Value::Row(row.to_row()),
        })
}

/// Identify the group `row` belongs to.
///
/// # Errors
/// Returns [`ArrayError::UndefinedColumn`] when a column definition names a
/// column `row` lacks, and [`ArrayError::InvalidGroupDefinition`] for a
/// derived definition with an empty label.
pub fn generate_group_id<C: Collection + ?Sized>(
    row: &C,
    definitions: &[GroupDefinition],
    options: &GroupIdOptions,
) -> Result<String, ArrayError> {
    let mut materialized: Option<Row> = None;
    let mut parts: BTreeMap<Key, Value> = BTreeMap::new();

    for definition in definitions {
        let (part_name, value) = match &definition.by {
            GroupBy::Column(name) => (
                definition.part_name(name),
                column_value(row, Key::parse(name))?,
            ),
            GroupBy::Index(index) => (
                definition.part_name(&index.to_string()),
                column_value(row, Key::Int(*index))?,
            ),
            GroupBy::Derived { label, derive } => {
                if label.is_empty() {
                    return Err(ArrayError::InvalidGroupDefinition {
                        definition: format!("{:?}", definition.by),
                    });
                }
                let plain = materialized.get_or_insert_with(|| row.to_row());
                let Some(value) = (derive.as_ref())(plain) else {
                    tracing::trace!(%label, "derived group part excluded");
                    continue;
                };
                (definition.part_name(label), value)
            }
        };
        parts.insert(Key::from(part_name), value);
    }

    let (kv_separator, groups_separator) = options.separators();
    let id = parts
        .iter()
        .map(|(name, value)| format!("{name}{kv_separator}{}", render(value)))
        .collect::<Vec<_>>()
        .join(groups_separator);
    tracing::trace!(%id, "generated group id");
    Ok(id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bucket, Object};
    use crate::row;

    fn sample() -> Row {
        row! {
            "col_1" => 12,
            "col_2" => "abc",
            0 => "zero",
            3 => true,
        }
    }

    fn id(definitions: &[GroupDefinition]) -> Result<String, ArrayError> {
        generate_group_id(&sample(), definitions, &GroupIdOptions::default())
    }

    #[test]
    fn single_column() {
        assert_eq!(id(&["col_1".into()]).unwrap(), "col_1:12");
    }

    #[test]
    fn order_independent() {
        let a = id(&["col_1".into(), "col_2".into()]).unwrap();
        let b = id(&["col_2".into(), "col_1".into()]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "col_1:12-col_2:abc");
    }

    #[test]
    fn missing_column_fails() {
        let err = id(&["nope".into()]).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::UndefinedColumn { ref column, .. } if *column == Key::from("nope")
        ));
        assert!(matches!(
            id(&[GroupDefinition::index(9)]),
            Err(ArrayError::UndefinedColumn { .. })
        ));
    }

    #[test]
    fn index_columns_and_prefixes() {
        assert_eq!(id(&[0.into()]).unwrap(), "0:zero");
        assert_eq!(id(&[3.into()]).unwrap(), "3:1");
        assert_eq!(
            id(&[GroupDefinition::column("col_2").prefixed("p")]).unwrap(),
            "p_col_2:abc"
        );
    }

    #[test]
    fn integer_part_names_sort_numerically() {
        let row = row! { 9 => "a", 10 => "b", "x" => "c" };
        let out = generate_group_id(
            &row,
            &["x".into(), 10.into(), 9.into()],
            &GroupIdOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "9:a-10:b-x:c");
    }

    #[test]
    fn derived_parts() {
        let doubled = GroupDefinition::derived("double", |row: &Row| {
            match row.get(&Key::from("col_1")) {
                Some(Value::Int(n)) => Some(Value::Int(n * 2)),
                _ => None,
            }
        });
        let skipped = GroupDefinition::derived("skipped", |_: &Row| None);
        assert_eq!(
            id(&[doubled, skipped, "col_2".into()]).unwrap(),
            "col_2:abc-double:24"
        );
    }

    #[test]
    fn derived_needs_a_label() {
        let unnamed = GroupDefinition::derived("", |_: &Row| Some(Value::Null));
        assert!(matches!(
            id(&[unnamed]),
            Err(ArrayError::InvalidGroupDefinition { .. })
        ));
    }

    #[test]
    fn structured_values_are_hashed() {
        let row = row! {
            "list" => Row::list([1, 2]),
            "bucket" => Bucket::from_values([1, 2]),
            "money" => Object::new("Money", row! { "cents" => 5 }),
        };
        let out = generate_group_id(
            &row,
            &["list".into(), "bucket".into(), "money".into()],
            &GroupIdOptions::default(),
        )
        .unwrap();
        let list_hash = content_hash(&Value::Row(Row::list([1, 2])));
        let bucket_hash = content_hash(&Value::Bucket(Bucket::from_values([1, 2])));
        assert_ne!(list_hash, bucket_hash);
        assert!(out.contains(&format!("list:array_{list_hash}")));
        assert!(out.contains(&format!("bucket:Bucket_{bucket_hash}")));
        assert!(out.contains("money:Money_"));
        assert_eq!(list_hash.len(), 8);
    }

    #[test]
    fn custom_and_empty_separators() {
        let defs: Vec<GroupDefinition> = vec!["col_1".into(), "col_2".into()];
        let custom = GroupIdOptions {
            key_value_separator: "=".to_owned(),
            groups_separator: "|".to_owned(),
        };
        assert_eq!(
            generate_group_id(&sample(), &defs, &custom).unwrap(),
            "col_1=12|col_2=abc"
        );
        let empty = GroupIdOptions {
            key_value_separator: String::new(),
            groups_separator: String::new(),
        };
        assert_eq!(
            generate_group_id(&sample(), &defs, &empty).unwrap(),
            "col_1:12-col_2:abc"
        );
    }

    #[test]
    fn definitions_from_values() {
        assert!(GroupDefinition::try_from(&Value::from("a")).is_ok());
        assert!(GroupDefinition::try_from(&Value::Int(2)).is_ok());
        let err = GroupDefinition::try_from(&Value::Bool(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad value provided for group id generation: true"
        );
    }

    #[test]
    fn definitions_from_strings() {
        let def: GroupDefinition = "p=col_1".parse().unwrap();
        assert_eq!(def.prefix.as_deref(), Some("p"));
        assert!(matches!(def.by, GroupBy::Column(ref c) if c == "col_1"));
        let def: GroupDefinition = "4".parse().unwrap();
        assert!(matches!(def.by, GroupBy::Index(4)));
        assert!("".parse::<GroupDefinition>().is_err());
        assert!("=x".parse::<GroupDefinition>().is_err());
    }

    #[test]
    fn content_hash_is_stable() {
        let value = Value::Row(row! { "a" => Row::list(["x", "y"]) });
        assert_eq!(content_hash(&value), content_hash(&value.clone()));
    }
}
