//! Values stored in rows and buckets.
//!
//! [`Value`] is the dynamically typed cell of a [`Row`]. Besides scalars it
//! can hold a nested row, a [`Bucket`] accumulated by a merge, or an opaque
//! [`Object`].
//!
//! # Renderings
//!
//! - `Display` / `Serialize`: natural JSON. List-like rows and buckets become
//!   arrays, other rows become objects. Used in error messages and CLI output.
//! - [`Value::canonical`]: a type-tagged text form that distinguishes every
//!   structural difference (int vs float, row vs bucket, key kinds, order).
//!   Used for deduplication and group-id hashing.

use std::fmt::{self, Write as _};

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::bucket::Bucket;
use super::key::Key;
use super::row::Row;

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// An opaque value with a type name.
///
/// Objects are carried through merges untouched. Group ids render them as
/// `<type_name>_<hash>`; `sum` accepts them only when they expose a numeric
/// coercion.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    /// Name of the object's type, e.g. `"Money"`.
    pub type_name: String,
    /// Public fields, in declaration order.
    pub fields: Row,
    number: Option<f64>,
}

impl Object {
    /// Create an object without numeric coercion.
    pub fn new(type_name: impl Into<String>, fields: Row) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
            number: None,
        }
    }

    /// Attach a numeric coercion to this object.
    #[must_use]
    pub const fn with_number(mut self, number: f64) -> Self {
        self.number = Some(number);
        self
    }

    /// The object's numeric coercion, if it has one.
    #[must_use]
    pub const fn to_number(&self) -> Option<f64> {
        self.number
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically typed cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Row(Row),
    Bucket(Bucket),
    Object(Object),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for null, booleans, numbers and strings.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// The nested row, if this value is one.
    #[must_use]
    pub const fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// The bucket, if this value is one.
    #[must_use]
    pub const fn as_bucket(&self) -> Option<&Bucket> {
        match self {
            Self::Bucket(bucket) => Some(bucket),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Row(_) => "row",
            Self::Bucket(_) => "bucket",
            Self::Object(o) => &o.type_name,
        }
    }

    /// The type-tagged canonical text form of this value.
    ///
    /// Two values have the same canonical form exactly when they are
    /// structurally identical, including entry order and key kinds.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Self::Null => out.write_str("N;"),
            Self::Bool(b) => write!(out, "b:{};", u8::from(*b)),
            Self::Int(n) => write!(out, "i:{n};"),
            Self::Float(x) => write!(out, "d:{x:?};"),
            Self::Str(s) => write!(out, "s:{}:{s:?};", s.len()),
            Self::Row(row) => {
                out.push('a');
                write_canonical_entries(row, out);
                Ok(())
            }
            Self::Bucket(bucket) => {
                out.push('B');
                write_canonical_entries(bucket.as_row(), out);
                Ok(())
            }
            Self::Object(o) => {
                let _ = write!(out, "O:{}:{:?}", o.type_name.len(), o.type_name);
                write_canonical_entries(&o.fields, out);
                match o.number {
                    Some(x) => write!(out, "#{x:?};"),
                    None => out.write_str(";"),
                }
            }
        };
    }

    /// The natural string form used in group ids: null and `false` render
    /// empty, `true` renders `1`, numbers and strings render as themselves.
    ///
    /// Returns `None` for rows, buckets and objects, which are hashed instead.
    #[must_use]
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(false) => Some(String::new()),
            Self::Bool(true) => Some("1".to_owned()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(x) => Some(x.to_string()),
            Self::Str(s) => Some(s.clone()),
            Self::Row(_) | Self::Bucket(_) | Self::Object(_) => None,
        }
    }
}

fn write_canonical_entries(row: &Row, out: &mut String) {
    let _ = write!(out, ":{}:{{", row.len());
    for (key, value) in row {
        let _ = match key {
            Key::Int(n) => write!(out, "i:{n};"),
            Key::Str(s) => write!(out, "s:{}:{s:?};", s.len()),
        };
        value.write_canonical(out);
    }
    out.push('}');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Self::Row(row)
    }
}

impl From<Bucket> for Value {
    fn from(bucket: Bucket) -> Self {
        Self::Bucket(bucket)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

fn serialize_row<S: Serializer>(row: &Row, serializer: S) -> Result<S::Ok, S::Error> {
    if row.is_list() {
        let mut seq = serializer.serialize_seq(Some(row.len()))?;
        for value in row.values() {
            seq.serialize_element(value)?;
        }
        seq.end()
    } else {
        let mut map = serializer.serialize_map(Some(row.len()))?;
        for (key, value) in row {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_row(self, serializer)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Row(row) => serialize_row(row, serializer),
            Self::Bucket(bucket) => serialize_row(bucket.as_row(), serializer),
            Self::Object(o) => serialize_row(&o.fields, serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut row = Row::new();
        while let Some(value) = seq.next_element::<Value>()? {
            row.push(value);
        }
        Ok(Value::Row(row))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut row = Row::new();
        while let Some((key, value)) = map.next_entry::<Key, Value>()? {
            row.insert(key, value);
        }
        Ok(Value::Row(row))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Row(row) => Ok(row),
            other => Err(de::Error::custom(format!(
                "expected a JSON array or object, found {}",
                other.type_name()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
