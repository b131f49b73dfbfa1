//! First-occurrence deduplication.
//!
//! [`unique`] keeps the first entry holding each distinct value, with its
//! original key, in original order. Scalars compare the way they would as
//! row keys: integers, integral floats, booleans and strings spelling a
//! canonical integer share one numeric identity, and null equals the empty
//! string. Rows, buckets and objects compare by their canonical form, so two
//! structurally equal values are duplicates even when they were built
//! separately.

use std::collections::HashSet;

use crate::model::{Collection, Key, Row, Value};

/// The identity two values must share to count as duplicates.
fn identity(value: &Value) -> String {
    match value {
        Value::Int(n) => format!("n:{n}"),
        Value::Bool(b) => format!("n:{}", u8::from(*b)),
        Value::Str(s) => match Key::parse(s) {
            Key::Int(n) => format!("n:{n}"),
            Key::Str(_) => value.canonical(),
        },
        Value::Null => Value::Str(String::new()).canonical(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        Value::Float(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => format!("n:{}", *x as i64),
        other => other.canonical(),
    }
}

/// Copy of `collection` keeping only the first occurrence of each value.
pub fn unique<C: Collection + ?Sized>(collection: &C) -> Row {
    let mut seen = HashSet::new();
    let mut out = Row::new();
    for (key, value) in collection.entries() {
        if seen.insert(identity(value)) {
            out.insert(key.clone(), value.clone());
        }
    }
    tracing::trace!(
        before = collection.len(),
        after = out.len(),
        "deduplicated collection"
    );
    out
}
