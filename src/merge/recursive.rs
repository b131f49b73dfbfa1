//! Recursive structural merge of two rows.
//!
//! [`merge_recursive_custom`] walks every key of the conflict row:
//!
//! 1. **Absent or null** in the existing row → the conflict value is copied
//!    verbatim.
//! 2. **Both nested rows** and depth budget left → recurse one level down.
//! 3. **Leaf conflict** → the resolver decides. Without a resolver the
//!    existing value is wrapped in a list (unless it already is a row) and
//!    the conflict value is appended to it, so repeated conflicts accumulate
//!    in encounter order.
//!
//! Keys only present in the existing row are never touched.
//!
//! [`merge_preserving_distincts`] is the engine run with a bucket resolver at
//! depth 0, and [`merge`] is the plain overwrite merge.

use tracing::instrument;

use crate::model::{Bucket, Collection, Key, Row, Value};

/// A leaf conflict resolver: `(existing, conflict, key) -> merged`.
pub type Resolver<'a> = dyn FnMut(Value, Value, &Key) -> Value + 'a;

// ---------------------------------------------------------------------------
// merge_recursive_custom
// ---------------------------------------------------------------------------

/// Merge `conflict` into a copy of `existing`.
///
/// `max_depth` bounds recursion into nested rows: `None` is unbounded, `Some(0)`
/// resolves every conflict at this level.
#[instrument(skip_all, fields(existing = existing.len(), conflict = conflict.len(), max_depth = ?max_depth))]
pub fn merge_recursive_custom<E, C>(
    existing: &E,
    conflict: &C,
    resolver: Option<&mut Resolver<'_>>,
    max_depth: Option<usize>,
) -> Row
where
    E: Collection + ?Sized,
    C: Collection + ?Sized,
{
    merge_rows(existing.to_row(), conflict, resolver, max_depth)
}

fn merge_rows<C>(
    mut merged: Row,
    conflict: &C,
    mut resolver: Option<&mut Resolver<'_>>,
    max_depth: Option<usize>,
) -> Row
where
    C: Collection + ?Sized,
{
    for (key, conflict_value) in conflict.entries() {
        let Some(slot) = merged.get_mut(key).filter(|slot| !slot.is_null()) else {
            merged.insert(key.clone(), conflict_value.clone());
            continue;
        };

        if let Value::Row(conflict_row) = conflict_value
            && matches!(slot, Value::Row(_))
        {
            if max_depth.is_none_or(|depth| depth > 0)
                && let Value::Row(existing_row) = std::mem::take(slot)
            {
                *slot = Value::Row(merge_rows(
                    existing_row,
                    conflict_row,
                    resolver.as_deref_mut(),
                    max_depth.map(|depth| depth - 1),
                ));
                continue;
            }
            tracing::trace!(%key, "depth budget exhausted, resolving nested rows as leaves");
        }

        let existing_value = std::mem::take(slot);
        *slot = match resolver.as_deref_mut() {
            Some(resolve) => resolve(existing_value, conflict_value.clone(), key),
            None => append_conflict(existing_value, conflict_value.clone()),
        };
    }
    merged
}

/// Default leaf policy: accumulate both sides in a list.
fn append_conflict(existing: Value, conflict: Value) -> Value {
    let mut list = match existing {
        Value::Row(row) => row,
        other => Row::list([other]),
    };
    list.push(conflict);
    Value::Row(list)
}

// ---------------------------------------------------------------------------
// merge_preserving_distincts
// ---------------------------------------------------------------------------

/// Merge two rows, gathering both sides of every conflicting key in a
/// [`Bucket`].
///
/// Existing buckets are extended; conflict buckets are spliced in value by
/// value. Keys only present in `conflict` are copied verbatim, unlike
/// [`merge_in_column_buckets`](super::merge_in_column_buckets) which buckets
/// every key.
pub fn merge_preserving_distincts<E, C>(existing: &E, conflict: &C) -> Row
where
    E: Collection + ?Sized,
    C: Collection + ?Sized,
{
    let mut bucket_resolver = |existing: Value, conflict: Value, _key: &Key| {
        let mut bucket = match existing {
            Value::Bucket(bucket) => bucket,
            other => Bucket::from_values([other]),
        };
        match conflict {
            Value::Bucket(incoming) => {
                for (_, value) in incoming {
                    bucket.push(value);
                }
            }
            other => {
                bucket.push(other);
            }
        }
        Value::Bucket(bucket)
    };
    merge_recursive_custom(existing, conflict, Some(&mut bucket_resolver), Some(0))
}

// ---------------------------------------------------------------------------
// merge (plain)
// ---------------------------------------------------------------------------

/// Returns `true` unless the keys of `row` are exactly `0..n` in order.
#[must_use]
pub fn is_associative<C: Collection + ?Sized>(row: &C) -> bool {
    !row.entries()
        .zip(0_i64..)
        .all(|((key, _), i)| *key == Key::Int(i))
}

/// Plain recursive merge.
///
/// When `incoming` is associative its entries overwrite those of `base`,
/// recursing where both sides hold rows. When `incoming` is a list its values
/// are appended to `base` unless `base` already holds an identical value.
pub fn merge<B, I>(base: &B, incoming: &I) -> Row
where
    B: Collection + ?Sized,
    I: Collection + ?Sized,
{
    let mut merged = base.to_row();
    if is_associative(incoming) {
        for (key, value) in incoming.entries() {
            let nested = match (merged.get(key), value) {
                (Some(Value::Row(current)), Value::Row(next)) => Some(merge(current, next)),
                _ => None,
            };
            match nested {
                Some(row) => merged.insert(key.clone(), row),
                None => merged.insert(key.clone(), value.clone()),
            };
        }
    } else {
        for value in incoming.entries().map(|(_, v)| v) {
            let form = value.canonical();
            if !merged.values().any(|v| v.canonical() == form) {
                merged.push(value.clone());
            }
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn disjoint_rows_union() {
        let a = row! { "a" => 1, "b" => 2 };
        let b = row! { "c" => 3 };
        let merged = merge_recursive_custom(&a, &b, None, None);
        assert_eq!(merged, row! { "a" => 1, "b" => 2, "c" => 3 });
    }

    #[test]
    fn leaf_conflicts_accumulate_in_a_list() {
        let a = row! { "name" => "plop" };
        let b = row! { "name" => "plouf" };
        let c = row! { "name" => "plaf" };
        let ab = merge_recursive_custom(&a, &b, None, None);
        assert_eq!(ab, row! { "name" => Row::list(["plop", "plouf"]) });
        let abc = merge_recursive_custom(&ab, &c, None, None);
        assert_eq!(abc, row! { "name" => Row::list(["plop", "plouf", "plaf"]) });
    }

    #[test]
    fn nested_rows_recurse() {
        let a = row! { "meta" => row! { "x" => 1, "y" => 2 } };
        let b = row! { "meta" => row! { "y" => 3, "z" => 4 } };
        let merged = merge_recursive_custom(&a, &b, None, None);
        assert_eq!(
            merged,
            row! { "meta" => row! { "x" => 1, "y" => Row::list([2, 3]), "z" => 4 } }
        );
    }

    #[test]
    fn zero_depth_resolves_nested_rows_as_leaves() {
        let a = row! { "meta" => row! { "x" => 1 } };
        let b = row! { "meta" => row! { "x" => 2 } };
        let merged = merge_recursive_custom(&a, &b, None, Some(0));
        // The existing row is already a list-like container: the conflict row
        // is appended to it.
        assert_eq!(
            merged,
            row! { "meta" => row! { "x" => 1, 0 => row! { "x" => 2 } } }
        );
    }

    #[test]
    fn depth_budget_is_consumed_per_level() {
        let a = row! { "l1" => row! { "l2" => row! { "v" => 1 } } };
        let b = row! { "l1" => row! { "l2" => row! { "v" => 2 } } };
        let mut calls = Vec::new();
        let mut resolver = |e: Value, c: Value, key: &Key| {
            calls.push(key.clone());
            Value::Row(Row::list([e, c]))
        };
        let merged = merge_recursive_custom(&a, &b, Some(&mut resolver), Some(1));
        assert_eq!(calls, vec![Key::from("l2")]);
        assert_eq!(
            merged,
            row! { "l1" => row! { "l2" => Row::list([row! { "v" => 1 }, row! { "v" => 2 }]) } }
        );
    }

    #[test]
    fn resolver_sees_key_and_both_values() {
        let a = row! { "n" => 1, "m" => 10 };
        let b = row! { "n" => 2, "m" => 20, "k" => 5 };
        let mut sum = |e: Value, c: Value, _key: &Key| match (e, c) {
            (Value::Int(x), Value::Int(y)) => Value::Int(x + y),
            (_, c) => c,
        };
        let merged = merge_recursive_custom(&a, &b, Some(&mut sum), None);
        assert_eq!(merged, row! { "n" => 3, "m" => 30, "k" => 5 });
    }

    #[test]
    fn existing_only_keys_are_untouched() {
        let a = row! { "keep" => "me", "x" => 1 };
        let b = row! { "x" => 2 };
        let merged = merge_recursive_custom(&a, &b, None, None);
        assert_eq!(merged.get(&Key::from("keep")), Some(&Value::from("me")));
    }

    #[test]
    fn existing_null_is_overwritten() {
        let a = row! { "count" => Value::Null, "id" => 1 };
        let b = row! { "count" => 123 };
        let merged = merge_recursive_custom(&a, &b, None, None);
        assert_eq!(merged, row! { "count" => 123, "id" => 1 });

        let merged = merge_preserving_distincts(&a, &b);
        assert_eq!(merged, row! { "count" => 123, "id" => 1 });
    }

    #[test]
    fn preserving_distincts_buckets_conflicts_only() {
        let existing = row! {
            "entry_1" => "plop",
            4 => "lolo",
            "entry_2" => Row::list(["lolo"]),
        };
        let conflict = row! {
            "entry_1" => "plouf",
            4 => "lolo",
            "entry_2" => Row::list(["lala"]),
            "extra" => 1,
        };
        let merged = merge_preserving_distincts(&existing, &conflict);
        assert_eq!(
            merged,
            row! {
                "entry_1" => Bucket::from_values(["plop", "plouf"]),
                4 => Bucket::from_values(["lolo", "lolo"]),
                "entry_2" => Bucket::from_values([Row::list(["lolo"]), Row::list(["lala"])]),
                "extra" => 1,
            }
        );
    }

    #[test]
    fn preserving_distincts_extends_existing_buckets() {
        let existing = row! { "a" => Bucket::from_values([1, 2]) };
        let conflict = row! { "a" => Bucket::from_values([3, 4]) };
        let merged = merge_preserving_distincts(&existing, &conflict);
        assert_eq!(merged, row! { "a" => Bucket::from_values([1, 2, 3, 4]) });
    }

    #[test]
    fn plain_merge_overwrites_associative_entries() {
        let john = row! {
            "name" => "john",
            "children" => Row::list(["fred", "paul", "sally", "jane"]),
        };
        let mary = row! { "name" => "mary", "children" => Row::list(["jane"]) };
        let merged = merge(&john, &mary);
        assert_eq!(
            merged,
            row! {
                "name" => "mary",
                "children" => Row::list(["fred", "paul", "sally", "jane"]),
            }
        );
    }

    #[test]
    fn plain_merge_appends_new_list_values() {
        let merged = merge(&Row::list(["a", "b"]), &Row::list(["b", "c"]));
        assert_eq!(merged, Row::list(["a", "b", "c"]));
    }

    #[test]
    fn associativity_check() {
        assert!(!is_associative(&Row::list([1, 2])));
        assert!(!is_associative(&Row::new()));
        assert!(is_associative(&row! { 1 => "a" }));
        assert!(is_associative(&row! { "a" => 1 }));
    }
}
