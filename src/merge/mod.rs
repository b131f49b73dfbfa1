//! Merge engine.
//!
//! - **recursive**: structural merge of two rows with a pluggable leaf
//!   resolver ([`merge_recursive_custom`]), its bucketing specialization
//!   ([`merge_preserving_distincts`]) and the plain overwrite [`merge`].
//! - **buckets**: conflict-preserving merge where every column becomes a
//!   [`Bucket`](crate::model::Bucket) ([`merge_in_column_buckets`]).
//! - **clean**: passes collapsing buckets back into plain values.
//! - **flatten**: spreading a row of buckets into one flat row.
//!
//! # Determinism
//!
//! Every operation is a pure function of its inputs: the same rows always
//! produce the same output, in the same entry order.

pub mod buckets;
pub mod clean;
pub mod flatten;
pub mod recursive;


pub use buckets::{fold_into_column_buckets, merge_in_column_buckets};
pub use clean::{CleanOptions, clean_merge_buckets, clean_merge_duplicates};
pub use flatten::flatten_merge_buckets;
pub use recursive::{
    Resolver, is_associative, merge, merge_preserving_distincts, merge_recursive_custom,
};
