//! Conflict-preserving row merges and deterministic group ids.
//!
//! The library merges ordered key→value rows without losing conflicting
//! values: conflicts are gathered in [`Bucket`](model::Bucket)s that later
//! cleaning passes collapse back into plain values. It also derives stable
//! group identifiers from column, index and derived definitions.
//!
//! ```
//! use rowmerge::merge::{CleanOptions, clean_merge_buckets, merge_in_column_buckets};
//! use rowmerge::model::Row;
//! use rowmerge::row;
//!
//! let merged = merge_in_column_buckets(
//!     &row! { "name" => "plop" },
//!     &row! { "name" => "plouf" },
//!     None,
//!     None,
//! );
//! let clean = clean_merge_buckets(&merged, &CleanOptions::default());
//! assert_eq!(clean, row! { "name" => Row::list(["plop", "plouf"]) });
//! ```
//!
//! The `rowmerge` binary exposes the same operations over JSON files.

pub mod chain;
pub mod config;
pub mod error;
pub mod group;
pub mod merge;
pub mod model;
pub mod numeric;
pub mod telemetry;
pub mod unique;

pub use error::ArrayError;
