//! Data model: keys, values, rows, buckets and the collection capability.

pub mod bucket;
pub mod collection;
pub mod key;
pub mod row;
pub mod value;

pub use bucket::Bucket;
pub use collection::{Collection, as_collection, key_exists};
pub use key::Key;
pub use row::Row;
pub use value::{Object, Value};
