//! Record collections as they live on the medium.
//!
//! A collection is a JSON array of objects. Each object carries the
//! application's fields plus an optional `isDirty` flag owned by the cache.

mod codec;
mod equality;
mod filter;

pub use codec::{decode_collection, encode_collection, EMPTY_COLLECTION};
pub use equality::{objects_equal, values_equal};
pub use filter::{filter_records, matches_predicate};
