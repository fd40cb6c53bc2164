//! Fixed-capacity, append-optimized concurrent map
//!
//! `ArrayMap` is built for workloads where keys are inserted far more often
//! than they are updated, and read far more often than either. It trades
//! memory for speed: the bucket array is sized as a multiple of the expected
//! number of keys, so most operations touch a single bucket head and nothing
//! else.
//!
//! # Features
//!
//! - **Lock-Free Reads**: `get` never takes a bucket lock
//! - **Per-Bucket Inserts**: Only a first insert into a bucket is serialized,
//!   and only against other first inserts into the same bucket
//! - **Fixed Capacity**: No resizing, no rehashing, no deletion
//! - **Pluggable Hashing**: Any `Fn(&K) -> u32`, FNV for string-like keys by default
//!
//! # Example
//!
//! ```rust
//! use arraymap::ArrayMap;
//!
//! let map = ArrayMap::new(2).unwrap();
//!
//! map.set("a", 1);
//! map.set("b", 2);
//! assert_eq!(map.get(&"b"), Some(2));
//! assert_eq!(map.get(&"z"), None);
//!
//! // Updating an existing key does not change the count
//! map.set("a", 4);
//! assert_eq!(map.count(), 2);
//! ```
//!
//! Keys that are not byte-like need a hasher:
//!
//! ```rust
//! use arraymap::{fold32, ArrayMap};
//!
//! let map = ArrayMap::with_hasher(100, fold32::<u64>).unwrap();
//! map.mset((0..100u64).map(|i| (i, i * 2)));
//! assert_eq!(map.count(), 100);
//! ```

#![warn(missing_docs)]

mod error;
mod hash;
mod map;
mod stats;

pub use error::{Error, Result};
pub use hash::{fnv32, fnv32_key, fold32};
pub use map::{ArrayMap, Iter};
pub use stats::ChainStats;

/// Over-provisioning multiplier applied to the expected key count.
///
/// With one bucket per key more than a quarter of the buckets end up holding
/// two or more entries; at five buckets per key that drops below two percent.
pub const CAPACITY_FACTOR: usize = 5;
