//! Bucket array with per-bucket collision chains.
//!
//! # Architecture
//! - **Buckets**: Fixed array of atomic chain heads (null-initialized), sized
//!   `capacity * factor` once and never resized.
//! - **Locks**: One mutex per bucket, parallel to the bucket array. Taken only
//!   when a key is appended to a chain for the first time.
//! - **Nodes**: Singly linked, prepended at the head. A node's `next` is set
//!   before the node is published and never changes afterwards, so readers
//!   walk chains without any lock.
//! - **Values**: Each node keeps its value behind its own `RwLock`, so updates
//!   to an existing key skip the bucket lock but never tear a value.

use core::fmt;
use core::mem;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};
use std::collections::HashMap;
use std::hash::Hash;

use log::{debug, trace};
use parking_lot::{Mutex, RwLock};
use portable_atomic::AtomicU64;

use crate::error::{Error, Result};
use crate::hash::fnv32_key;
use crate::stats::ChainStats;
use crate::CAPACITY_FACTOR;

/// Entry in a collision chain.
struct Node<K, V> {
    key: K,
    value: RwLock<V>,
    next: *const Node<K, V>,
}

/// Fixed-capacity concurrent map for append-mostly workloads.
///
/// # Type Parameters
///
/// - `K`: Key type, compared with `Eq`
/// - `V`: Value type
/// - `H`: Hashing function `Fn(&K) -> u32`, FNV over the key bytes by default
pub struct ArrayMap<K, V, H = fn(&K) -> u32> {
    buckets: Box<[AtomicPtr<Node<K, V>>]>,
    locks: Box<[Mutex<()>]>,
    count: AtomicU64,
    factor: usize,
    hasher: H,
}

impl<K, V> ArrayMap<K, V>
where
    K: AsRef<[u8]> + Eq,
{
    /// Creates a map for about `capacity` distinct string-like keys.
    ///
    /// Allocates `capacity * CAPACITY_FACTOR` buckets and hashes keys with
    /// [`fnv32_key`].
    ///
    /// # Examples
    ///
    /// ```
    /// use arraymap::ArrayMap;
    ///
    /// let map: ArrayMap<String, u32> = ArrayMap::new(128).unwrap();
    /// assert_eq!(map.capacity(), 640);
    /// assert!(ArrayMap::<String, u32>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, fnv32_key::<K>)
    }
}

impl<K, V, H> ArrayMap<K, V, H>
where
    K: Eq,
    H: Fn(&K) -> u32,
{
    /// Creates a map for about `capacity` distinct keys using `hasher`.
    pub fn with_hasher(capacity: usize, hasher: H) -> Result<Self> {
        Self::with_factor_and_hasher(capacity, CAPACITY_FACTOR, hasher)
    }

    /// Creates a map with `capacity * factor` buckets using `hasher`.
    ///
    /// Fails with [`Error::InvalidConfiguration`] if either number is zero or
    /// their product overflows.
    pub fn with_factor_and_hasher(capacity: usize, factor: usize, hasher: H) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration("capacity must be positive"));
        }
        if factor == 0 {
            return Err(Error::InvalidConfiguration(
                "capacity factor must be positive",
            ));
        }
        let len = capacity
            .checked_mul(factor)
            .ok_or(Error::InvalidConfiguration("bucket count overflows usize"))?;

        let buckets = (0..len).map(|_| AtomicPtr::new(ptr::null_mut())).collect();
        let locks = (0..len).map(|_| Mutex::new(())).collect();
        debug!(
            "arraymap: allocated {} buckets for capacity {} (factor {})",
            len, capacity, factor
        );

        Ok(Self {
            buckets,
            locks,
            count: AtomicU64::new(0),
            factor,
            hasher,
        })
    }

    #[inline(always)]
    fn bucket_idx(&self, key: &K) -> usize {
        (self.hasher)(key) as usize % self.buckets.len()
    }

    /// Walks a chain from `current` until `stop`, returning the node holding `key`.
    #[inline]
    fn find(
        &self,
        mut current: *const Node<K, V>,
        stop: *const Node<K, V>,
        key: &K,
    ) -> Option<&Node<K, V>> {
        while current != stop {
            // SAFETY: nodes live until the map is dropped and their `next`
            // was written before they were published.
            let node = unsafe { &*current };
            if node.key == *key {
                return Some(node);
            }
            current = node.next;
        }
        None
    }

    /// Returns a clone of the value stored for `key`.
    ///
    /// Takes no bucket lock. An insert racing with this call may or may not
    /// be observed.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let bucket = self.buckets.get(self.bucket_idx(key))?;
        let head = bucket.load(Ordering::Acquire);
        self.find(head, ptr::null(), key)
            .map(|node| node.value.read().clone())
    }

    /// Returns true if the map contains `key`.
    pub fn has(&self, key: &K) -> bool {
        match self.buckets.get(self.bucket_idx(key)) {
            Some(bucket) => {
                let head = bucket.load(Ordering::Acquire);
                self.find(head, ptr::null(), key).is_some()
            }
            None => false,
        }
    }

    /// Inserts or updates `key`.
    ///
    /// Updating an existing key only locks that entry's value and returns the
    /// previous value. A new key takes its bucket's lock, is prepended to the
    /// chain and bumps [`count`](Self::count); `None` is returned.
    pub fn set(&self, key: K, value: V) -> Option<V> {
        let idx = self.bucket_idx(&key);
        let bucket = self.buckets.get(idx)?;

        // 1. Update in place, no bucket lock.
        let head = bucket.load(Ordering::Acquire) as *const Node<K, V>;
        if let Some(node) = self.find(head, ptr::null(), &key) {
            return Some(mem::replace(&mut *node.value.write(), value));
        }

        // 2. Append under the bucket lock.
        let _guard = self.locks[idx].lock();
        let current = bucket.load(Ordering::Acquire) as *const Node<K, V>;

        // Nodes prepended since the unlocked scan may hold our key.
        if let Some(node) = self.find(current, head, &key) {
            return Some(mem::replace(&mut *node.value.write(), value));
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        let node = Box::into_raw(Box::new(Node {
            key,
            value: RwLock::new(value),
            next: current,
        }));
        bucket.store(node, Ordering::Release);
        trace!(
            "arraymap: appended to bucket {} (collision: {})",
            idx,
            !current.is_null()
        );

        None
    }

    /// Sets every pair from `pairs`, one at a time.
    ///
    /// Not atomic: concurrent readers may observe part of the batch.
    pub fn mset<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    /// Returns the number of distinct keys inserted so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed) as usize
    }

    /// Returns true if no key was ever inserted.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the over-provisioning factor the map was built with.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Get the hashing function itself.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns an iterator over the map entries.
    /// Yields (K, V) clones.
    pub fn iter(&self) -> Iter<'_, K, V, H> {
        Iter {
            map: self,
            bucket_idx: 0,
            current: ptr::null(),
        }
    }

    /// Snapshots every entry into a `HashMap`.
    ///
    /// Writes that happen while the snapshot is taken may or may not show up.
    pub fn items(&self) -> HashMap<K, V>
    where
        K: Hash + Clone,
        V: Clone,
    {
        self.iter().collect()
    }

    /// Measures chain lengths across all buckets.
    pub fn chain_stats(&self) -> ChainStats {
        let mut stats = ChainStats::new(self.buckets.len());
        for bucket in self.buckets.iter() {
            let mut len = 0;
            let mut current = bucket.load(Ordering::Acquire) as *const Node<K, V>;
            while !current.is_null() {
                len += 1;
                // SAFETY: see `find`.
                current = unsafe { (*current).next };
            }
            stats.record(len);
        }
        stats
    }
}

/// Iterator over ArrayMap entries.
pub struct Iter<'a, K, V, H> {
    map: &'a ArrayMap<K, V, H>,
    bucket_idx: usize,
    current: *const Node<K, V>,
}

impl<'a, K, V, H> Iterator for Iter<'a, K, V, H>
where
    K: Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.current.is_null() {
                // SAFETY: the borrowed map keeps every node alive.
                let node = unsafe { &*self.current };
                self.current = node.next;
                return Some((node.key.clone(), node.value.read().clone()));
            }

            let bucket = self.map.buckets.get(self.bucket_idx)?;
            self.bucket_idx += 1;
            self.current = bucket.load(Ordering::Acquire) as *const Node<K, V>;
        }
    }
}

impl<'a, K, V, H> IntoIterator for &'a ArrayMap<K, V, H>
where
    K: Eq + Clone,
    V: Clone,
    H: Fn(&K) -> u32,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, H> Extend<(K, V)> for ArrayMap<K, V, H>
where
    K: Eq,
    H: Fn(&K) -> u32,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.mset(iter);
    }
}

impl<K, V, H> fmt::Debug for ArrayMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayMap")
            .field("buckets", &self.buckets.len())
            .field("factor", &self.factor)
            .field("count", &self.count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// SAFETY: the map owns every node; moving it moves all keys and values.
unsafe impl<K: Send, V: Send, H: Send> Send for ArrayMap<K, V, H> {}
// SAFETY: shared access moves keys and values in from any thread and clones
// them out; values are only touched through their RwLock.
unsafe impl<K: Send + Sync, V: Send + Sync, H: Sync> Sync for ArrayMap<K, V, H> {}

impl<K, V, H> Drop for ArrayMap<K, V, H> {
    fn drop(&mut self) {
        for bucket in self.buckets.iter_mut() {
            let mut current = *bucket.get_mut();
            while !current.is_null() {
                // SAFETY: every node was leaked from a Box on insert and is
                // reachable from exactly one bucket.
                let node = unsafe { Box::from_raw(current) };
                current = node.next as *mut Node<K, V>;
            }
        }
    }
}
