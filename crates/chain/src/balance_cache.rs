//! # Balance Cache
//!
//! Memoizes the two registry-wide balance sums the epoch transition reads
//! repeatedly: total active balance and total balance with queue.
//!
//! Entries are keyed by `(epoch, latest_block_root)`. Both sums depend only on
//! effective balances and lifecycle epochs, which do not change within an
//! epoch for a given block root. Each map holds at most
//! [`MAX_CACHE_ENTRIES`] keys and evicts the oldest insertion first.
//!
//! One cache instance is owned by the node and shared by reference (or `Arc`)
//! with every state transition; there is no process-global cache.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::types::{Epoch, Gwei, Root};

pub const MAX_CACHE_ENTRIES: usize = 8;

pub type CacheKey = (Epoch, Root);

#[derive(Debug, Default)]
struct BoundedMap {
    entries: HashMap<CacheKey, Gwei>,
    order: VecDeque<CacheKey>,
}

impl BoundedMap {
    fn get(&self, key: &CacheKey) -> Option<Gwei> {
        self.entries.get(key).copied()
    }

    fn insert(&mut self, key: CacheKey, value: Gwei) {
        if self.entries.insert(key, value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > MAX_CACHE_ENTRIES {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    active: BoundedMap,
    with_queue: BoundedMap,
}

#[derive(Debug, Default)]
pub struct BalanceCache {
    inner: Mutex<CacheInner>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_balance(&self, key: &CacheKey) -> Option<Gwei> {
        self.inner.lock().active.get(key)
    }

    pub fn put_active_balance(&self, key: CacheKey, total: Gwei) {
        self.inner.lock().active.insert(key, total);
    }

    pub fn balance_with_queue(&self, key: &CacheKey) -> Option<Gwei> {
        self.inner.lock().with_queue.get(key)
    }

    pub fn put_balance_with_queue(&self, key: CacheKey, total: Gwei) {
        self.inner.lock().with_queue.insert(key, total);
    }

    /// Drop every entry. Used on reorgs and in tests.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.active.clear();
        inner.with_queue.clear();
    }

    /// Number of cached active-balance entries.
    pub fn len(&self) -> usize {
        self.inner.lock().active.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
