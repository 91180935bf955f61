// src/pool/core.rs
//! Pool core (C4): `get` / `put` / `get_n` / `put_n`, allocator/cleaner
//! dispatch, and growth accounting. See [`crate::pool::blocking`] for the
//! blocking variants and [`crate::pool::eviction`] for the background
//! cleaner.

use super::config::PoolConfig;
use super::handle::Handle;
use crate::error::Result;
use crate::node::Pooled;
use crate::selector::default_worker_id;
use crate::shard::Shard;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// A sharded, lock-free recycling pool for `T`.
///
/// Construct with [`Pool::new`] (no cleanup, no growth cap) or
/// [`Pool::new_with_config`] for the full set of options, then share it
/// across workers behind an `Arc`.
///
/// # Example
///
/// ```
/// use shardpool::{Pool, PoolLinks, Pooled};
///
/// struct Conn {
///     links: PoolLinks<Conn>,
///     id: u32,
/// }
/// impl Pooled for Conn {
///     fn pool_links(&self) -> &PoolLinks<Self> {
///         &self.links
///     }
/// }
///
/// let pool = Pool::new(
///     || Conn { links: PoolLinks::new(), id: 0 },
///     |c: &mut Conn| c.id = 0,
/// );
///
/// let mut h = pool.get().unwrap();
/// h.id = 42;
/// pool.put(h);
/// ```
pub struct Pool<T: Pooled + Send + 'static> {
    pub(super) shards: Arc<Vec<Shard<T>>>,
    pub(super) current_length: Arc<AtomicI64>,
    pub(super) config: PoolConfig<T>,
    /// `(stopped, notify)` pair the background cleaner waits on: a timed
    /// wait that wakes early and exits as soon as `close()` sets `stopped`
    /// and notifies, instead of finishing out its current interval (§4.7).
    pub(super) shutdown: Arc<(Mutex<bool>, Condvar)>,
    pub(super) cleaner_handle: Mutex<Option<JoinHandle<()>>>,
    pub(super) closed: AtomicBool,
}

impl<T: Pooled + Send + 'static> Pool<T> {
    /// Creates a pool with no cleanup and no growth cap — the permissive
    /// default. Equivalent to `new_pool` in §6.
    pub fn new<A, C>(allocator: A, cleaner: C) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
        C: Fn(&mut T) + Send + Sync + 'static,
    {
        Self::new_with_config(PoolConfig::new(allocator, cleaner))
            .expect("permissive default config is always valid")
    }

    /// Creates a pool from an explicit [`PoolConfig`], validating it first
    /// (§4.7 / §7). Spawns the background cleaner when `config.cleanup`
    /// is enabled.
    pub fn new_with_config(config: PoolConfig<T>) -> Result<Self> {
        config.validate()?;

        let shard_count = config.resolved_shard_count();
        let shards = Arc::new((0..shard_count).map(|_| Shard::new()).collect());

        let pool = Self {
            shards,
            current_length: Arc::new(AtomicI64::new(0)),
            shutdown: Arc::new((Mutex::new(false), Condvar::new())),
            cleaner_handle: Mutex::new(None),
            closed: AtomicBool::new(false),
            config,
        };

        if pool.config.cleanup.enabled {
            let handle = super::eviction::spawn_cleaner(&pool);
            *pool.cleaner_handle.lock().unwrap() = Some(handle);
        }

        Ok(pool)
    }

    #[inline]
    pub(super) fn select_shard(&self) -> usize {
        let id = match &self.config.worker_affinity {
            Some(f) => f(),
            None => default_worker_id(),
        };
        id % self.shards.len()
    }

    /// Wraps a freshly-popped or freshly-allocated pointer as a `Handle`,
    /// having already bumped its usage count and cleared `next` (§4.4
    /// step 2: "clear `obj.next`, `obj.increment_usage()`").
    pub(super) fn claim(&self, ptr: *mut T) -> Handle<T> {
        unsafe {
            (*ptr).pool_links().store_next(ptr::null_mut());
            (*ptr).pool_links().increment_usage();
            Handle::new(Box::from_raw(ptr), self.current_length.clone())
        }
    }

    /// Returns `true` (and bumps `current_length`) if the growth policy has
    /// room for one more distinct object.
    pub(super) fn reserve_growth_slot(&self) -> bool {
        if !self.config.growth.enable {
            self.current_length.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        loop {
            let current = self.current_length.load(Ordering::Relaxed);
            if current >= self.config.growth.max_pool_size {
                return false;
            }
            if self
                .current_length
                .compare_exchange_weak(current, current + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub(super) fn allocate(&self) -> Handle<T> {
        let obj = (self.config.allocator)();
        let boxed = Box::into_raw(Box::new(obj));
        self.claim(boxed)
    }

    /// Acquires an object, allocating a fresh one on a shard miss if the
    /// growth policy allows it. Never blocks (§4.4, §5).
    pub fn get(&self) -> Option<Handle<T>> {
        let shard = &self.shards[self.select_shard()];
        if let Some(ptr) = shard.pop() {
            return Some(self.claim(ptr));
        }
        if self.reserve_growth_slot() {
            Some(self.allocate())
        } else {
            None
        }
    }

    /// Calls [`Pool::get`] `n` times, preserving `None` entries when the
    /// growth policy is exhausted.
    pub fn get_n(&self, n: usize) -> Vec<Option<Handle<T>>> {
        (0..n).map(|_| self.get()).collect()
    }

    /// Runs the cleaner on `handle`, then pushes it back onto a shard.
    /// Putting the same object twice is undefined behavior (§4.4); this
    /// implementation does not attempt to detect it.
    pub fn put(&self, mut handle: Handle<T>) {
        (self.config.cleaner)(&mut handle);
        let ptr = handle.into_raw();
        let shard = &self.shards[self.select_shard()];
        unsafe { shard.push(ptr) };
    }

    /// Calls [`Pool::put`] for every `Some` entry; `None` entries (from a
    /// growth-limited `get_n`) are skipped.
    pub fn put_n(&self, seq: impl IntoIterator<Item = Option<Handle<T>>>) {
        for item in seq.into_iter().flatten() {
            self.put(item);
        }
    }

    /// Current count of distinct `T` instances the pool has observed
    /// (allocations minus drops) — the only observability this pool
    /// provides beyond the operations themselves (§1 Non-goals).
    pub fn len(&self) -> i64 {
        self.current_length.load(Ordering::Relaxed)
    }

    /// `true` when the pool has observed no outstanding or resident
    /// objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PoolLinks;
    use crate::pool::config::GrowthPolicy;

    struct Item {
        links: PoolLinks<Item>,
        value: u32,
    }

    impl Pooled for Item {
        fn pool_links(&self) -> &PoolLinks<Self> {
            &self.links
        }
    }

    fn single_shard_pool() -> Pool<Item> {
        let mut cfg = PoolConfig::new(|| Item { links: PoolLinks::new(), value: 0 }, |i: &mut Item| i.value = 0);
        cfg.shard_count_override = Some(1);
        Pool::new_with_config(cfg).unwrap()
    }

    #[test]
    fn put_then_get_returns_same_object_usage_incremented_once() {
        let pool = single_shard_pool();
        let mut h1 = pool.get().unwrap();
        h1.value = 99;
        let addr1 = &*h1 as *const Item;
        assert_eq!(h1.usage_count(), 1);
        pool.put(h1);

        let h2 = pool.get().unwrap();
        let addr2 = &*h2 as *const Item;
        assert_eq!(addr1, addr2);
        assert_eq!(h2.usage_count(), 2);
        assert_eq!(h2.value, 0, "cleaner must have reset value before re-get");
    }

    #[test]
    fn growth_ceiling_blocks_further_allocation_then_recovers() {
        let mut cfg = PoolConfig::new(|| Item { links: PoolLinks::new(), value: 0 }, |_: &mut Item| {});
        cfg.growth = GrowthPolicy::bounded(2);
        let pool = Pool::new_with_config(cfg).unwrap();

        let a = pool.get().unwrap();
        let _b = pool.get().unwrap();
        let c = pool.get();
        assert!(c.is_none());

        let a_addr = &*a as *const Item;
        pool.put(a);
        let d = pool.get().unwrap();
        assert_eq!(&*d as *const Item, a_addr);
    }

    #[test]
    fn dropping_handle_without_put_decrements_current_length() {
        let pool = single_shard_pool();
        let h = pool.get().unwrap();
        assert_eq!(pool.len(), 1);
        drop(h);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn get_n_preserves_length_and_none_on_exhaustion() {
        let mut cfg = PoolConfig::new(|| Item { links: PoolLinks::new(), value: 0 }, |_: &mut Item| {});
        cfg.growth = GrowthPolicy::bounded(2);
        let pool = Pool::new_with_config(cfg).unwrap();

        let results = pool.get_n(3);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_some());
        assert!(results[1].is_some());
        assert!(results[2].is_none());
    }

    #[test]
    fn put_n_returns_every_some_entry() {
        let pool = single_shard_pool();
        let seq = pool.get_n(3);
        assert_eq!(pool.len(), 3);
        pool.put_n(seq);
        // All three objects are back on the single shard.
        let again = pool.get_n(3);
        assert!(again.iter().all(Option::is_some));
    }
}
