// src/pool/blocking.rs
//! Blocking path (C5): `get_block` / `put_block`, a wait/signal handshake
//! on the shard currently most starved of objects.

use super::core::Pool;
use super::handle::Handle;
use crate::node::Pooled;

impl<T: Pooled + Send + 'static> Pool<T> {
    /// Acquires an object, suspending the caller when the shard is empty
    /// and the growth ceiling has been reached. Returns once another
    /// caller executes [`Pool::put_block`] and targets this shard, or
    /// immediately if a shard pop or fresh allocation succeeds (§4.5).
    pub fn get_block(&self) -> Handle<T> {
        let shard_idx = self.select_shard();
        let shard = &self.shards[shard_idx];

        if let Some(ptr) = shard.pop() {
            return self.claim(ptr);
        }
        if self.reserve_growth_slot() {
            return self.allocate();
        }

        shard.mark_blocked();
        let mut guard = shard.wait_lock().lock().unwrap();
        loop {
            if let Some(ptr) = shard.pop() {
                shard.mark_unblocked();
                drop(guard);
                return self.claim(ptr);
            }
            guard = shard.wait_cond().wait(guard).unwrap();
        }
    }

    /// Runs the cleaner, then publishes `handle` onto whichever shard
    /// currently has the most callers suspended in `get_block` (ties
    /// broken by lowest index), and wakes one of them (§4.5 step 2–4).
    ///
    /// Targeting the most-starved shard and waking only one waiter means a
    /// producer racing with many concurrent `put_block` calls can starve a
    /// previously-selected shard's waiters; §9 explicitly leaves fairness
    /// beyond this to a layer on top.
    pub fn put_block(&self, mut handle: Handle<T>) {
        (self.config.cleaner)(&mut handle);
        let ptr = handle.into_raw();

        let shard_idx = self.most_blocked_shard();
        let shard = &self.shards[shard_idx];

        let guard = shard.wait_lock().lock().unwrap();
        unsafe { shard.push(ptr) };
        shard.wait_cond().notify_one();
        drop(guard);
    }

    pub(super) fn most_blocked_shard(&self) -> usize {
        let mut best_idx = 0;
        let mut best_count = self.shards[0].blocked_count();
        for (idx, shard) in self.shards.iter().enumerate().skip(1) {
            let count = shard.blocked_count();
            if count > best_count {
                best_count = count;
                best_idx = idx;
            }
        }
        best_idx
    }
}
