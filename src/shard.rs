// src/shard.rs
//! A single lock-free LIFO stack of free objects, cache-line padded.
//!
//! Push and pop never block; the mutex/condvar pair here exists solely to
//! support the blocking handshake in [`crate::pool::blocking`] and is never
//! touched by the non-blocking `get`/`put` path.

use crate::node::Pooled;
use crossbeam::utils::CachePadded;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};

/// One shard: an intrusive Treiber stack plus the wait/signal machinery used
/// by the blocking path.
///
/// Each field is independently cache-padded so that adjacent shards placed
/// next to each other in a `Vec<Shard<T>>` never share a cache line — the
/// whole point of sharding is to keep unrelated cores from bouncing the same
/// line back and forth.
pub(crate) struct Shard<T: Pooled> {
    head: CachePadded<AtomicPtr<T>>,
    wait_lock: CachePadded<Mutex<()>>,
    wait_cond: Condvar,
    blocked: CachePadded<AtomicU64>,
}

// Raw pointers to T cross shards between threads by construction; Pooled
// values are required to be Send by the pool that owns the shards.
unsafe impl<T: Pooled + Send> Send for Shard<T> {}
unsafe impl<T: Pooled + Send> Sync for Shard<T> {}

impl<T: Pooled> Shard<T> {
    pub(crate) fn new() -> Self {
        Self {
            head: CachePadded::new(AtomicPtr::new(ptr::null_mut())),
            wait_lock: CachePadded::new(Mutex::new(())),
            wait_cond: Condvar::new(),
            blocked: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Pushes `obj` onto the top of this shard's free list.
    ///
    /// # Safety
    ///
    /// `obj` must be a live, uniquely-owned pointer (typically just taken
    /// from `Box::into_raw`) that is not currently reachable from any
    /// shard's list.
    pub(crate) unsafe fn push(&self, obj: *mut T) {
        loop {
            let old = self.head.load(Ordering::Acquire);
            // Safe: `obj` is exclusively owned by the caller until the CAS
            // below publishes it; nothing else can be reading its `next`.
            unsafe { (*obj).pool_links().store_next(old) };
            match self
                .head
                .compare_exchange_weak(old, obj, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(_) => continue,
            }
        }
    }

    /// Pops the top of this shard's free list, if any. Never blocks.
    ///
    /// The returned pointer's `next` field is left untouched; the caller is
    /// responsible for clearing it before treating the object as "held by a
    /// caller" (§4.4 step 2 of the design).
    pub(crate) fn pop(&self) -> Option<*mut T> {
        loop {
            let old = self.head.load(Ordering::Acquire);
            if old.is_null() {
                return None;
            }
            // Safe: `old` was loaded from `head` and has not been freed —
            // popped objects are only reclaimed by `close()`'s drain, which
            // the caller must not race with `get`/`put`.
            let next = unsafe { (*old).pool_links().load_next() };
            if self
                .head
                .compare_exchange_weak(old, next, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return Some(old);
            }
        }
    }

    /// Prepends an already-linked `head..=tail` chain atomically, merging
    /// with whatever is concurrently installed under `self.head`. Used by
    /// the eviction engine's reinsert step (§4.6 step 4).
    ///
    /// # Safety
    ///
    /// `head` and `tail` must delimit a valid, acyclic chain with `tail`'s
    /// `next` free to overwrite, and neither must be reachable from any
    /// other shard.
    pub(crate) unsafe fn prepend_chain(&self, head: *mut T, tail: *mut T) {
        loop {
            let current = self.head.load(Ordering::Acquire);
            unsafe { (*tail).pool_links().store_next(current) };
            match self
                .head
                .compare_exchange_weak(current, head, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(_) => continue,
            }
        }
    }

    /// Detaches the entire list in one shot, publishing null in its place.
    /// Returns `None` if the shard was already empty or if a concurrent
    /// mutator raced the detach (caller should retry on the next tick,
    /// per §4.6 step 1: "skip this tick on contention").
    pub(crate) fn try_detach(&self) -> Option<*mut T> {
        let old_head = self.head.load(Ordering::Acquire);
        if old_head.is_null() {
            return None;
        }
        match self.head.compare_exchange(
            old_head,
            ptr::null_mut(),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => Some(old_head),
            Err(_) => None,
        }
    }

    /// Detaches the entire list, retrying until the CAS succeeds instead of
    /// giving up after one contended attempt like [`Shard::try_detach`].
    /// Used only by `close()`'s drain, which must account for every
    /// resident object rather than skip a tick.
    pub(crate) fn detach_all(&self) -> *mut T {
        loop {
            let old_head = self.head.load(Ordering::Acquire);
            if old_head.is_null() {
                return ptr::null_mut();
            }
            if self
                .head
                .compare_exchange_weak(old_head, ptr::null_mut(), Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return old_head;
            }
        }
    }

    /// Approximate number of times a caller is currently suspended in
    /// `get_block` on this shard.
    #[inline]
    pub(crate) fn blocked_count(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn mark_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn mark_unblocked(&self) {
        self.blocked.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn wait_lock(&self) -> &Mutex<()> {
        &self.wait_lock
    }

    pub(crate) fn wait_cond(&self) -> &Condvar {
        &self.wait_cond
    }
}
