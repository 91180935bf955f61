// src/pool/eviction.rs
//! Background cleaner (C6/C7): the periodic two-pass eviction engine and
//! the `close()` lifecycle that stops it and drains every shard.

use super::core::Pool;
use crate::node::Pooled;
use crate::shard::Shard;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread::JoinHandle;

/// Spawns the background cleaner thread for `pool`. Only called from
/// [`Pool::new_with_config`] when `config.cleanup.enabled`.
///
/// The thread wakes every `interval` and runs one cleanup pass over every
/// shard, or wakes early and exits the moment [`Pool::close`] sets the
/// shutdown flag.
pub(crate) fn spawn_cleaner<T: Pooled + Send + 'static>(pool: &Pool<T>) -> JoinHandle<()> {
    let shards = pool.shards.clone();
    let current_length = pool.current_length.clone();
    let shutdown = pool.shutdown.clone();
    let min_usage_count = pool.config.cleanup.min_usage_count;
    let interval = pool.config.cleanup.interval;

    std::thread::spawn(move || {
        let (lock, cvar) = &*shutdown;
        loop {
            let guard = lock.lock().unwrap();
            let (guard, _timeout) = cvar.wait_timeout(guard, interval).unwrap();
            if *guard {
                return;
            }
            drop(guard);

            for shard in shards.iter() {
                run_cleanup_pass(shard, min_usage_count, &current_length);
            }
        }
    })
}

/// One two-pass cleanup tick over a single shard:
///
/// 1. Detach the whole free list. Skip this tick (do nothing) if the shard
///    is empty or another mutator won the detach race.
/// 2. Walk the detached chain once: objects with `usage_count >=
///    min_usage_count` have their count reset to zero and are kept;
///    everything else is freed.
/// 3. Account the evicted count against `current_length`.
/// 4. Reinsert the kept chain, merging with whatever was pushed back onto
///    the shard while the pass was running.
fn run_cleanup_pass<T: Pooled + Send>(shard: &Shard<T>, min_usage_count: i64, current_length: &AtomicI64) {
    let Some(detached_head) = shard.try_detach() else {
        return;
    };

    let mut kept_head: *mut T = ptr::null_mut();
    let mut kept_tail: *mut T = ptr::null_mut();
    let mut evicted_count: i64 = 0;
    let mut current = detached_head;

    while !current.is_null() {
        // Safe: every node on a detached chain is exclusively owned by this
        // pass until it is either freed below or reinserted by
        // `prepend_chain`.
        let next = unsafe { (*current).pool_links().load_next() };

        if unsafe { (*current).pool_links().load_usage() } >= min_usage_count {
            unsafe {
                (*current).pool_links().reset_usage();
                (*current).pool_links().store_next(ptr::null_mut());
            }
            if kept_head.is_null() {
                kept_head = current;
            } else {
                unsafe { (*kept_tail).pool_links().store_next(current) };
            }
            kept_tail = current;
        } else {
            evicted_count += 1;
            unsafe { drop(Box::from_raw(current)) };
        }

        current = next;
    }

    if evicted_count > 0 {
        current_length.fetch_sub(evicted_count, Ordering::Relaxed);
    }
    if !kept_head.is_null() {
        unsafe { shard.prepend_chain(kept_head, kept_tail) };
    }
}

impl<T: Pooled + Send + 'static> Pool<T> {
    /// Stops the background cleaner (if any) and drains every shard,
    /// running the cleaner once on each resident object and decrementing
    /// `current_length` accordingly. Idempotent: a second call is a no-op.
    ///
    /// A cleaner that panics on one object does not stop the drain of the
    /// remaining objects or shards.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let (lock, cvar) = &*self.shutdown;
            let mut stopped = lock.lock().unwrap();
            *stopped = true;
            cvar.notify_all();
        }
        if let Some(handle) = self.cleaner_handle.lock().unwrap().take() {
            let _ = handle.join();
        }

        self.drain();
    }

    fn drain(&self) {
        for shard in self.shards.iter() {
            let mut current = shard.detach_all();
            let mut drained: i64 = 0;

            while !current.is_null() {
                // Safe: detached exclusively by this call; nothing else can
                // observe or free it concurrently.
                let next = unsafe { (*current).pool_links().load_next() };
                let mut boxed = unsafe { Box::from_raw(current) };

                let cleaner = self.config.cleaner.clone();
                let _ = catch_unwind(AssertUnwindSafe(|| cleaner(&mut boxed)));
                drop(boxed);

                drained += 1;
                current = next;
            }

            if drained > 0 {
                self.current_length.fetch_sub(drained, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::config::PoolConfig;
    use super::super::core::Pool;
    use crate::node::{PoolLinks, Pooled};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Item {
        links: PoolLinks<Item>,
        value: u32,
    }

    impl Pooled for Item {
        fn pool_links(&self) -> &PoolLinks<Self> {
            &self.links
        }
    }

    #[test]
    fn eviction_frees_under_used_object_and_keeps_well_used_one() {
        let mut cfg = PoolConfig::new(
            || Item { links: PoolLinks::new(), value: 0 },
            |_: &mut Item| {},
        );
        cfg.shard_count_override = Some(1);
        cfg.cleanup.enabled = true;
        cfg.cleanup.interval = Duration::from_secs(3600);
        cfg.cleanup.min_usage_count = 2;
        let pool = Pool::new_with_config(cfg).unwrap();

        // `a` is used twice (survives), `b` once (evicted).
        let a = pool.get().unwrap();
        pool.put(a);
        let a = pool.get().unwrap();
        let a_addr = &*a as *const Item;
        pool.put(a);

        let b = pool.get().unwrap();
        pool.put(b);

        assert_eq!(pool.len(), 2);

        let shard = &pool.shards[0];
        super::run_cleanup_pass(shard, 2, &pool.current_length);

        assert_eq!(pool.len(), 1, "the under-used object must be evicted");
        let survivor = pool.get().unwrap();
        assert_eq!(&*survivor as *const Item, a_addr);
        assert_eq!(survivor.usage_count(), 1, "usage_count resets to 0 at the pass, then +1 on get");
    }

    #[test]
    fn close_drains_every_shard_running_the_cleaner_once() {
        let cleaned = Arc::new(AtomicUsize::new(0));
        let cleaned_in_closure = cleaned.clone();
        let mut cfg = PoolConfig::new(
            || Item { links: PoolLinks::new(), value: 0 },
            move |i: &mut Item| {
                i.value = 0;
                cleaned_in_closure.fetch_add(1, Ordering::SeqCst);
            },
        );
        cfg.shard_count_override = Some(4);
        let pool = Pool::new_with_config(cfg).unwrap();

        let handles: Vec<_> = pool.get_n(6);
        pool.put_n(handles);
        assert_eq!(pool.len(), 6);

        pool.close();

        assert_eq!(pool.len(), 0);
        assert_eq!(cleaned.load(Ordering::SeqCst), 6);

        // Idempotent: calling again must not panic or double-count.
        pool.close();
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn close_keeps_draining_after_a_cleaner_panic() {
        let mut cfg = PoolConfig::new(
            || Item { links: PoolLinks::new(), value: 0 },
            |i: &mut Item| {
                if i.value == 1 {
                    panic!("simulated cleaner failure");
                }
            },
        );
        cfg.shard_count_override = Some(1);
        let pool = Pool::new_with_config(cfg).unwrap();

        let mut a = pool.get().unwrap();
        a.value = 1;
        let b = pool.get().unwrap();
        pool.put(a);
        pool.put(b);
        assert_eq!(pool.len(), 2);

        pool.close();

        assert_eq!(pool.len(), 0, "both objects must be accounted for despite one panicking");
    }

    #[test]
    fn background_cleaner_evicts_on_its_own_schedule() {
        let mut cfg = PoolConfig::new(
            || Item { links: PoolLinks::new(), value: 0 },
            |_: &mut Item| {},
        );
        cfg.shard_count_override = Some(1);
        cfg.cleanup.enabled = true;
        cfg.cleanup.interval = Duration::from_millis(20);
        cfg.cleanup.min_usage_count = 5;
        let pool = Pool::new_with_config(cfg).unwrap();

        let h = pool.get().unwrap();
        pool.put(h);
        assert_eq!(pool.len(), 1);

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(pool.len(), 0, "background pass should have evicted the under-used object");
    }
}
