// src/node.rs
//! Intrusive node fields embedded in every pooled value.
//!
//! A pooled type never wraps its values in a separate list node. Instead it
//! embeds a [`PoolLinks`] field and implements [`Pooled`] to expose it. This
//! is the "capability + mixin" strategy: no reflection, no wrapper
//! allocation, just two atomic fields living directly inside `T`.

use std::sync::atomic::{AtomicI64, AtomicPtr, Ordering};

/// The two atomic fields a pooled type must carry.
///
/// `next` is meaningful only while the object is resident on a shard's free
/// list; it is null while the object is held by a caller. `usage_count` is
/// monotonically non-decreasing between resets performed by the eviction
/// engine.
#[derive(Debug)]
pub struct PoolLinks<T> {
    next: AtomicPtr<T>,
    usage_count: AtomicI64,
}

impl<T> Default for PoolLinks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PoolLinks<T> {
    /// Creates a fresh link pair: no successor, zero usage.
    pub const fn new() -> Self {
        Self {
            next: AtomicPtr::new(std::ptr::null_mut()),
            usage_count: AtomicI64::new(0),
        }
    }

    #[inline]
    pub(crate) fn load_next(&self) -> *mut T {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn store_next(&self, ptr: *mut T) {
        self.next.store(ptr, Ordering::Release);
    }

    #[inline]
    pub(crate) fn load_usage(&self) -> i64 {
        self.usage_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn increment_usage(&self) {
        self.usage_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn reset_usage(&self) {
        self.usage_count.store(0, Ordering::Relaxed);
    }
}

/// Capability a pooled type must fulfill: expose its embedded [`PoolLinks`].
///
/// # Example
///
/// ```
/// use shardpool::{PoolLinks, Pooled};
///
/// struct Connection {
///     links: PoolLinks<Connection>,
///     socket_fd: i32,
/// }
///
/// impl Pooled for Connection {
///     fn pool_links(&self) -> &PoolLinks<Self> {
///         &self.links
///     }
/// }
/// ```
pub trait Pooled: Sized {
    /// Returns a reference to this value's embedded node fields.
    fn pool_links(&self) -> &PoolLinks<Self>;

    /// Reads the current usage count. Exposed so callers (and tests) can
    /// observe that an object returned from `get` always has `usage_count
    /// >= 1`.
    #[inline]
    fn usage_count(&self) -> i64 {
        self.pool_links().load_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        links: PoolLinks<Dummy>,
    }

    impl Pooled for Dummy {
        fn pool_links(&self) -> &PoolLinks<Self> {
            &self.links
        }
    }

    #[test]
    fn fresh_links_are_null_and_zero() {
        let d = Dummy { links: PoolLinks::new() };
        assert!(d.pool_links().load_next().is_null());
        assert_eq!(d.usage_count(), 0);
    }

    #[test]
    fn usage_increments_and_resets() {
        let d = Dummy { links: PoolLinks::new() };
        d.pool_links().increment_usage();
        d.pool_links().increment_usage();
        assert_eq!(d.usage_count(), 2);
        d.pool_links().reset_usage();
        assert_eq!(d.usage_count(), 0);
    }
}
