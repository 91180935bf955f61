// src/pool/handle.rs
//! The external reference to a checked-out pooled object.

use crate::node::Pooled;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A `T` on loan from a [`crate::Pool`].
///
/// Unlike an RAII guard, a `Handle` does **not** return itself to the pool
/// on drop — §6 models `put` as an explicit operation the caller invokes
/// (`pool.put(handle)`), not an automatic side effect of scope exit. If a
/// `Handle` is simply dropped without being passed to `put`, the underlying
/// object is freed and the pool's `current_length` is decremented, exactly
/// as if it had never been returned (§3: `current_length` tracks
/// "allocations minus drops").
pub struct Handle<T: Pooled> {
    inner: Option<Box<T>>,
    current_length: Arc<AtomicI64>,
}

impl<T: Pooled> Handle<T> {
    pub(crate) fn new(inner: Box<T>, current_length: Arc<AtomicI64>) -> Self {
        Self { inner: Some(inner), current_length }
    }

    /// Consumes the handle, returning the raw pointer for re-publication
    /// onto a shard. Does not touch `current_length`: the object remains
    /// counted as resident in the pool, not dropped.
    pub(crate) fn into_raw(mut self) -> *mut T {
        let boxed = self.inner.take().expect("handle already consumed");
        std::mem::forget(self);
        Box::into_raw(boxed)
    }
}

impl<T: Pooled> Deref for Handle<T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.inner.as_ref().expect("handle already consumed")
    }
}

impl<T: Pooled> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner.as_mut().expect("handle already consumed")
    }
}

impl<T: Pooled> Drop for Handle<T> {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            self.current_length.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PoolLinks;

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
    fn dropping_without_put_decrements_current_length() {
        let counter = Arc::new(AtomicI64::new(1));
        let handle = Handle::new(Box::new(Item { links: PoolLinks::new(), value: 7 }), counter.clone());
        drop(handle);
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn into_raw_does_not_touch_current_length() {
        let counter = Arc::new(AtomicI64::new(1));
        let handle = Handle::new(Box::new(Item { links: PoolLinks::new(), value: 7 }), counter.clone());
        let ptr = handle.into_raw();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[test]
    fn deref_reaches_the_value() {
        let counter = Arc::new(AtomicI64::new(1));
        let mut handle =
            Handle::new(Box::new(Item { links: PoolLinks::new(), value: 7 }), counter);
        assert_eq!(handle.value, 7);
        handle.value = 9;
        assert_eq!(handle.value, 9);
    }
}
