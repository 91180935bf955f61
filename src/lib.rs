// src/lib.rs
//! # shardpool
//!
//! A generic, lock-free, sharded object pool.
//!
//! Each pooled type embeds its own free-list linkage (an intrusive
//! [`PoolLinks`] field exposed through the [`Pooled`] trait) instead of
//! being wrapped in a heap-allocated list node. The pool itself is split
//! into independently cache-padded shards, each a Treiber stack, so that
//! concurrent callers on different cores rarely contend on the same cache
//! line. A background thread can optionally run a two-pass eviction tick
//! that frees objects whose usage fell below a configured threshold since
//! the last pass.
//!
//! ```
//! use shardpool::{Pool, PoolLinks, Pooled};
//!
//! struct Connection {
//!     links: PoolLinks<Connection>,
//!     id: u32,
//! }
//!
//! impl Pooled for Connection {
//!     fn pool_links(&self) -> &PoolLinks<Self> {
//!         &self.links
//!     }
//! }
//!
//! let pool = Pool::new(
//!     || Connection { links: PoolLinks::new(), id: 0 },
//!     |c: &mut Connection| c.id = 0,
//! );
//!
//! let mut conn = pool.get().unwrap();
//! conn.id = 7;
//! pool.put(conn);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_safety_doc)]

pub mod error;
pub mod node;
pub mod pool;
pub mod selector;
mod shard;

pub use error::{PoolError, Result, ResultExt};
pub use node::{PoolLinks, Pooled};
pub use pool::{
    default_cleanup_policy, CleanupLevel, CleanupPolicy, GrowthPolicy, Handle, Pool, PoolConfig,
    PoolConfigBuilder,
};

/// Commonly used imports.
pub mod prelude {
    pub use crate::error::{PoolError, Result, ResultExt};
    pub use crate::node::{PoolLinks, Pooled};
    pub use crate::pool::{
        default_cleanup_policy, CleanupLevel, CleanupPolicy, GrowthPolicy, Handle, Pool, PoolConfig,
        PoolConfigBuilder,
    };
}
