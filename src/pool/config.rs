// src/pool/config.rs
//! Configuration for pool behavior: cleanup (eviction) policy and growth
//! (outstanding-object ceiling) policy.

use crate::error::{PoolError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Two-pass eviction policy.
///
/// `enabled = false` disables the background cleaner entirely — nothing is
/// ever evicted and pool size is monotone in puts minus gets.
#[derive(Clone)]
pub struct CleanupPolicy {
    /// Whether the background cleaner runs at all.
    pub enabled: bool,
    /// Cadence of cleanup passes. Must be strictly positive when `enabled`.
    pub interval: Duration,
    /// Survival threshold: objects with `usage_count < min_usage_count` at
    /// a pass are evicted. Must be strictly positive when `enabled`.
    pub min_usage_count: i64,
}

impl CleanupPolicy {
    /// No background cleaner; objects are never evicted.
    pub fn disabled() -> Self {
        Self { enabled: false, interval: Duration::ZERO, min_usage_count: 0 }
    }

    /// Gentle preset: a 10 minute cadence, one use to survive.
    pub fn low() -> Self {
        Self { enabled: true, interval: Duration::from_secs(600), min_usage_count: 1 }
    }

    /// Default preset: a 2 minute cadence, two uses to survive.
    pub fn moderate() -> Self {
        Self { enabled: true, interval: Duration::from_secs(120), min_usage_count: 2 }
    }

    /// Aggressive preset: a 30 second cadence, three uses to survive.
    pub fn aggressive() -> Self {
        Self { enabled: true, interval: Duration::from_secs(30), min_usage_count: 3 }
    }
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for CleanupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupPolicy")
            .field("enabled", &self.enabled)
            .field("interval", &self.interval)
            .field("min_usage_count", &self.min_usage_count)
            .finish()
    }
}

/// The optional cap on distinct `T` instances the pool will ever
/// simultaneously account for (resident plus outstanding).
#[derive(Debug, Clone)]
pub struct GrowthPolicy {
    /// When `false` the pool is unbounded: `get` always allocates on a
    /// miss.
    pub enable: bool,
    /// Ceiling on distinct objects. Must be strictly positive when
    /// `enable`.
    pub max_pool_size: i64,
}

impl GrowthPolicy {
    /// Unbounded: every `get` miss allocates.
    pub fn unbounded() -> Self {
        Self { enable: false, max_pool_size: 0 }
    }

    /// Capped at `max_pool_size` distinct outstanding-plus-resident
    /// objects.
    pub fn bounded(max_pool_size: i64) -> Self {
        Self { enable: true, max_pool_size }
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Full configuration for a [`crate::Pool`].
///
/// `allocator` and `cleaner` are required; everything else defaults to the
/// permissive choice (no cleanup, no growth cap, a shard count derived from
/// `std::thread::available_parallelism`).
pub struct PoolConfig<T> {
    /// Produces a new, initialized `T`. Invoked whenever `get` misses every
    /// shard and the growth policy still has room.
    pub allocator: Arc<dyn Fn() -> T + Send + Sync>,
    /// Resets a `T` to a reusable state. Invoked on every `put`, and once
    /// per object during `close()`'s drain.
    pub cleaner: Arc<dyn Fn(&mut T) + Send + Sync>,
    /// Overrides the default shard count
    /// (`clamp(available_parallelism, 8, 128)`) when `Some`.
    pub shard_count_override: Option<usize>,
    /// Two-pass eviction policy.
    pub cleanup: CleanupPolicy,
    /// Outstanding-object growth cap.
    pub growth: GrowthPolicy,
    /// Optional override for the worker-affinity capability. Defaults to a
    /// thread-local round-robin counter when `None`.
    pub worker_affinity: Option<Arc<dyn Fn() -> usize + Send + Sync>>,
}

impl<T> PoolConfig<T> {
    /// Builds a config from the two required callbacks, leaving every other
    /// field at its permissive default (no cleanup, no growth cap).
    pub fn new<A, C>(allocator: A, cleaner: C) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
        C: Fn(&mut T) + Send + Sync + 'static,
    {
        Self {
            allocator: Arc::new(allocator),
            cleaner: Arc::new(cleaner),
            shard_count_override: None,
            cleanup: CleanupPolicy::disabled(),
            growth: GrowthPolicy::unbounded(),
            worker_affinity: None,
        }
    }

    /// Validates the construction-time policy invariants (§7's three
    /// interval/threshold/size checks). `allocator` and `cleaner` are
    /// required fields on this struct, so the two "missing callback" kinds
    /// can't arise here — see [`PoolConfigBuilder::build`], which validates
    /// those before a `PoolConfig` exists at all.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.cleanup.enabled {
            if self.cleanup.interval.is_zero() {
                return Err(PoolError::InvalidCleanupInterval);
            }
            if self.cleanup.min_usage_count <= 0 {
                return Err(PoolError::InvalidMinUsageCount);
            }
        }
        if self.growth.enable && self.growth.max_pool_size <= 0 {
            return Err(PoolError::InvalidMaxPoolSize);
        }
        Ok(())
    }

    pub(crate) fn resolved_shard_count(&self) -> usize {
        self.shard_count_override.unwrap_or_else(|| {
            let available = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8);
            available.clamp(8, 128)
        })
    }
}

/// Builder for [`PoolConfig`] that leaves `allocator` and `cleaner` optional
/// until [`PoolConfigBuilder::build`].
///
/// [`PoolConfig::new`] takes both callbacks as required parameters, which
/// makes a config with a missing allocator or cleaner unrepresentable — so
/// [`PoolError::MissingAllocator`] / [`PoolError::MissingCleaner`] (§7) can
/// never actually surface through it. This builder is the path that keeps
/// those two checks real: a caller assembling a config field-by-field (for
/// example from a configuration source external to this crate) can forget
/// one, and `build()` reports it the same way the three policy checks in
/// [`PoolConfig::validate`] are reported.
pub struct PoolConfigBuilder<T> {
    allocator: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    cleaner: Option<Arc<dyn Fn(&mut T) + Send + Sync>>,
    shard_count_override: Option<usize>,
    cleanup: CleanupPolicy,
    growth: GrowthPolicy,
    worker_affinity: Option<Arc<dyn Fn() -> usize + Send + Sync>>,
}

impl<T> Default for PoolConfigBuilder<T> {
    fn default() -> Self {
        Self {
            allocator: None,
            cleaner: None,
            shard_count_override: None,
            cleanup: CleanupPolicy::disabled(),
            growth: GrowthPolicy::unbounded(),
            worker_affinity: None,
        }
    }
}

impl<T> PoolConfigBuilder<T> {
    /// Starts from the permissive defaults with no allocator or cleaner set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allocator callback.
    pub fn allocator<A>(mut self, allocator: A) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
    {
        self.allocator = Some(Arc::new(allocator));
        self
    }

    /// Sets the cleaner callback.
    pub fn cleaner<C>(mut self, cleaner: C) -> Self
    where
        C: Fn(&mut T) + Send + Sync + 'static,
    {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    /// Overrides the default shard count.
    pub fn shard_count_override(mut self, n: usize) -> Self {
        self.shard_count_override = Some(n);
        self
    }

    /// Sets the two-pass eviction policy.
    pub fn cleanup(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup = policy;
        self
    }

    /// Sets the growth (outstanding-object ceiling) policy.
    pub fn growth(mut self, policy: GrowthPolicy) -> Self {
        self.growth = policy;
        self
    }

    /// Overrides the worker-affinity capability.
    pub fn worker_affinity<F>(mut self, f: F) -> Self
    where
        F: Fn() -> usize + Send + Sync + 'static,
    {
        self.worker_affinity = Some(Arc::new(f));
        self
    }

    /// Validates and assembles a [`PoolConfig`]: `MissingAllocator` /
    /// `MissingCleaner` if either callback was never set, then the same
    /// policy checks [`PoolConfig::validate`] runs.
    pub fn build(self) -> Result<PoolConfig<T>> {
        let allocator = self.allocator.ok_or(PoolError::MissingAllocator)?;
        let cleaner = self.cleaner.ok_or(PoolError::MissingCleaner)?;
        let config = PoolConfig {
            allocator,
            cleaner,
            shard_count_override: self.shard_count_override,
            cleanup: self.cleanup,
            growth: self.growth,
            worker_affinity: self.worker_affinity,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Resolves a [`CleanupPolicy`] preset by name: `disable`, `low`,
/// `moderate`, or `aggressive`.
pub fn default_cleanup_policy(level: CleanupLevel) -> CleanupPolicy {
    match level {
        CleanupLevel::Disable => CleanupPolicy::disabled(),
        CleanupLevel::Low => CleanupPolicy::low(),
        CleanupLevel::Moderate => CleanupPolicy::moderate(),
        CleanupLevel::Aggressive => CleanupPolicy::aggressive(),
    }
}

/// Named cleanup presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupLevel {
    /// No eviction.
    Disable,
    /// 10 minute cadence, 1 use to survive.
    Low,
    /// 2 minute cadence, 2 uses to survive.
    Moderate,
    /// 30 second cadence, 3 uses to survive.
    Aggressive,
}
