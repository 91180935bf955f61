// src/error.rs
//! Error types for pool construction.
//!
//! Runtime operations (`get`, `put`, `get_n`, `put_n`, `get_block`,
//! `put_block`) never return a `Result` — growth exhaustion is expressed as
//! `None` or indefinite blocking, not an error kind. Only construction can
//! fail, and only for the five reasons enumerated below.

use std::fmt;

/// Reasons a [`crate::PoolConfig`] was rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No allocator callback was supplied.
    MissingAllocator,
    /// No cleaner callback was supplied.
    MissingCleaner,
    /// Cleanup was enabled with a non-positive interval.
    InvalidCleanupInterval,
    /// Cleanup was enabled with a non-positive `min_usage_count`.
    InvalidMinUsageCount,
    /// Growth was enabled with a non-positive `max_pool_size`.
    InvalidMaxPoolSize,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAllocator => write!(f, "pool config is missing an allocator callback"),
            Self::MissingCleaner => write!(f, "pool config is missing a cleaner callback"),
            Self::InvalidCleanupInterval => {
                write!(f, "cleanup is enabled but interval is not strictly positive")
            }
            Self::InvalidMinUsageCount => write!(
                f,
                "cleanup is enabled but min_usage_count is not strictly positive"
            ),
            Self::InvalidMaxPoolSize => write!(
                f,
                "growth is enabled but max_pool_size is not strictly positive"
            ),
        }
    }
}

impl std::error::Error for PoolError {}

/// Result type alias for pool construction.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Convert a [`PoolError`] into `anyhow::Error` (for callers already on
/// `anyhow` elsewhere in their application).
#[cfg(feature = "anyhow")]
impl From<PoolError> for anyhow::Error {
    fn from(err: PoolError) -> Self {
        anyhow::anyhow!("{}", err)
    }
}

/// Extension trait for converting a construction `Result` into `anyhow`'s.
pub trait ResultExt<T> {
    /// Convert to `anyhow::Result`.
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_distinct() {
        let kinds = [
            PoolError::MissingAllocator,
            PoolError::MissingCleaner,
            PoolError::InvalidCleanupInterval,
            PoolError::InvalidMinUsageCount,
            PoolError::InvalidMaxPoolSize,
        ];
        let mut seen = std::collections::HashSet::new();
        for k in kinds {
            assert!(seen.insert(k.to_string()));
        }
    }

    #[cfg(feature = "anyhow")]
    #[test]
    fn converts_to_anyhow() {
        let err: anyhow::Error = PoolError::MissingCleaner.into();
        assert!(err.to_string().contains("cleaner"));
    }
}
