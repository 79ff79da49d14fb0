//! Error types for freqcache.
//!
//! None of the cache operations fail on the normal path: a missing key is
//! `None`, and a non-positive capacity is a valid (empty) cache. Errors exist
//! only at two edges:
//!
//! - [`InvariantError`]: returned by the `check_invariants` methods when the
//!   LFU bookkeeping (store, frequency table, bucket index, min cursor) has
//!   drifted out of sync.
//! - [`ConfigError`]: returned by [`CacheBuilder::try_build`] and
//!   [`CacheConfig::validate`] for configurations the caller asked to be
//!   rejected instead of silently degraded.
//!
//! [`CacheBuilder::try_build`]: crate::builder::CacheBuilder::try_build
//! [`CacheConfig::validate`]: crate::builder::CacheConfig::validate
//!
//! ## Example
//!
//! ```
//! use freqcache::builder::CacheConfig;
//! use freqcache::error::ConfigError;
//!
//! let config = CacheConfig::lfu(0);
//! let err: ConfigError = config.validate().unwrap_err();
//! assert!(err.to_string().contains("capacity"));
//! ```

use std::fmt;

/// Structural consistency violation inside a cache.
///
/// Carries which invariant failed, e.g. `"key 3 indexed at freq 2 but stored at freq 4"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache invariant violated: {}", self.0)
    }
}

impl std::error::Error for InvariantError {}

/// Returns `Err(InvariantError)` built from `msg` unless `cond` holds.
///
/// The message closure only runs on failure, so checks stay cheap.
#[inline]
pub(crate) fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), InvariantError> {
    if cond {
        Ok(())
    } else {
        Err(InvariantError::new(msg()))
    }
}

/// Rejected cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    field: &'static str,
    reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending configuration field.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_display_prefixes_message() {
        let err = InvariantError::new("bucket 3 is empty");
        assert_eq!(err.to_string(), "cache invariant violated: bucket 3 is empty");
        assert_eq!(err.message(), "bucket 3 is empty");
    }

    #[test]
    fn ensure_only_builds_message_on_failure() {
        let mut built = false;
        assert!(
            ensure(true, || {
                built = true;
                "unused".into()
            })
            .is_ok()
        );
        assert!(!built);

        let err = ensure(false, || "len mismatch".into()).unwrap_err();
        assert_eq!(err.message(), "len mismatch");
    }

    #[test]
    fn config_display_names_field() {
        let err = ConfigError::new("capacity", "must be > 0, got -4");
        assert_eq!(err.to_string(), "invalid capacity: must be > 0, got -4");
        assert_eq!(err.field(), "capacity");
        assert_eq!(err.reason(), "must be > 0, got -4");
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<InvariantError>();
        assert_error::<ConfigError>();
    }
}
