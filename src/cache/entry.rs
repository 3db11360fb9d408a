//! Cache Entry Module
//!
//! Defines a single memoized value together with its expiry instant.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value with an optional absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiry instant, None = never expires
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `validity` from now.
    ///
    /// A zero `validity` means the entry never expires.
    pub fn new(value: V, validity: Duration) -> Self {
        Self::with_expiry(value, expiry_from_now(validity))
    }

    /// Creates an entry with an already computed expiry.
    pub fn with_expiry(value: V, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current instant is greater than or equal
    /// to its expiry.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime, `Some(ZERO)` once expired, None if it never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Utility Functions ==
/// Computes the expiry for a validity duration, zero meaning "never".
pub fn expiry_from_now(validity: Duration) -> Option<Instant> {
    if validity.is_zero() {
        None
    } else {
        Some(Instant::now() + validity)
    }
}
