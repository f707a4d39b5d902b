//! Cache entries shared by both tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ResultRecord;

/// A cached result list.
///
/// Entries are never mutated; a refresh writes a whole new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<ResultRecord>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Vec<ResultRecord>, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = created_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { key: key.into(), payload, created_at, expires_at }
    }

    /// Expired strictly after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Remaining lifetime at `now`, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let entry = CacheEntry::new("k", Vec::new(), now, Duration::from_secs(60));

        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(entry.expires_at));
        assert!(entry.is_expired_at(entry.expires_at + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_remaining_saturates() {
        let now = Utc::now();
        let entry = CacheEntry::new("k", Vec::new(), now, Duration::from_secs(60));
        assert_eq!(entry.remaining(now), Duration::from_secs(60));
        assert_eq!(entry.remaining(now + chrono::Duration::hours(1)), Duration::ZERO);
    }
}
