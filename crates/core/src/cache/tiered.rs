//! Two-tier result cache.
//!
//! The fast tier is an in-process moka cache; the durable tier is the SQLite
//! `result_cache` table. Reads fall through fast → durable and back-fill the
//! fast tier. Writes go to both tiers before returning.
//!
//! Expiry is decided against the injected [`Clock`] in both tiers, so an
//! entry is never served once `now > expires_at`. Moka's own per-entry expiry
//! only reclaims memory.

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::connection::CacheDb;
use super::entry::CacheEntry;
use crate::clock::{Clock, SystemClock};
use crate::pressure::PressureRelief;
use crate::{Error, ResultRecord};

/// Per-entry moka expiry taken from the entry's own `expires_at`.
struct EntryExpiry {
    clock: Arc<dyn Clock>,
}

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &CacheEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.remaining(self.clock.now()))
    }

    fn expire_after_update(
        &self, _key: &String, value: &CacheEntry, _updated_at: Instant, _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining(self.clock.now()))
    }
}

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Fast,
    Durable,
}

/// Two-tier cache of normalized result lists keyed by fingerprint.
#[derive(Clone)]
pub struct ResultCache {
    fast: Cache<String, CacheEntry>,
    durable: Option<CacheDb>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("fast_entries", &self.fast.entry_count())
            .field("durable", &self.durable.is_some())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl ResultCache {
    /// Create a cache on the system clock.
    ///
    /// `durable` may be `None` to run with the fast tier only.
    pub fn new(durable: Option<CacheDb>, capacity: u64, default_ttl: Duration) -> Self {
        Self::with_clock(durable, capacity, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(durable: Option<CacheDb>, capacity: u64, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let fast = Cache::builder()
            .max_capacity(capacity)
            .expire_after(EntryExpiry { clock: clock.clone() })
            .build();
        Self { fast, durable, clock, default_ttl }
    }

    /// TTL applied by callers that don't pick their own.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a fingerprint.
    pub async fn get(&self, key: &str) -> Option<Vec<ResultRecord>> {
        self.lookup(key).await.map(|(records, _)| records)
    }

    /// Look up a fingerprint and report which tier answered.
    ///
    /// A durable-tier failure is logged and treated as a miss.
    pub async fn lookup(&self, key: &str) -> Option<(Vec<ResultRecord>, CacheTier)> {
        let now = self.clock.now();

        if let Some(entry) = self.fast.get(key).await {
            if !entry.is_expired_at(now) {
                tracing::debug!(key, tier = "fast", "result cache hit");
                return Some((entry.payload, CacheTier::Fast));
            }
            self.fast.invalidate(key).await;
        }

        let durable = self.durable.as_ref()?;
        match durable.get_entry(key, now).await {
            Ok(Some(entry)) if !entry.is_expired_at(now) => {
                tracing::debug!(key, tier = "durable", "result cache hit, back-filling fast tier");
                let records = entry.payload.clone();
                self.fast.insert(key.to_string(), entry).await;
                Some((records, CacheTier::Durable))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key, error = %Error::CacheUnavailable(e.to_string()), "durable cache read failed");
                None
            }
        }
    }

    /// Store `records` under `key` in both tiers.
    ///
    /// The fast tier is always written. A durable-tier failure is returned as
    /// [`Error::CacheUnavailable`] after the fast tier already holds the value.
    pub async fn put(&self, key: &str, records: Vec<ResultRecord>, ttl: Duration) -> Result<(), Error> {
        let entry = CacheEntry::new(key, records, self.clock.now(), ttl);

        self.fast.insert(key.to_string(), entry.clone()).await;

        if let Some(durable) = &self.durable {
            durable
                .put_entry(&entry)
                .await
                .map_err(|e| Error::CacheUnavailable(e.to_string()))?;
        }

        tracing::debug!(key, records = entry.payload.len(), expires_at = %entry.expires_at, "result cache write");
        Ok(())
    }

    /// Drop `key` from both tiers.
    pub async fn invalidate(&self, key: &str) -> Result<(), Error> {
        self.fast.invalidate(key).await;
        if let Some(durable) = &self.durable {
            durable.delete_entry(key).await?;
        }
        Ok(())
    }

    /// Sweep expired rows out of the durable tier.
    ///
    /// Reads already ignore expired rows; this only reclaims space.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.fast.run_pending_tasks().await;
        match &self.durable {
            Some(durable) => durable.purge_expired_entries(self.clock.now()).await,
            None => Ok(0),
        }
    }

    /// Approximate number of entries in the fast tier.
    pub fn fast_entry_count(&self) -> u64 {
        self.fast.entry_count()
    }
}

#[async_trait]
impl PressureRelief for ResultCache {
    fn name(&self) -> &str {
        "result_cache.fast_tier"
    }

    /// Empty the fast tier; the durable tier still serves every entry.
    async fn relieve(&self) {
        self.fast.invalidate_all();
        self.fast.run_pending_tasks().await;
    }
}
