//! Durable cache tier.
//!
//! Result lists persisted in SQLite so they survive a restart. Timestamps are
//! stored as unix epoch milliseconds.

use super::connection::CacheDb;
use super::entry::CacheEntry;
use crate::{Error, ResultRecord};
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl CacheDb {
    /// Get an unexpired cache entry by key hash.
    ///
    /// Returns None if the key doesn't exist or `now` is past its expiry.
    pub async fn get_entry(&self, key_hash: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error> {
        let key_hash = key_hash.to_string();
        let now_ms = now.timestamp_millis();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, String, i64, i64)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, payload_json, created_at, expires_at
                     FROM result_cache WHERE key_hash = ?1 AND expires_at >= ?2",
                )?;

                let result = stmt.query_row(params![key_hash, now_ms], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((key, payload_json, created_at, expires_at)) = row else {
            return Ok(None);
        };

        let payload: Vec<ResultRecord> = serde_json::from_str(&payload_json)?;
        Ok(Some(CacheEntry { key, payload, created_at: from_millis(created_at), expires_at: from_millis(expires_at) }))
    }

    /// Insert or replace a cache entry.
    ///
    /// Uses UPSERT semantics: a refresh replaces payload and timestamps wholesale.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let key_hash = entry.key.clone();
        let payload_json = serde_json::to_string(&entry.payload)?;
        let created_at = entry.created_at.timestamp_millis();
        let expires_at = entry.expires_at.timestamp_millis();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO result_cache (key_hash, payload_json, created_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        payload_json = excluded.payload_json,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at",
                    params![key_hash, payload_json, created_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a single entry. Returns whether a row was removed.
    pub async fn delete_entry(&self, key_hash: &str) -> Result<bool, Error> {
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM result_cache WHERE key_hash = ?1", params![key_hash])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries that expired before `now`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_entries(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let now_ms = now.timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM result_cache WHERE expires_at < ?1", params![now_ms])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries, expired or not.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM result_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
