//! Result caching and history persistence.
//!
//! - Fingerprints that make equivalent searches share a slot
//! - A two-tier [`ResultCache`]: moka in front, SQLite behind
//! - SQLite access through tokio-rusqlite with WAL mode and versioned migrations
//! - Search history rows for the history collaborator

pub mod connection;
pub mod durable;
pub mod entry;
pub mod hash;
pub mod history;
pub mod migrations;
pub mod tiered;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::CacheEntry;
pub use history::SearchHistoryEntry;
pub use tiered::{CacheTier, ResultCache};
