//! Core types and shared functionality for bestof.
//!
//! This crate provides:
//! - Result records and ranking types
//! - Request fingerprints and the two-tier result cache (moka + SQLite)
//! - The daily provider quota limiter
//! - Search history persistence
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod pressure;
pub mod quota;
pub mod record;

pub use cache::{CacheDb, CacheEntry, CacheTier, ResultCache, SearchHistoryEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, Plan, Profile};
pub use error::{Error, SearchError};
pub use pressure::PressureRelief;
pub use quota::{QuotaLimiter, QuotaSnapshot};
pub use record::{RankingType, ResultRecord};
