//! Memory-pressure hooks.
//!
//! Components that hold reclaimable memory implement [`PressureRelief`]; the
//! executor calls them when the process crosses its memory threshold.

use async_trait::async_trait;

/// Something that can give memory back on demand.
#[async_trait]
pub trait PressureRelief: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Drop whatever can be rebuilt later.
    async fn relieve(&self);
}
