//! Bounded execution of outbound provider calls.
//!
//! Every remote call goes through [`BoundedExecutor::execute`], which applies:
//! - a concurrency cap (semaphore permit held for one attempt only)
//! - a per-attempt wall-clock timeout; a timed-out attempt is dropped
//! - exponential backoff between attempts for retryable failures
//! - a memory guard that runs pressure-relief hooks above a threshold

pub mod memory;

pub use memory::{MemoryProbe, ProcMemoryProbe};

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use bestof_core::{AppConfig, PressureRelief};

/// Classifies a failure as worth retrying or not.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Why an execution gave up.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError<E> {
    /// Non-retryable failure; returned after the attempt that produced it.
    #[error("terminal failure: {0}")]
    Terminal(E),

    /// Retry budget used up; `last` is the final attempt's error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// Retry budget used up and the final attempt timed out.
    #[error("gave up after {attempts} attempts: timed out")]
    TimedOut { attempts: u32 },

    /// The permit pool was closed.
    #[error("executor closed")]
    Closed,
}

/// Executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Simultaneous attempts allowed (default: 1).
    pub max_concurrency: usize,
    /// First backoff delay (default: 1s).
    pub backoff_base: Duration,
    /// Backoff cap (default: 30s).
    pub backoff_max: Duration,
    /// Resident bytes above which relief hooks run; `None` disables the guard.
    pub memory_threshold: Option<u64>,
    /// Pause after relief hooks have run (default: 500ms).
    pub memory_pause: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
            memory_threshold: Some(512 * 1024 * 1024),
            memory_pause: Duration::from_millis(500),
        }
    }
}

impl ExecutorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            backoff_base: config.backoff_base(),
            backoff_max: config.backoff_max(),
            memory_threshold: config.memory_threshold_bytes(),
            memory_pause: config.memory_pause(),
        }
    }
}

/// Runs calls under a concurrency cap with timeout, retry and memory guard.
#[derive(Clone)]
pub struct BoundedExecutor {
    permits: Arc<Semaphore>,
    config: ExecutorConfig,
    probe: Arc<dyn MemoryProbe>,
    relief: Vec<Arc<dyn PressureRelief>>,
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("available_permits", &self.permits.available_permits())
            .field("config", &self.config)
            .field("relief_hooks", &self.relief.iter().map(|r| r.name().to_string()).collect::<Vec<_>>())
            .finish()
    }
}

impl BoundedExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_probe(config, Arc::new(ProcMemoryProbe))
    }

    pub fn with_probe(config: ExecutorConfig, probe: Arc<dyn MemoryProbe>) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self { permits, config, probe, relief: Vec::new() }
    }

    /// Register a hook to run when resident memory crosses the threshold.
    pub fn with_relief(mut self, hook: Arc<dyn PressureRelief>) -> Self {
        self.relief.push(hook);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn backoff(&self) -> ExponentialBackoff {
        backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.backoff_base)
            .with_randomization_factor(0.0)
            .with_multiplier(2.0)
            .with_max_interval(self.config.backoff_max)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `call` until it succeeds, fails terminally, or `max_retries`
    /// retries after the first attempt have been spent.
    ///
    /// `call` must produce a fresh future per attempt.
    pub async fn execute<T, E, F, Fut>(
        &self, label: &str, timeout: Duration, max_retries: u32, mut call: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = max_retries.saturating_add(1);
        let mut backoff = self.backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.guard_memory(label).await;

            let outcome = {
                let _permit = self.permits.acquire().await.map_err(|_| ExecutorError::Closed)?;
                tracing::debug!(label, attempt, max_attempts, "starting attempt");
                tokio::time::timeout(timeout, call()).await
            };

            let last = match outcome {
                Ok(Ok(value)) => {
                    tracing::debug!(label, attempt, "attempt succeeded");
                    return Ok(value);
                }
                Ok(Err(e)) if !e.is_retryable() => {
                    tracing::warn!(label, attempt, error = %e, "terminal failure, not retrying");
                    return Err(ExecutorError::Terminal(e));
                }
                Ok(Err(e)) => Some(e),
                Err(_) => None,
            };

            let error = last.as_ref().map_or_else(|| "attempt timed out".to_string(), ToString::to_string);

            if attempt >= max_attempts {
                tracing::error!(label, attempts = attempt, error = %error, "retry budget exhausted");
                return Err(match last {
                    Some(last) => ExecutorError::Exhausted { attempts: attempt, last },
                    None => ExecutorError::TimedOut { attempts: attempt },
                });
            }

            let delay = backoff.next_backoff().unwrap_or(self.config.backoff_max);
            tracing::warn!(label, attempt, delay_ms = delay.as_millis() as u64, error = %error, "attempt failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    /// Run relief hooks and pause when resident memory is above the threshold.
    async fn guard_memory(&self, label: &str) {
        let Some(threshold) = self.config.memory_threshold else {
            return;
        };
        let Some(resident) = self.probe.resident_bytes() else {
            return;
        };
        if resident <= threshold {
            return;
        }

        tracing::warn!(label, resident_bytes = resident, threshold_bytes = threshold, "memory above threshold, running relief hooks");
        for hook in &self.relief {
            hook.relieve().await;
            tracing::debug!(hook = hook.name(), "relief hook finished");
        }
        tokio::time::sleep(self.config.memory_pause).await;
    }
}
