//! Bounded exponential backoff for RPC calls
//!
//! Every chain interaction the updater retries goes through
//! [`with_rpc_retry`]. Only errors classified by [`Error::is_transient`]
//! (rate limiting, HTTP 429/599) are retried; everything else is returned
//! on the spot.
//!
//! With the default policy the delays are 1s, 2s, 4s, 8s, then capped at 10s.
//! A backoff follows every transient failure, including the last one, so
//! five failed attempts take 25s before the error is returned.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Retry policy for transient RPC failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any single delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Delay to wait after the given (zero-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

pub(crate) fn default_max_attempts() -> u32 {
    5
}

pub(crate) fn default_base_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_max_delay_ms() -> u64 {
    10_000
}

/// Run an RPC operation, retrying transient failures with backoff.
///
/// `label` names the call in log output (e.g. `"resolver.contenthash"`).
///
/// # Returns
///
/// - `Ok(T)`: the first successful result
/// - `Err(Error)`: the first non-transient error, or the last transient one
///   once `policy.max_attempts` attempts have failed
pub async fn with_rpc_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        let backoff = policy.backoff(attempt);
        attempt += 1;
        warn!(
            "RPC rate limited during {}. Retrying in {}ms (attempt {}/{})...",
            label,
            backoff.as_millis(),
            attempt,
            max_attempts
        );
        // Every transient failure backs off, the last one included
        tokio::time::sleep(backoff).await;

        if attempt >= max_attempts {
            return Err(err);
        }
    }
}
