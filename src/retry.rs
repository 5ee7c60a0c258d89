//! Retry logic with fixed delays and jittered pacing
//!
//! Every attempt is independent: the caller's operation is re-run from
//! scratch, so it can re-randomise whatever it likes (identity, pacing) per
//! attempt. Failed attempts wait a fixed delay before the next one, and a
//! "blocked" failure (HTTP 403) waits the separate blocked-retry delay.
//!
//! # Example
//!
//! ```no_run
//! use node_crawler::config::RetryConfig;
//! use node_crawler::retry::fetch_with_retry;
//! use node_crawler::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = fetch_with_retry(&config, |attempt| async move {
//!     if attempt == 1 {
//!         return Err(Error::Blocked { url: "https://www.mibei77.com".into() });
//!     }
//!     Ok::<_, Error>("<html></html>".to_string())
//! })
//! .await?;
//! assert!(body.starts_with("<html>"));
//! # Ok(())
//! # }
//! ```

use crate::config::{DelayRange, RetryConfig};
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, server errors) return `true`.
/// Permanent failures (bad configuration, nothing found, empty content) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;

    /// Returns true if the server refused the request outright (HTTP 403)
    ///
    /// Blocked failures are retryable but wait the blocked-retry delay.
    fn is_blocked(&self) -> bool {
        false
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Any transport-level failure may clear up on the next attempt
            Error::Network(_) => true,
            Error::HttpStatus { .. } => true,
            Error::Blocked { .. } => true,
            Error::InvalidUrl { .. } => false,
            Error::Config { .. } => false,
            Error::NotFound { .. } => false,
            Error::Validation(_) => false,
            Error::Io(_) => false,
            Error::Serialization(_) => false,
        }
    }

    fn is_blocked(&self) -> bool {
        matches!(self, Error::Blocked { .. })
    }
}

/// Execute an async operation, retrying transient failures
///
/// The operation receives the 1-based attempt number. At most
/// `config.max_attempts` attempts are made; between two attempts the loop
/// sleeps `config.blocked_delay` after a blocked failure and
/// `config.retry_delay` after any other retryable failure. The last error is
/// returned unchanged once attempts run out, and non-retryable errors are
/// returned immediately.
pub async fn fetch_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = if e.is_blocked() {
                    config.blocked_delay
                } else {
                    config.retry_delay
                };

                if e.is_blocked() {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis(),
                        "Request refused with 403, possibly an anti-crawler block"
                    );
                } else {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis(),
                        "Request failed, retrying"
                    );
                }

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Request failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Request failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Draw a delay uniformly from `range` (inclusive)
///
/// An inverted range collapses to its lower bound.
pub fn random_delay(range: &DelayRange) -> Duration {
    if range.max <= range.min {
        return range.min;
    }
    let min = saturating_millis(range.min);
    let max = saturating_millis(range.max);
    let millis = rand::thread_rng().gen_range(min..=max);
    Duration::from_millis(millis)
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
