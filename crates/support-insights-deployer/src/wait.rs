//! Fixed-interval polling with cancellation support.
//!
//! Provides a generic loop for waiting on a CloudFormation operation (or any
//! async condition) to reach a terminal state.

use anyhow::{Result, bail};
use std::future::Future;
use std::time::Duration;
use support_insights_common::defaults::POLL_INTERVAL_SECS;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for a polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Give up after this many checks (unbounded when `None`)
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    pub fn with_max_attempts(max_attempts: Option<u32>) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }
}

/// Poll `check` until it yields a terminal value.
///
/// # Arguments
/// * `config` - Poll configuration
/// * `cancel` - Optional cancellation token
/// * `check` - Async function returning `Ok(Some(value))` once terminal,
///   `Ok(None)` to poll again
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(value)` - The terminal value
/// * `Err` - Attempts exhausted, cancelled, or the check returned an error
///   (errors are not retried)
pub async fn poll_until<F, Fut, T>(
    config: &PollConfig,
    cancel: Option<&CancellationToken>,
    mut check: F,
    resource_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            bail!("Wait for {resource_name} cancelled");
        }

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempts, "Reached terminal state");
                return Ok(value);
            }
            Ok(None) => {
                if config.max_attempts.is_some_and(|max| attempts >= max) {
                    bail!("Gave up waiting for {resource_name} after {attempts} attempts");
                }

                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_secs = config.interval.as_secs(),
                    "Not finished, polling again"
                );

                tokio::select! {
                    _ = tokio::time::sleep(config.interval) => {}
                    _ = async {
                        if let Some(token) = cancel {
                            token.cancelled().await
                        } else {
                            std::future::pending::<()>().await
                        }
                    } => {
                        bail!("Wait for {resource_name} cancelled");
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Status check failed");
                return Err(e);
            }
        }
    }
}
