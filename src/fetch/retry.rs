// src/fetch/retry.rs
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::{DatasetRequest, TableSource};
use crate::config::RetrySettings;
use crate::error::FetchError;
use crate::junar::DataTable;

const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first call included. Zero behaves as one.
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Growth of the delay between consecutive attempts; `1.0` keeps it fixed.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_attempts: s.max_attempts,
            backoff: Duration::from_millis(s.backoff_ms),
            multiplier: s.multiplier,
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based), capped at one minute.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = if self.multiplier.is_finite() && self.multiplier > 1.0 {
            self.multiplier.powi(attempt.saturating_sub(1) as i32)
        } else {
            1.0
        };
        let ms = self.backoff.as_millis() as f64 * factor;
        if ms >= MAX_DELAY.as_millis() as f64 {
            MAX_DELAY
        } else {
            Duration::from_millis(ms as u64)
        }
    }
}

/// Retries retryable failures of the wrapped source.
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TableSource> TableSource for Retrying<S> {
    async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.fetch_table(req).await {
                Ok(table) => {
                    if attempt > 1 {
                        info!(dataset = %req.dataset_id, attempt, "recovered after retry");
                    }
                    return Ok(table);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        dataset = %req.dataset_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(dataset = %req.dataset_id, attempts = attempt, error = %e, "Exhausted retries");
                    return Err(FetchError::Dataset {
                        dataset: req.dataset_id.clone(),
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}
