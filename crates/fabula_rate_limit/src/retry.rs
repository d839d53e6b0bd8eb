//! Exponential backoff retry for transient failures.

use crate::RetrySettings;
use fabula_error::RetryableError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::jitter};
use tracing::{debug, warn};

/// Bounded exponential backoff.
///
/// The n-th retry waits `initial_backoff_ms * factor^n`, capped at
/// `max_delay_ms`. Errors whose [`RetryableError::is_retryable`] is false
/// fail immediately.
///
/// # Examples
///
/// ```
/// use fabula_rate_limit::RetryPolicy;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(2_usize)
///     .initial_backoff_ms(100_u64)
///     .jitter(false)
///     .build()
///     .unwrap();
///
/// let delays: Vec<u64> = policy.delays().map(|d| d.as_millis() as u64).collect();
/// assert_eq!(delays, vec![100, 200]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: usize,
    /// Delay before the first retry
    initial_backoff_ms: u64,
    /// Backoff multiplier
    factor: u64,
    /// Cap on a single delay
    max_delay_ms: u64,
    /// Randomize delays
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff_ms: settings.initial_backoff_ms,
            factor: settings.factor,
            max_delay_ms: settings.max_delay_ms,
            jitter: settings.jitter,
        }
    }
}

impl RetryPolicy {
    /// Creates a new policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delays before each retry, without jitter applied.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let initial = self.initial_backoff_ms;
        let factor = self.factor.max(1);
        let max_delay = self.max_delay_ms;
        (0..self.max_retries).map(move |n| {
            let exp = u32::try_from(n).unwrap_or(u32::MAX);
            let scaled = factor
                .checked_pow(exp)
                .and_then(|m| initial.checked_mul(m))
                .unwrap_or(u64::MAX);
            Duration::from_millis(scaled.min(max_delay))
        })
    }

    /// Run `action` until it succeeds, fails permanently, or retries run out.
    ///
    /// `operation` names the call in logs.
    pub async fn run<F, Fut, R, E>(&self, operation: &str, action: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let use_jitter = self.jitter;
        let strategy = self
            .delays()
            .map(move |d| if use_jitter { jitter(d) } else { d });
        let attempts = AtomicUsize::new(0);
        let attempts = &attempts;
        let action = &action;

        Retry::spawn(strategy, move || async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            match action().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    Ok(value)
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "Transient error, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(operation, attempt, error = %e, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}
