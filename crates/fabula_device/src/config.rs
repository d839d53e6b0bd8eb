//! Device configuration.

use fabula_rate_limit::{DeviceSettings, RetryPolicy};
use std::time::Duration;

/// Settings for one [`DeviceRuntime`](crate::DeviceRuntime).
///
/// # Examples
///
/// ```
/// use fabula_device::DeviceConfig;
/// use fabula_rate_limit::DeviceSettings;
/// use std::time::Duration;
///
/// let config = DeviceConfig::from_settings(&DeviceSettings::default());
/// assert_eq!(*config.tick(), Duration::from_millis(50));
/// assert_eq!(*config.download_retry().max_retries(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), default)]
pub struct DeviceConfig {
    /// Dispatch loop period
    tick: Duration,
    /// Retry budget for each asset download
    download_retry: RetryPolicy,
    /// Assets fetched concurrently per manifest
    download_concurrency: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::from_settings(&DeviceSettings::default())
    }
}

impl DeviceConfig {
    /// Creates a new config builder.
    pub fn builder() -> DeviceConfigBuilder {
        DeviceConfigBuilder::default()
    }

    /// Derive device settings from loaded configuration.
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        let download_retry = RetryPolicy::builder()
            .max_retries(settings.download_retries)
            .initial_backoff_ms(settings.download_backoff_ms)
            .build()
            .unwrap_or_default();
        Self {
            tick: Duration::from_millis(settings.tick_ms.max(1)),
            download_retry,
            download_concurrency: 4,
        }
    }
}
