//! Configuration, rate limiting and retry for the Fabula pipeline.
//!
//! - [`FabulaConfig`] loads layered TOML configuration.
//! - [`ServiceLimiter`] bounds request rate and concurrency per generation
//!   service.
//! - [`RetryPolicy`] retries transient failures with exponential backoff.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod limiter;
mod retry;

pub use config::{
    DeviceImageSettings, DeviceSettings, FabulaConfig, ModelSettings, PipelineSettings,
    RetrySettings, ServiceLimits, ServicesConfig, StorageSettings,
};
pub use error::{RateLimitError, RateLimitErrorKind};
pub use limiter::{ServiceGuard, ServiceLimiter};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
