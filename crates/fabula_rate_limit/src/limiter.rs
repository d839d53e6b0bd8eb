//! Per-service rate limiter using governor and a Tokio semaphore.
//!
//! - Governor (GCRA) enforces requests per minute.
//! - A semaphore bounds concurrent in-flight requests.

use crate::{RateLimitError, RateLimitErrorKind, RetryPolicy, ServiceLimits};
use fabula_error::{ServiceError, ServiceErrorKind, ServiceKind};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Semaphore;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter guarding calls to one generation service.
///
/// Clones share the same quota and semaphore.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = ServiceLimiter::new(ServiceKind::Image, &limits);
/// let guard = limiter.acquire().await?;
/// let image = client.synthesize_image(text).await?;
/// drop(guard); // Releases concurrent slot
/// ```
#[derive(Clone)]
pub struct ServiceLimiter {
    service: ServiceKind,

    // RPM limiter (requests per minute)
    rpm_limiter: Option<Arc<DirectRateLimiter>>,

    // Concurrent request semaphore
    concurrent_semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for ServiceLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLimiter")
            .field("service", &self.service)
            .field("rpm_limited", &self.rpm_limiter.is_some())
            .field("available_permits", &self.available_permits())
            .finish()
    }
}

impl ServiceLimiter {
    /// Create a limiter enforcing every configured limit.
    ///
    /// A zero or missing limit means unlimited.
    pub fn new(service: ServiceKind, limits: &ServiceLimits) -> Self {
        let rpm_limiter = limits.rpm.and_then(|rpm| {
            NonZeroU32::new(rpm).map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))))
        });

        let max_concurrent = limits
            .max_concurrent
            .filter(|n| *n > 0)
            .map_or(Semaphore::MAX_PERMITS, |n| n as usize);

        Self {
            service,
            rpm_limiter,
            concurrent_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Service this limiter guards.
    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Concurrent slots currently free.
    pub fn available_permits(&self) -> usize {
        self.concurrent_semaphore.available_permits()
    }

    /// Wait until both the rate and concurrency limits admit a request.
    ///
    /// The concurrency slot is taken last so it is not held while waiting
    /// on the rate quota.
    ///
    /// # Errors
    ///
    /// Returns error if the semaphore has been closed.
    pub async fn acquire(&self) -> Result<ServiceGuard, RateLimitError> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        let permit = self
            .concurrent_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RateLimitError::new(RateLimitErrorKind::Closed(e.to_string())))?;

        Ok(ServiceGuard { _permit: permit })
    }

    /// Try to acquire without waiting.
    pub fn try_acquire(&self) -> Option<ServiceGuard> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.check().ok()?;
        }

        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;
        Some(ServiceGuard { _permit: permit })
    }

    /// Execute a service call with rate limiting and retry.
    ///
    /// A slot is acquired before every attempt and released after it, so
    /// backoff sleeps never hold a concurrency slot.
    pub async fn execute<F, Fut, R>(
        &self,
        policy: &RetryPolicy,
        operation: &str,
        call: F,
    ) -> Result<R, ServiceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, ServiceError>>,
    {
        let call = &call;
        policy
            .run(operation, move || async move {
                let _guard = self.acquire().await.map_err(|e| {
                    ServiceError::new(self.service, ServiceErrorKind::Unavailable(e.to_string()))
                })?;
                call().await
            })
            .await
    }
}

/// RAII guard releasing the concurrency slot when dropped.
pub struct ServiceGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
