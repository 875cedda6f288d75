//! Request throttling for outbound API calls.

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Throttling errors.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The quota is exhausted; retry after the given duration.
    #[error("request throttle saturated, retry after {retry_after:?}")]
    Saturated { retry_after: Duration },
}

/// Token-bucket throttle applied to outbound requests.
pub struct RequestThrottle {
    inner: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RequestThrottle {
    /// Create a throttle allowing `requests` per second.
    pub fn per_second(requests: NonZeroU32) -> Self {
        Self::with_quota(Quota::per_second(requests))
    }

    /// Create a throttle allowing `requests` per second with a separate
    /// burst allowance.
    pub fn per_second_with_burst(requests: NonZeroU32, burst: NonZeroU32) -> Self {
        Self::with_quota(Quota::per_second(requests).allow_burst(burst))
    }

    /// Create a throttle with a custom quota.
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            inner: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Try to take one permit without waiting.
    pub fn try_acquire(&self) -> Result<(), ThrottleError> {
        match self.inner.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(DefaultClock::default().now());
                Err(ThrottleError::Saturated { retry_after })
            }
        }
    }

    /// Wait until one permit is available.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }
}

impl Clone for RequestThrottle {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // try_acquire would consume a permit, so print nothing live.
        f.debug_struct("RequestThrottle").finish_non_exhaustive()
    }
}
