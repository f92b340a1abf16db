//! When and how often a failed exchange request is repeated.
//!
//! Only the public metadata endpoints are retried. A private call carries a
//! nonce that the exchange will not accept twice, and a failed page is simply
//! fetched again on the next run from the stored checkpoint.

use crate::error::HttpError;
use std::time::Duration;

/// Which requests get retried.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Fail on the first error. Used for the signed, paginated endpoints.
    #[default]
    None,
    /// [`RetryConfig::idempotent`]. Used for `Assets` and `AssetPairs`.
    Idempotent,
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// The schedule to follow, or `None` for a single attempt.
    pub fn config(&self) -> Option<RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(RetryConfig::idempotent()),
            RetryPolicy::Custom(config) => Some(config.clone()),
        }
    }
}

/// Exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Delays are spread by up to this fraction either way; `0.0` disables it.
    pub jitter: f64,
    /// Gateway answers worth another attempt.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::idempotent()
    }
}

impl RetryConfig {
    /// Kraken sits behind Cloudflare, which answers 520/522/524 while the
    /// origin is overloaded; those are as transient as a 502.
    pub fn idempotent() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(15),
            backoff_factor: 2.0,
            jitter: 0.25,
            retryable_statuses: vec![429, 502, 503, 504, 520, 522, 524],
        }
    }

    /// Whether `err` is transient under this schedule.
    ///
    /// Exchange-level errors (`EAPI:*`, `EOrder:*`) and auth failures are
    /// answers, not outages, and are never retried.
    pub fn is_retryable(&self, err: &HttpError) -> bool {
        match err {
            HttpError::ServerError { status, .. } => self.retryable_statuses.contains(status),
            HttpError::RateLimited { .. } | HttpError::Timeout => true,
            HttpError::Reqwest(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.min(i32::MAX as u32) as i32);
        let delay = self
            .initial_delay
            .mul_f64(exp.min(u32::MAX as f64))
            .min(self.max_delay);

        if self.jitter > 0.0 {
            let spread = (rand::random::<f64>() * 2.0 - 1.0) * self.jitter;
            delay.mul_f64((1.0 + spread).max(0.0))
        } else {
            delay
        }
    }
}
