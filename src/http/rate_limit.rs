//! Admission control for exchange calls.
//!
//! Kraken counts private calls against a per-key budget; exceeding it locks the
//! key out for a while. One [`RateLimiter`] is shared (as `Arc<RateLimiter>`)
//! by every fetcher in the process so concurrently fetched accounts draw from
//! the same budget.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

type Limiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Calls admitted per window by [`RateLimiter::kraken`].
pub const KRAKEN_MAX_CALLS: usize = 8;

/// Window length used by [`RateLimiter::kraken`].
pub const KRAKEN_WINDOW: Duration = Duration::from_secs(60);

/// Admits at most `max_calls` operations within any trailing `window`.
///
/// Admissions are spaced evenly, one every `window / max_calls`, without a
/// burst allowance. A burst of `max_calls` followed by steady replenishment
/// would let more than `max_calls` through some trailing window.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    limiter: Limiter,
    admitted: AtomicU64,
}

impl RateLimiter {
    /// A limiter with a custom budget. `max_calls` of zero is treated as one;
    /// a zero `window` admits everything.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        let max_calls = max_calls.max(1);
        let period = window / u32::try_from(max_calls).unwrap_or(u32::MAX);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));

        Self {
            max_calls,
            window,
            limiter: GovernorRateLimiter::direct(quota),
            admitted: AtomicU64::new(0),
        }
    }

    /// The budget the exchange enforces: 8 calls per rolling minute.
    pub fn kraken() -> Self {
        Self::new(KRAKEN_MAX_CALLS, KRAKEN_WINDOW)
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until a slot is free, then records the admission.
    ///
    /// There is no cancellation or timeout; wrap the whole operation if a
    /// deadline is needed.
    pub async fn take(&self) {
        if self.limiter.check().is_err() {
            tracing::debug!(max_calls = self.max_calls, "Rate limit reached, waiting");
            self.limiter.until_ready().await;
        }
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Admissions granted since construction.
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::kraken()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_calls", &self.max_calls)
            .field("window", &self.window)
            .field("admitted", &self.admitted())
            .finish()
    }
}
