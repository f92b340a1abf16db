//! HTTP client layer: `KrakenHttp`, request signing, retry policies and the
//! shared rate limiter.

pub mod client;
pub mod rate_limit;
pub mod retry;
pub mod signer;

pub use client::{KrakenHttp, KrakenHttpBuilder};
pub use rate_limit::RateLimiter;
pub use retry::{RetryConfig, RetryPolicy};
pub use signer::KrakenSigner;
