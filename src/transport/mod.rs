//! Exchange access seam and the read-through cached transport over it.

mod cache;

pub use cache::ResponseCache;
pub(crate) use cache::sanitize;

use crate::error::{HttpError, ImportResult};
use crate::http::RateLimiter;
use async_trait::async_trait;
use std::sync::Arc;

/// Raw exchange calls. Each returns the `result` JSON of one response.
///
/// [`KrakenHttp`](crate::http::KrakenHttp) is the production implementation;
/// tests substitute an in-memory one.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn assets(&self) -> Result<String, HttpError>;

    async fn asset_pairs(&self) -> Result<String, HttpError>;

    async fn trades_history(
        &self,
        start: i64,
        end: i64,
        offset: usize,
    ) -> Result<String, HttpError>;

    async fn ledgers(&self, start: i64, offset: usize) -> Result<String, HttpError>;
}

#[async_trait]
impl<T: ExchangeApi + ?Sized> ExchangeApi for Arc<T> {
    async fn assets(&self) -> Result<String, HttpError> {
        (**self).assets().await
    }

    async fn asset_pairs(&self) -> Result<String, HttpError> {
        (**self).asset_pairs().await
    }

    async fn trades_history(
        &self,
        start: i64,
        end: i64,
        offset: usize,
    ) -> Result<String, HttpError> {
        (**self).trades_history(start, end, offset).await
    }

    async fn ledgers(&self, start: i64, offset: usize) -> Result<String, HttpError> {
        (**self).ledgers(start, offset).await
    }
}

/// Serves paginated history from the [`ResponseCache`] when possible.
///
/// A hit costs neither a network call nor a rate-limit slot. A miss waits on
/// the shared [`RateLimiter`], calls through, and caches only successful bodies.
pub struct CachedTransport<A> {
    api: A,
    limiter: Arc<RateLimiter>,
    cache: ResponseCache,
    label: String,
}

impl<A: ExchangeApi> CachedTransport<A> {
    pub fn new(
        api: A,
        limiter: Arc<RateLimiter>,
        cache: ResponseCache,
        label: impl Into<String>,
    ) -> Self {
        Self {
            api,
            limiter,
            cache,
            label: label.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn fetch_trades_page(
        &self,
        start: i64,
        end: i64,
        offset: usize,
    ) -> ImportResult<String> {
        let key = format!("trades_{}_{}_{}", start, end, offset);
        self.fetch_raw(&key, || self.api.trades_history(start, end, offset))
            .await
    }

    pub async fn fetch_ledger_page(&self, start: i64, offset: usize) -> ImportResult<String> {
        let key = format!("ledgers_{}_{}", start, offset);
        self.fetch_raw(&key, || self.api.ledgers(start, offset)).await
    }

    async fn fetch_raw<F, Fut>(&self, key: &str, call: F) -> ImportResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, HttpError>>,
    {
        if let Some(body) = self.cache.read(&self.label, key)? {
            tracing::debug!(account = %self.label, key, "Cache hit");
            return Ok(body);
        }

        self.limiter.take().await;
        let body = call().await?;
        self.cache.write(&self.label, key, &body)?;
        tracing::debug!(account = %self.label, key, bytes = body.len(), "Cached response");
        Ok(body)
    }
}
