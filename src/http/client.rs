//! Low-level HTTP client: `KrakenHttp`.
//!
//! One method per exchange endpoint. Every method returns the raw JSON text of
//! the envelope's `result` member; parsing into wire types happens in the
//! transport layer so cached and fresh responses go through the same code.

use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::http::signer::{KrakenSigner, API_KEY_HEADER, API_SIGN_HEADER};
use crate::network;
use crate::transport::ExchangeApi;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `{"error": [...], "result": ...}` wrapper around every Kraken response.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: Vec<String>,
    result: Option<Box<RawValue>>,
}

/// Low-level HTTP client for the Kraken REST API.
#[derive(Clone)]
pub struct KrakenHttp {
    base_url: String,
    client: Client,
    signer: Option<Arc<KrakenSigner>>,
    public_retry: RetryPolicy,
    private_retry: RetryPolicy,
}

impl KrakenHttp {
    pub fn builder() -> KrakenHttpBuilder {
        KrakenHttpBuilder::default()
    }

    /// Public-only client against `base_url`.
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::builder().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    // ── Public ───────────────────────────────────────────────────────────

    pub async fn get_assets(&self) -> Result<String, HttpError> {
        self.public(network::ASSETS_PATH).await
    }

    pub async fn get_asset_pairs(&self) -> Result<String, HttpError> {
        self.public(network::ASSET_PAIRS_PATH).await
    }

    // ── Private ──────────────────────────────────────────────────────────

    /// One page of trade history. `start`/`end` of zero are omitted.
    pub async fn get_trades_history(
        &self,
        start: i64,
        end: i64,
        offset: usize,
    ) -> Result<String, HttpError> {
        let mut params = vec![("ledgers", "true".to_string())];
        if start > 0 {
            params.push(("start", start.to_string()));
        }
        if end > 0 {
            params.push(("end", end.to_string()));
        }
        params.push(("ofs", offset.to_string()));
        self.private(network::TRADES_HISTORY_PATH, &params).await
    }

    /// One page of ledger entries starting at `start`.
    pub async fn get_ledgers(&self, start: i64, offset: usize) -> Result<String, HttpError> {
        let mut params = Vec::new();
        if start > 0 {
            params.push(("start", start.to_string()));
        }
        params.push(("ofs", offset.to_string()));
        self.private(network::LEDGERS_PATH, &params).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn public(&self, path: &str) -> Result<String, HttpError> {
        self.request_with_retry(path, None, &self.public_retry).await
    }

    async fn private(&self, path: &str, params: &[(&str, String)]) -> Result<String, HttpError> {
        if self.signer.is_none() {
            return Err(HttpError::MissingCredentials(path.to_string()));
        }
        self.request_with_retry(path, Some(params), &self.private_retry)
            .await
    }

    async fn request_with_retry(
        &self,
        path: &str,
        params: Option<&[(&str, String)]>,
        retry: &RetryPolicy,
    ) -> Result<String, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(path, params).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            let err = match self.do_request(path, params).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };
            if attempt == config.max_retries || !config.is_retryable(&err) {
                return Err(err);
            }

            // The exchange's own hint wins over the backoff schedule.
            let delay = match &err {
                HttpError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms),
                _ => config.backoff(attempt),
            };
            tracing::debug!(
                attempt = attempt + 1,
                max = config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying {}",
                path
            );
            futures_timer::Delay::new(delay).await;
            last_error = Some(err);
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request(
        &self,
        path: &str,
        params: Option<&[(&str, String)]>,
    ) -> Result<String, HttpError> {
        let url = format!("{}{}", self.base_url, path);

        let req = match (params, &self.signer) {
            (Some(params), Some(signer)) => {
                // A fresh nonce per attempt; Kraken rejects reused ones.
                let nonce = signer.next_nonce();
                let post_data = encode_form(nonce, params);
                let signature = signer.sign(path, &post_data, nonce);
                self.client
                    .post(&url)
                    .header(API_KEY_HEADER, signer.api_key())
                    .header(API_SIGN_HEADER, signature)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded; charset=utf-8",
                    )
                    .body(post_data)
            }
            (Some(_), None) => return Err(HttpError::MissingCredentials(path.to_string())),
            (None, _) => self.client.get(&url),
        };

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;
        let status = resp.status();
        let body_text = resp.text().await?;

        if !status.is_success() {
            let status_code = status.as_u16();
            return Err(match status_code {
                401 | 403 => HttpError::Unauthorized(body_text),
                429 => HttpError::RateLimited {
                    retry_after_ms: None,
                },
                400..=499 => HttpError::BadRequest(body_text),
                _ => HttpError::ServerError {
                    status: status_code,
                    body: body_text,
                },
            });
        }

        unwrap_envelope(&body_text)
    }
}

/// Extracts `result` from the envelope, mapping envelope errors onto [`HttpError`].
pub(crate) fn unwrap_envelope(body: &str) -> Result<String, HttpError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| HttpError::Malformed(e.to_string()))?;

    if let Some(first) = envelope.error.first() {
        return Err(map_exchange_error(first));
    }

    envelope
        .result
        .map(|raw| raw.get().to_string())
        .ok_or_else(|| HttpError::Malformed("No result in response".to_string()))
}

/// Kraken errors look like `"EAPI:Invalid key"`: a category, then a message.
fn map_exchange_error(error: &str) -> HttpError {
    if error.contains("Rate limit exceeded") || error.starts_with("EAPI:Rate limit") {
        HttpError::RateLimited {
            retry_after_ms: None,
        }
    } else if error.starts_with("EAPI:Invalid key")
        || error.starts_with("EAPI:Invalid signature")
        || error.starts_with("EAPI:Invalid nonce")
        || error.starts_with("EGeneral:Permission denied")
    {
        HttpError::Unauthorized(error.to_string())
    } else if error.starts_with("EGeneral:Invalid arguments") {
        HttpError::BadRequest(error.to_string())
    } else if error.starts_with("EService:Unavailable") || error.starts_with("EService:Busy") {
        HttpError::ServerError {
            status: 503,
            body: error.to_string(),
        }
    } else {
        HttpError::Exchange(error.to_string())
    }
}

fn encode_form(nonce: u64, params: &[(&str, String)]) -> String {
    std::iter::once(format!("nonce={}", nonce))
        .chain(
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v))),
        )
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl ExchangeApi for KrakenHttp {
    async fn assets(&self) -> Result<String, HttpError> {
        self.get_assets().await
    }

    async fn asset_pairs(&self) -> Result<String, HttpError> {
        self.get_asset_pairs().await
    }

    async fn trades_history(
        &self,
        start: i64,
        end: i64,
        offset: usize,
    ) -> Result<String, HttpError> {
        self.get_trades_history(start, end, offset).await
    }

    async fn ledgers(&self, start: i64, offset: usize) -> Result<String, HttpError> {
        self.get_ledgers(start, offset).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct KrakenHttpBuilder {
    base_url: String,
    timeout: Duration,
    signer: Option<KrakenSigner>,
    public_retry: RetryPolicy,
    private_retry: RetryPolicy,
}

impl Default for KrakenHttpBuilder {
    fn default() -> Self {
        Self {
            base_url: network::DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            signer: None,
            public_retry: RetryPolicy::Idempotent,
            private_retry: RetryPolicy::None,
        }
    }
}

impl KrakenHttpBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Credentials for the private endpoints.
    pub fn signer(mut self, signer: KrakenSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn public_retry(mut self, policy: RetryPolicy) -> Self {
        self.public_retry = policy;
        self
    }

    pub fn private_retry(mut self, policy: RetryPolicy) -> Self {
        self.private_retry = policy;
        self
    }

    pub fn build(self) -> Result<KrakenHttp, HttpError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("kraken-import/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(KrakenHttp {
            base_url: self.base_url,
            client,
            signer: self.signer.map(Arc::new),
            public_retry: self.public_retry,
            private_retry: self.private_retry,
        })
    }
}
