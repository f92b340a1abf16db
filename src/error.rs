//! Unified import error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ImportResult<T> = Result<T, ImportError>;

/// Top-level import error.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while talking to the exchange.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The exchange answered 200 but reported errors inside the envelope.
    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Missing API credentials for private endpoint {0}")]
    MissingCredentials(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// Local response cache and snapshot errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the downstream submission channel.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Channel closed")]
    Closed,

    #[error("Rejected by consumer: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Invalid API secret: {0}")]
    InvalidSecret(String),
}

/// An exchange-side inconsistency that ends a trade run early.
///
/// Not returned as an `Err`: the run stops deliberately and the condition is
/// reported through the log sink and the run's [`FetchReport`](crate::fetcher::FetchReport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Pair {pair} wasn't found in the exchange's list of pairs (trade {trade_id})")]
    UnknownPair { trade_id: String, pair: String },

    #[error("Asset {asset} of pair {pair} wasn't found in the exchange's list of assets (trade {trade_id})")]
    UnknownAsset {
        trade_id: String,
        pair: String,
        asset: String,
    },
}
