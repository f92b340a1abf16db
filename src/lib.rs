//! # Kraken Import
//!
//! Imports an account's full trade, ledger and transfer history from the
//! Kraken REST API and normalizes it for a downstream consumer.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Flat ledger/trade records, asset directory, currency normalizer
//! 2. **HTTP API**: `KrakenHttp` with request signing and per-endpoint retry policies
//! 3. **Transport**: `CachedTransport`: on-disk response replay behind a shared `RateLimiter`
//! 4. **Fetcher**: Pagination, fee apportionment and synthetic conversion trades
//! 5. **Boundary**: `Submitter` for normalized records, `HostBoundary` for settings
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kraken_import::prelude::*;
//! use std::sync::Arc;
//!
//! let http = KrakenHttp::builder()
//!     .signer(KrakenSigner::new(key, secret)?)
//!     .build()?;
//!
//! let fetcher = Fetcher::builder("main", http, Arc::new(JsonLinesSubmitter::stdout()))
//!     .limiter(Arc::new(RateLimiter::kraken()))
//!     .cache_dir("./cache")
//!     .build()
//!     .await?;
//!
//! let ledger = fetcher.ledger(checkpoint).await?;
//! let report = fetcher.trades(checkpoint, &ledger.records).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Currency normalizer and timestamp helpers.
pub mod shared;

/// Domain modules (vertical slices): records, wire types, conversions.
pub mod domain;

/// Unified error types.
pub mod error;

/// Network URL constants.
pub mod network;

/// Settings, accounts and checkpoints.
pub mod config;

/// Subscriber setup for the binary.
pub mod logging;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client, signing, retry policies and the rate limiter.
pub mod http;

// ── Layer 3: Transport ───────────────────────────────────────────────────────

pub mod transport;

// ── Layer 4: Fetcher ─────────────────────────────────────────────────────────

pub mod fetcher;

// ── Layer 5: Boundary ────────────────────────────────────────────────────────

/// Normalized records and the submission channel.
pub mod submit;

pub mod host;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared helpers
    pub use crate::shared::normalize_currency;

    // Domain types
    pub use crate::domain::asset::{AssetInfo, Directory, FeeTier, PairInfo};
    pub use crate::domain::ledger::{LedgerIndex, LedgerKind, LedgerRec};
    pub use crate::domain::trade::TradeRec;

    // Errors
    pub use crate::error::{
        CacheError, ConfigError, HttpError, ImportError, ImportResult, IntegrityError,
        SubmitError,
    };

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // Config
    pub use crate::config::{AccountConfig, AppConfig, CheckpointStore, PluginInfo};

    // HTTP client
    pub use crate::http::{
        KrakenHttp, KrakenHttpBuilder, KrakenSigner, RateLimiter, RetryConfig, RetryPolicy,
    };

    // Transport
    pub use crate::transport::{CachedTransport, ExchangeApi, ResponseCache};

    // Fetcher
    pub use crate::fetcher::{FetchReport, Fetcher, FetcherBuilder, LedgerOutcome, RunReport};

    // Submission
    pub use crate::submit::{
        JobProgress, JsonLinesSubmitter, LogLevel, MemorySubmitter, OrderType, Submitter, Trade,
        TradeProps, Transfer, TransferAction, TxAction,
    };

    // Host
    pub use crate::host::{HostBoundary, LocalHost};
}
