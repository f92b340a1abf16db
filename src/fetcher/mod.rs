//! Fetcher: paginated history import for one account.
//!
//! A [`Fetcher`] owns the cached transport, the asset directory and the
//! submission channel for one account. [`Fetcher::ledger`] runs first: it
//! emits transfers and synthetic conversion trades and returns the session's
//! ledger set. [`Fetcher::trades`] then reconciles executed trades against
//! that set, apportioning fees per ledger line.

mod compose;
mod job;
mod ledger;
mod reconcile;
mod snapshot;
mod trades;

pub use compose::{compose_conversion, pair_conversion, ComposeError, CONVERSION_COMMENT};
pub use ledger::LedgerOutcome;
pub use reconcile::reconcile_trade;
pub use snapshot::LedgerSnapshot;

use crate::config::PluginInfo;
use crate::domain::asset::Directory;
use crate::error::{ImportResult, IntegrityError};
use crate::http::RateLimiter;
use crate::submit::{LogLevel, Submitter};
use crate::transport::{CachedTransport, ExchangeApi, ResponseCache};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Counts of one ledger or trade run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    /// Transfers (ledger run) or trades (trade run) submitted.
    pub processed: usize,
    /// Synthetic conversion trades submitted.
    pub synthesized: usize,
    /// Conversion groups dropped for lack of a spend/receive pair.
    pub skipped: usize,
    pub pages: usize,
    /// Offset the next page would have been requested at.
    pub next_offset: usize,
    /// Set when the run stopped early on an exchange-side inconsistency.
    pub aborted: Option<IntegrityError>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Both halves of a full import run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ledger: FetchReport,
    pub trades: FetchReport,
    /// When the run started; the caller's next checkpoint if the run is complete.
    pub started_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.ledger.is_complete() && self.trades.is_complete()
    }
}

pub struct Fetcher<A> {
    label: String,
    transport: CachedTransport<A>,
    directory: Directory,
    submitter: Arc<dyn Submitter>,
    plugin: PluginInfo,
    snapshot: LedgerSnapshot,
}

impl<A: ExchangeApi> Fetcher<A> {
    pub fn builder(
        label: impl Into<String>,
        api: A,
        submitter: Arc<dyn Submitter>,
    ) -> FetcherBuilder<A> {
        FetcherBuilder::new(label.into(), api, submitter)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn transport(&self) -> &CachedTransport<A> {
        &self.transport
    }

    /// Ledger then trades, feeding the fresh ledger set into the trade run.
    pub async fn run(&self, checkpoint: Option<DateTime<Utc>>) -> ImportResult<RunReport> {
        let started_at = Utc::now();
        let ledger = self.ledger(checkpoint).await?;
        let trades = self.trades(checkpoint, &ledger.records).await?;
        Ok(RunReport {
            ledger: ledger.report,
            trades,
            started_at,
        })
    }

    /// Best effort: the host UI missing a log line must not fail the import.
    async fn app_log(&self, level: LogLevel, message: String) {
        let message = format!("[{}] {}", self.plugin.label, message);
        if let Err(e) = self.submitter.app_log(level, message).await {
            tracing::warn!(account = %self.label, error = %e, "Failed to submit log message");
        }
    }
}

fn checkpoint_secs(checkpoint: Option<DateTime<Utc>>) -> i64 {
    checkpoint.map(|t| t.timestamp().max(0)).unwrap_or(0)
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct FetcherBuilder<A> {
    label: String,
    api: A,
    submitter: Arc<dyn Submitter>,
    limiter: Option<Arc<RateLimiter>>,
    cache_dir: PathBuf,
    plugin: PluginInfo,
    directory: Option<Directory>,
}

impl<A: ExchangeApi> FetcherBuilder<A> {
    fn new(label: String, api: A, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            label,
            api,
            submitter,
            limiter: None,
            cache_dir: PathBuf::from("./cache"),
            plugin: PluginInfo::default(),
            directory: None,
        }
    }

    /// The process-wide limiter. Without one, the fetcher gets a private budget.
    pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn plugin(mut self, plugin: PluginInfo) -> Self {
        self.plugin = plugin;
        self
    }

    /// Skips loading the directory from the exchange.
    pub fn directory(mut self, directory: Directory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Loads the asset directory unless one was supplied. Load failures are fatal.
    pub async fn build(self) -> ImportResult<Fetcher<A>> {
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::kraken()));

        let directory = match self.directory {
            Some(d) => d,
            None => Directory::load(&self.api, &limiter).await?,
        };

        let snapshot = LedgerSnapshot::new(&self.cache_dir, &self.label);
        let transport = CachedTransport::new(
            self.api,
            limiter,
            ResponseCache::new(self.cache_dir),
            self.label.clone(),
        );

        Ok(Fetcher {
            label: self.label,
            transport,
            directory,
            submitter: self.submitter,
            plugin: self.plugin,
            snapshot,
        })
    }
}
