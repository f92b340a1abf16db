//! Normalized output records and the channel they are submitted through.
//!
//! Every amount is a [`Decimal`] serialized as an exact string; signs are
//! stripped and direction travels in [`TxAction`] / [`TransferAction`].

mod json_lines;
mod memory;

pub use json_lines::JsonLinesSubmitter;
pub use memory::{MemorySubmitter, Submitted};

use crate::config::PluginInfo;
use crate::error::SubmitError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxAction {
    #[default]
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferAction {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Maker,
    #[default]
    Taker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProps {
    pub is_margin_trade: bool,
    pub is_physical: bool,
    pub is_derivative: bool,
}

impl TradeProps {
    /// Spot or margin-spot; never an exchange-traded derivative.
    pub fn spot(is_margin_trade: bool) -> Self {
        Self {
            is_margin_trade,
            is_physical: true,
            is_derivative: false,
        }
    }
}

/// A normalized trade. Asset and quote symbols are canonical tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub tx_id: String,
    pub ts: DateTime<Utc>,
    pub account: String,
    pub ticker: String,
    pub asset: String,
    pub quote: String,
    pub price: Decimal,
    pub amount: Decimal,
    pub value: Decimal,
    pub action: TxAction,
    pub order_type: OrderType,
    pub order_id: String,
    pub fee: Decimal,
    pub fee_currency: String,
    pub quote_fee: Decimal,
    pub quote_fee_currency: String,
    pub asset_decimals: u32,
    pub quote_decimals: u32,
    pub fee_decimals: u32,
    pub quote_fee_decimals: u32,
    pub props: TradeProps,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub plugin_version: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// A normalized deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub tx_id: String,
    pub ts: DateTime<Utc>,
    pub account: String,
    pub action: TransferAction,
    /// Set to the account label for withdrawals.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Set to the account label for deposits.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub destination: String,
    pub asset: String,
    pub asset_decimals: u32,
    pub amount: Decimal,
    pub fee: Decimal,
    pub fee_currency: String,
    pub fee_decimals: u32,
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub plugin_version: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn stamp(&mut self, plugin: &PluginInfo) {
        self.plugin = plugin.id.clone();
        self.plugin_version = plugin.version.clone();
        self.created = Some(Utc::now());
    }
}

impl Transfer {
    pub fn stamp(&mut self, plugin: &PluginInfo) {
        self.plugin = plugin.id.clone();
        self.plugin_version = plugin.version.clone();
        self.created = Some(Utc::now());
    }
}

/// Coarse progress of a running job. `progress` is `-1` while indeterminate
/// and `100` once the job is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub progress: i32,
    #[serde(default)]
    pub plugin: String,
}

// ─── Submitter ───────────────────────────────────────────────────────────────

/// Downstream consumer of normalized records.
///
/// One call per record; success means accepted. Failures are not retried here.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit_trade(&self, trade: Trade) -> Result<(), SubmitError>;

    async fn submit_transfer(&self, transfer: Transfer) -> Result<(), SubmitError>;

    async fn show_job_progress(&self, job: JobProgress) -> Result<(), SubmitError>;

    async fn app_log(&self, level: LogLevel, message: String) -> Result<(), SubmitError>;
}

#[async_trait]
impl<T: Submitter + ?Sized> Submitter for std::sync::Arc<T> {
    async fn submit_trade(&self, trade: Trade) -> Result<(), SubmitError> {
        (**self).submit_trade(trade).await
    }

    async fn submit_transfer(&self, transfer: Transfer) -> Result<(), SubmitError> {
        (**self).submit_transfer(transfer).await
    }

    async fn show_job_progress(&self, job: JobProgress) -> Result<(), SubmitError> {
        (**self).show_job_progress(job).await
    }

    async fn app_log(&self, level: LogLevel, message: String) -> Result<(), SubmitError> {
        (**self).app_log(level, message).await
    }
}
