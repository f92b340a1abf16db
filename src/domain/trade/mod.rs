//! Trade domain: flat trade history records.

mod convert;
pub mod wire;

use crate::domain::ledger::{LedgerIndex, LedgerRec};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// One executed trade, plus the ledger lines it touched once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRec {
    pub id: String,
    pub order_id: String,
    /// Native pair symbol, e.g. `XXBTZEUR`.
    pub pair: String,
    pub side: String,
    pub order_type: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    /// Volume as quoted by the exchange.
    pub volume: Decimal,
    pub cost: Decimal,
    pub fee: Decimal,
    pub margin: Decimal,
    pub misc: String,
    pub ledger_ids: Vec<String>,
    /// Filled by [`TradeRec::resolve_ledgers`], oldest first.
    pub ledgers: Vec<LedgerRec>,
}

impl TradeRec {
    pub fn is_sell(&self) -> bool {
        self.side == "sell"
    }

    pub fn is_limit(&self) -> bool {
        self.order_type == "limit"
    }

    pub fn resolve_ledgers(&mut self, index: &LedgerIndex<'_>) {
        self.ledgers = index.resolve(&self.ledger_ids);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidTimestamp(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidTimestamp(id) => write!(f, "Trade {} has invalid time", id),
        }
    }
}

impl std::error::Error for ValidationError {}
