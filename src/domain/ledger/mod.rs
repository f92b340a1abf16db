//! Ledger domain: flat ledger records, their classification, and id lookup.

mod convert;
pub mod wire;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ─── LedgerKind ──────────────────────────────────────────────────────────────

/// Ledger entry type as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LedgerKind {
    Deposit,
    Withdrawal,
    Trade,
    Margin,
    Rollover,
    Spend,
    Receive,
    Settled,
    Adjustment,
    Transfer,
    Staking,
    Credit,
    Sale,
    Other(String),
}

impl LedgerKind {
    pub fn as_str(&self) -> &str {
        match self {
            LedgerKind::Deposit => "deposit",
            LedgerKind::Withdrawal => "withdrawal",
            LedgerKind::Trade => "trade",
            LedgerKind::Margin => "margin",
            LedgerKind::Rollover => "rollover",
            LedgerKind::Spend => "spend",
            LedgerKind::Receive => "receive",
            LedgerKind::Settled => "settled",
            LedgerKind::Adjustment => "adjustment",
            LedgerKind::Transfer => "transfer",
            LedgerKind::Staking => "staking",
            LedgerKind::Credit => "credit",
            LedgerKind::Sale => "sale",
            LedgerKind::Other(s) => s,
        }
    }

    /// Deposits and withdrawals become transfers.
    pub fn is_transfer(&self) -> bool {
        matches!(self, LedgerKind::Deposit | LedgerKind::Withdrawal)
    }

    /// Spend and receive lines are paired into synthetic trades.
    pub fn is_conversion(&self) -> bool {
        matches!(self, LedgerKind::Spend | LedgerKind::Receive)
    }
}

impl From<String> for LedgerKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "deposit" => LedgerKind::Deposit,
            "withdrawal" => LedgerKind::Withdrawal,
            "trade" => LedgerKind::Trade,
            "margin" => LedgerKind::Margin,
            "rollover" => LedgerKind::Rollover,
            "spend" => LedgerKind::Spend,
            "receive" => LedgerKind::Receive,
            "settled" => LedgerKind::Settled,
            "adjustment" => LedgerKind::Adjustment,
            "transfer" => LedgerKind::Transfer,
            "staking" => LedgerKind::Staking,
            "credit" => LedgerKind::Credit,
            "sale" => LedgerKind::Sale,
            _ => LedgerKind::Other(s),
        }
    }
}

impl From<LedgerKind> for String {
    fn from(kind: LedgerKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── LedgerRec ───────────────────────────────────────────────────────────────

/// One ledger line, unique by `id` within a fetch session.
///
/// Amounts keep the exchange's sign and scale; magnitudes are taken when the
/// record is normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRec {
    pub id: String,
    /// Groups related lines: both legs of a trade, or a spend and its receive.
    pub ref_id: String,
    #[serde(with = "crate::shared::serde_util::unix_seconds")]
    pub timestamp: DateTime<Utc>,
    pub kind: LedgerKind,
    #[serde(default)]
    pub subtype: String,
    pub asset_class: String,
    /// Native asset symbol.
    pub asset: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub balance: Decimal,
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidTimestamp { id: String, time: f64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidTimestamp { id, time } => {
                write!(f, "Ledger entry {} has invalid time {}", id, time)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ─── LedgerIndex ─────────────────────────────────────────────────────────────

/// Id lookup over a session's ledger set.
pub struct LedgerIndex<'a> {
    by_id: HashMap<&'a str, &'a LedgerRec>,
}

impl<'a> LedgerIndex<'a> {
    pub fn new(recs: &'a [LedgerRec]) -> Self {
        Self {
            by_id: recs.iter().map(|r| (r.id.as_str(), r)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Records whose id appears in `ids`, oldest first. Unknown ids are skipped.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Vec<LedgerRec> {
        let mut matches: Vec<LedgerRec> = ids
            .iter()
            .filter_map(|id| self.by_id.get(id.as_ref()).map(|r| (*r).clone()))
            .collect();
        matches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        matches
    }
}
