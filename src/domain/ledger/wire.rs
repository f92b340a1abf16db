//! Wire types for `/0/private/Ledgers`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `result` of one ledger page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgersResponse {
    #[serde(default)]
    pub ledger: HashMap<String, LedgerEntryResponse>,
    /// Total number of matching entries, not the page size.
    #[serde(default)]
    pub count: u64,
}

/// One ledger entry. The id is the map key, not a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntryResponse {
    pub refid: String,
    pub time: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub aclass: String,
    pub asset: String,
    pub amount: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub balance: Decimal,
}
