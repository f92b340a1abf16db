//! Wire types for `/0/private/TradesHistory`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `result` of one trade history page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradesHistoryResponse {
    #[serde(default)]
    pub trades: HashMap<String, TradeEntryResponse>,
    #[serde(default)]
    pub count: u64,
}

/// One executed trade. The trade id is the map key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeEntryResponse {
    pub ordertxid: String,
    #[serde(default)]
    pub postxid: Option<String>,
    pub pair: String,
    pub time: f64,
    /// `buy` or `sell`.
    #[serde(rename = "type")]
    pub side: String,
    pub ordertype: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub fee: Decimal,
    pub vol: Decimal,
    #[serde(default)]
    pub margin: Decimal,
    #[serde(default)]
    pub misc: String,
    /// Present when requested with `ledgers=true`.
    #[serde(default)]
    pub ledgers: Vec<String>,
}
