//! Wire types for the public metadata endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `result` of `/0/public/Assets`, keyed by exchange-native asset symbol.
pub type AssetsResponse = HashMap<String, AssetResponse>;

/// `result` of `/0/public/AssetPairs`, keyed by exchange-native pair symbol.
pub type AssetPairsResponse = HashMap<String, AssetPairResponse>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetResponse {
    #[serde(default)]
    pub aclass: String,
    pub altname: String,
    pub decimals: u32,
    #[serde(default)]
    pub display_decimals: u32,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPairResponse {
    pub altname: String,
    /// Missing for dark-pool pairs.
    #[serde(default)]
    pub wsname: Option<String>,
    #[serde(default)]
    pub aclass_base: String,
    pub base: String,
    #[serde(default)]
    pub aclass_quote: String,
    pub quote: String,
    #[serde(default)]
    pub cost_decimals: u32,
    #[serde(default)]
    pub pair_decimals: u32,
    #[serde(default)]
    pub lot_decimals: u32,
    #[serde(default)]
    pub lot_multiplier: u32,
    /// `[[volume, percent_fee], ...]`
    #[serde(default)]
    pub fees: Vec<[f64; 2]>,
    #[serde(default)]
    pub fees_maker: Vec<[f64; 2]>,
    #[serde(default)]
    pub fee_volume_currency: Option<String>,
    #[serde(default)]
    pub ordermin: Option<String>,
    #[serde(default)]
    pub costmin: Option<String>,
    #[serde(default)]
    pub tick_size: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
