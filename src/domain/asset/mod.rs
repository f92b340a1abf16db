//! Asset domain: exchange asset and pair metadata, and the directory holding them.

mod convert;
pub mod wire;

use crate::error::{HttpError, ImportResult};
use crate::http::RateLimiter;
use crate::shared::normalize_currency;
use crate::transport::ExchangeApi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── AssetInfo ───────────────────────────────────────────────────────────────

/// Metadata of one exchange asset, keyed in the [`Directory`] by its native symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub class: String,
    /// Display name, e.g. `XBT` for `XXBT`.
    pub altname: String,
    pub decimals: u32,
    pub display_decimals: u32,
    pub status: String,
}

// ─── PairInfo ────────────────────────────────────────────────────────────────

/// One step of a volume-tiered fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub volume: f64,
    pub percent: f64,
}

/// Metadata of one trading pair, keyed in the [`Directory`] by its native symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    pub display_name: String,
    /// `BASE/QUOTE` name used as the ticker of emitted trades.
    pub wire_name: String,
    /// Native symbol of the base asset.
    pub base: String,
    /// Native symbol of the quote asset.
    pub quote: String,
    pub cost_decimals: u32,
    pub price_decimals: u32,
    pub lot_decimals: u32,
    pub fees_taker: Vec<FeeTier>,
    pub fees_maker: Vec<FeeTier>,
    pub status: String,
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Immutable asset and pair lookup tables, loaded once per fetcher.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    assets: HashMap<String, AssetInfo>,
    pairs: HashMap<String, PairInfo>,
}

impl Directory {
    pub fn new(assets: HashMap<String, AssetInfo>, pairs: HashMap<String, PairInfo>) -> Self {
        Self { assets, pairs }
    }

    /// Loads assets and pairs, one rate-limited call each.
    ///
    /// Any failure is returned; a fetcher must not run against an empty directory.
    pub async fn load(api: &dyn ExchangeApi, limiter: &RateLimiter) -> ImportResult<Self> {
        let assets = Self::load_assets(api, limiter).await?;
        let pairs = Self::load_pairs(api, limiter).await?;
        tracing::debug!(
            assets = assets.len(),
            pairs = pairs.len(),
            "Loaded asset directory"
        );
        Ok(Self { assets, pairs })
    }

    pub async fn load_assets(
        api: &dyn ExchangeApi,
        limiter: &RateLimiter,
    ) -> ImportResult<HashMap<String, AssetInfo>> {
        limiter.take().await;
        let raw = api.assets().await?;
        let wire: wire::AssetsResponse =
            serde_json::from_str(&raw).map_err(|e| HttpError::Malformed(e.to_string()))?;
        Ok(wire.into_iter().map(|(k, v)| (k, v.into())).collect())
    }

    pub async fn load_pairs(
        api: &dyn ExchangeApi,
        limiter: &RateLimiter,
    ) -> ImportResult<HashMap<String, PairInfo>> {
        limiter.take().await;
        let raw = api.asset_pairs().await?;
        let wire: wire::AssetPairsResponse =
            serde_json::from_str(&raw).map_err(|e| HttpError::Malformed(e.to_string()))?;
        Ok(wire.into_iter().map(|(k, v)| (k, v.into())).collect())
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetInfo> {
        self.assets.get(symbol)
    }

    pub fn pair(&self, symbol: &str) -> Option<&PairInfo> {
        self.pairs.get(symbol)
    }

    /// Decimal precision of `symbol`, zero when unknown.
    pub fn decimals(&self, symbol: &str) -> u32 {
        self.assets.get(symbol).map(|a| a.decimals).unwrap_or(0)
    }

    /// Canonical ticker for a native asset symbol.
    pub fn canonical<'a>(&'a self, symbol: &'a str) -> &'a str {
        let name = self
            .assets
            .get(symbol)
            .map(|a| a.altname.as_str())
            .unwrap_or(symbol);
        normalize_currency(name)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}
