//! Conversions from metadata wire types to directory entries.

use super::wire::{AssetPairResponse, AssetResponse};
use super::{AssetInfo, FeeTier, PairInfo};

impl From<AssetResponse> for AssetInfo {
    fn from(a: AssetResponse) -> Self {
        Self {
            class: a.aclass,
            altname: a.altname,
            decimals: a.decimals,
            display_decimals: a.display_decimals,
            status: a.status.unwrap_or_default(),
        }
    }
}

fn tiers(raw: Vec<[f64; 2]>) -> Vec<FeeTier> {
    raw.into_iter()
        .map(|[volume, percent]| FeeTier { volume, percent })
        .collect()
}

impl From<AssetPairResponse> for PairInfo {
    fn from(p: AssetPairResponse) -> Self {
        // Dark-pool pairs have no websocket name; fall back to the display name.
        let wire_name = p.wsname.unwrap_or_else(|| p.altname.clone());
        Self {
            display_name: p.altname,
            wire_name,
            base: p.base,
            quote: p.quote,
            cost_decimals: p.cost_decimals,
            price_decimals: p.pair_decimals,
            lot_decimals: p.lot_decimals,
            fees_taker: tiers(p.fees),
            fees_maker: tiers(p.fees_maker),
            status: p.status.unwrap_or_default(),
        }
    }
}
