//! Conversions from wire types to domain types for trades.

use super::wire::TradeEntryResponse;
use super::{TradeRec, ValidationError};
use crate::shared::from_unix_seconds;

impl TryFrom<(String, TradeEntryResponse)> for TradeRec {
    type Error = ValidationError;

    fn try_from((id, t): (String, TradeEntryResponse)) -> Result<Self, Self::Error> {
        let timestamp = from_unix_seconds(t.time)
            .ok_or_else(|| ValidationError::InvalidTimestamp(id.clone()))?;

        Ok(Self {
            id,
            order_id: t.ordertxid,
            pair: t.pair,
            side: t.side,
            order_type: t.ordertype,
            timestamp,
            price: t.price,
            volume: t.vol,
            cost: t.cost,
            fee: t.fee,
            margin: t.margin,
            misc: t.misc,
            ledger_ids: t.ledgers,
            ledgers: Vec::new(),
        })
    }
}
