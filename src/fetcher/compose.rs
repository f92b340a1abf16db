//! Synthetic trades from spend/receive ledger pairs.
//!
//! Conversions that bypass the order book (card purchases, instant buys) only
//! show up in the ledger, as a `spend` line in one asset and a `receive` line
//! in another sharing a reference id.

use crate::domain::asset::Directory;
use crate::domain::ledger::{LedgerKind, LedgerRec};
use crate::submit::{OrderType, Trade, TradeProps, TxAction};
use chrono::Duration;
use thiserror::Error;

pub const CONVERSION_COMMENT: &str = "Credit card purchase";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Failed to find spend and receive ledger records to compose a trade (RefID = {ref_id})")]
    Unpaired { ref_id: String },

    #[error("Receive amount of zero, cannot price conversion (RefID = {ref_id})")]
    ZeroReceive { ref_id: String },
}

impl ComposeError {
    pub fn ref_id(&self) -> &str {
        match self {
            ComposeError::Unpaired { ref_id } | ComposeError::ZeroReceive { ref_id } => ref_id,
        }
    }
}

/// The first spend and the first receive line of a group.
pub fn pair_conversion<'a>(
    ref_id: &str,
    lines: &'a [LedgerRec],
) -> Result<(&'a LedgerRec, &'a LedgerRec), ComposeError> {
    let spend = lines.iter().find(|l| l.kind == LedgerKind::Spend);
    let receive = lines.iter().find(|l| l.kind == LedgerKind::Receive);
    match (spend, receive) {
        (Some(s), Some(r)) => Ok((s, r)),
        _ => Err(ComposeError::Unpaired {
            ref_id: ref_id.to_string(),
        }),
    }
}

/// Builds the trade for one spend/receive pair: the received asset is bought
/// with the spent one.
pub fn compose_conversion(
    ref_id: &str,
    spend: &LedgerRec,
    receive: &LedgerRec,
    directory: &Directory,
    account: &str,
) -> Result<Trade, ComposeError> {
    let spent = spend.amount.abs();
    let received = receive.amount.abs();

    let price = spent
        .checked_div(received)
        .ok_or_else(|| ComposeError::ZeroReceive {
            ref_id: ref_id.to_string(),
        })?
        .normalize();

    let base = directory.canonical(&receive.asset).to_string();
    let quote = directory.canonical(&spend.asset).to_string();
    let base_decimals = directory.decimals(&receive.asset);
    let quote_decimals = directory.decimals(&spend.asset);

    Ok(Trade {
        tx_id: ref_id.to_string(),
        ts: spend.timestamp + Duration::milliseconds(1),
        account: account.to_string(),
        ticker: format!("{}/{}", base, quote),
        price,
        amount: received,
        value: spent,
        action: TxAction::Buy,
        order_type: OrderType::Taker,
        order_id: spend.id.clone(),
        fee: receive.fee.abs(),
        fee_currency: base.clone(),
        quote_fee: spend.fee.abs(),
        quote_fee_currency: quote.clone(),
        asset_decimals: base_decimals,
        quote_decimals,
        fee_decimals: base_decimals,
        quote_fee_decimals: quote_decimals,
        props: TradeProps::spot(false),
        comment: CONVERSION_COMMENT.to_string(),
        asset: base,
        quote,
        plugin: String::new(),
        plugin_version: String::new(),
        created: None,
    })
}
