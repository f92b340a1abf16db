//! Trade reconciliation: one executed trade plus its ledger lines in, one
//! normalized trade out.

use crate::domain::asset::Directory;
use crate::domain::ledger::LedgerKind;
use crate::domain::trade::TradeRec;
use crate::error::IntegrityError;
use crate::submit::{OrderType, Trade, TradeProps, TxAction};
use rust_decimal::Decimal;

/// Normalizes `trade`, apportioning amounts and fees over its resolved ledger lines.
///
/// Base-asset lines carry the traded volume and base fee; quote-asset lines
/// the quote fee. On a margin trade, fees settled in a third asset count as
/// base fee and move the fee currency to that asset. Without any base volume
/// from the ledger the exchange-quoted volume is used.
pub fn reconcile_trade(
    trade: &TradeRec,
    directory: &Directory,
    account: &str,
) -> Result<Trade, IntegrityError> {
    let pair = directory
        .pair(&trade.pair)
        .ok_or_else(|| IntegrityError::UnknownPair {
            trade_id: trade.id.clone(),
            pair: trade.pair.clone(),
        })?;
    let unknown_asset = |asset: &str| IntegrityError::UnknownAsset {
        trade_id: trade.id.clone(),
        pair: trade.pair.clone(),
        asset: asset.to_string(),
    };
    let base = directory
        .asset(&pair.base)
        .ok_or_else(|| unknown_asset(pair.base.as_str()))?;
    let quote = directory
        .asset(&pair.quote)
        .ok_or_else(|| unknown_asset(pair.quote.as_str()))?;

    let base_symbol = directory.canonical(&pair.base).to_string();
    let quote_symbol = directory.canonical(&pair.quote).to_string();

    let is_margin = trade.ledgers.iter().any(|l| l.kind == LedgerKind::Margin);

    let mut amount = Decimal::ZERO;
    let mut fee = Decimal::ZERO;
    let mut quote_fee = Decimal::ZERO;
    let mut fee_currency = base_symbol.clone();
    let mut fee_decimals = base.decimals;

    for line in &trade.ledgers {
        if line.asset == pair.base {
            amount += line.amount.abs();
            fee += line.fee.abs();
        } else if line.asset == pair.quote {
            quote_fee += line.fee.abs();
        } else if is_margin {
            fee += line.fee.abs();
            fee_currency = directory.canonical(&line.asset).to_string();
            fee_decimals = directory.decimals(&line.asset);
        }
    }

    if amount.is_zero() {
        amount = trade.volume.abs();
    }

    Ok(Trade {
        tx_id: trade.id.clone(),
        ts: trade.timestamp,
        account: account.to_string(),
        ticker: pair.wire_name.clone(),
        asset: base_symbol,
        price: trade.price,
        amount,
        value: trade.cost,
        action: if trade.is_sell() {
            TxAction::Sell
        } else {
            TxAction::Buy
        },
        order_type: if trade.is_limit() {
            OrderType::Maker
        } else {
            OrderType::Taker
        },
        order_id: trade.order_id.clone(),
        fee,
        fee_currency,
        quote_fee,
        quote_fee_currency: quote_symbol.clone(),
        quote: quote_symbol,
        asset_decimals: base.decimals,
        quote_decimals: quote.decimals,
        fee_decimals,
        quote_fee_decimals: quote.decimals,
        props: TradeProps::spot(is_margin),
        comment: String::new(),
        plugin: String::new(),
        plugin_version: String::new(),
        created: None,
    })
}
