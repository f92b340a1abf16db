//! Conversion: (id, LedgerEntryResponse) → LedgerRec.

use super::wire::LedgerEntryResponse;
use super::{LedgerKind, LedgerRec, ValidationError};
use crate::shared::from_unix_seconds;

impl TryFrom<(String, LedgerEntryResponse)> for LedgerRec {
    type Error = ValidationError;

    fn try_from((id, entry): (String, LedgerEntryResponse)) -> Result<Self, Self::Error> {
        let timestamp = from_unix_seconds(entry.time).ok_or_else(|| {
            ValidationError::InvalidTimestamp {
                id: id.clone(),
                time: entry.time,
            }
        })?;

        Ok(Self {
            id,
            ref_id: entry.refid,
            timestamp,
            kind: LedgerKind::from(entry.kind),
            subtype: entry.subtype,
            asset_class: entry.aclass,
            asset: entry.asset,
            amount: entry.amount,
            fee: entry.fee,
            balance: entry.balance,
        })
    }
}
