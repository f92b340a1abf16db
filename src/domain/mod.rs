//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Flat domain records the reconciliation core works with
//! - `wire.rs`: Raw serde structs matching exchange responses
//! - `convert.rs`: `TryFrom`/`From` conversions with validation

pub mod asset;
pub mod ledger;
pub mod trade;
