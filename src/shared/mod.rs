//! Shared helpers used across all domain modules.

pub mod currency;
pub mod serde_util;

pub use currency::normalize_currency;
pub use serde_util::from_unix_seconds;
