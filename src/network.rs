//! Network URL constants for the Kraken REST API.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.kraken.com";

/// Public asset metadata.
pub const ASSETS_PATH: &str = "/0/public/Assets";

/// Public trading-pair metadata.
pub const ASSET_PAIRS_PATH: &str = "/0/public/AssetPairs";

/// Private trade history (paginated by `ofs`).
pub const TRADES_HISTORY_PATH: &str = "/0/private/TradesHistory";

/// Private ledger entries (paginated by `ofs`).
pub const LEDGERS_PATH: &str = "/0/private/Ledgers";
