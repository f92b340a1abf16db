//! Live checks against the public Kraken endpoints.
//!
//! All tests are `#[ignore]` because they require network access.
//!
//! Run with:
//! ```bash
//! cargo test --test http_live -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use kraken_import::prelude::*;

const TEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
#[ignore]
async fn test_directory_loads_from_public_endpoints() {
    let http = KrakenHttp::new(DEFAULT_API_URL).expect("client should build");
    let limiter = RateLimiter::kraken();

    let directory = timeout(TEST_TIMEOUT, Directory::load(&http, &limiter))
        .await
        .expect("timed out")
        .expect("directory should load");

    assert!(directory.asset_count() > 10);
    assert!(directory.pair_count() > 10);

    let btc = directory.asset("XXBT").expect("XXBT should be listed");
    assert_eq!(btc.altname, "XBT");
    assert_eq!(directory.canonical("XXBT"), "BTC");

    let pair = directory.pair("XXBTZEUR").expect("XXBTZEUR should be listed");
    assert_eq!(pair.base, "XXBT");
    assert_eq!(pair.quote, "ZEUR");
}

#[tokio::test]
#[ignore]
async fn test_private_endpoint_requires_credentials() {
    let http = KrakenHttp::new(DEFAULT_API_URL).expect("client should build");
    let sink = Arc::new(MemorySubmitter::new());
    let fetcher = Fetcher::builder("live", http, sink)
        .cache_dir(std::env::temp_dir().join("kraken-import-live"))
        .build()
        .await
        .expect("directory should load");

    let err = fetcher.ledger(None).await.unwrap_err();
    assert!(matches!(
        err,
        ImportError::Http(HttpError::MissingCredentials(_))
    ));
}
