//! End-to-end fetch runs against an in-memory exchange.
//!
//! The fake serves fixed ledger and trade pages by offset and counts every
//! call, so pagination, caching and reconciliation are checked without network.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use kraken_import::prelude::*;
use kraken_import::submit::Submitted;

// ─── Fake exchange ───────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeApi {
    ledger_pages: HashMap<usize, Value>,
    trade_pages: HashMap<usize, Value>,
    /// Ledger offsets that answer with an error instead of a page.
    failing_ledger_offsets: Vec<usize>,
    ledger_calls: Mutex<Vec<usize>>,
    trade_calls: Mutex<Vec<usize>>,
    metadata_calls: AtomicUsize,
}

impl FakeApi {
    fn ledger_offsets(&self) -> Vec<usize> {
        self.ledger_calls.lock().unwrap().clone()
    }

    fn trade_offsets(&self) -> Vec<usize> {
        self.trade_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeApi for FakeApi {
    async fn assets(&self) -> Result<String, HttpError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "XXBT": {"aclass": "currency", "altname": "XBT", "decimals": 10, "display_decimals": 5, "status": "enabled"},
            "ZEUR": {"aclass": "currency", "altname": "EUR", "decimals": 4, "display_decimals": 2, "status": "enabled"},
            "ZUSD": {"aclass": "currency", "altname": "USD", "decimals": 4, "display_decimals": 2, "status": "enabled"}
        })
        .to_string())
    }

    async fn asset_pairs(&self) -> Result<String, HttpError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "XXBTZEUR": {
                "altname": "XBTEUR", "wsname": "XBT/EUR",
                "aclass_base": "currency", "base": "XXBT",
                "aclass_quote": "currency", "quote": "ZEUR",
                "cost_decimals": 5, "pair_decimals": 1, "lot_decimals": 8,
                "fees": [[0, 0.26]], "fees_maker": [[0, 0.16]], "status": "online"
            }
        })
        .to_string())
    }

    async fn trades_history(
        &self,
        _start: i64,
        _end: i64,
        offset: usize,
    ) -> Result<String, HttpError> {
        self.trade_calls.lock().unwrap().push(offset);
        let page = self
            .trade_pages
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| json!({"trades": {}, "count": 0}));
        Ok(page.to_string())
    }

    async fn ledgers(&self, _start: i64, offset: usize) -> Result<String, HttpError> {
        self.ledger_calls.lock().unwrap().push(offset);
        if self.failing_ledger_offsets.contains(&offset) {
            return Err(HttpError::Unauthorized("EAPI:Invalid nonce".to_string()));
        }
        let page = self
            .ledger_pages
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| json!({"ledger": {}, "count": 0}));
        Ok(page.to_string())
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn entry(refid: &str, time: f64, kind: &str, asset: &str, amount: &str, fee: &str) -> Value {
    json!({
        "refid": refid, "time": time, "type": kind, "subtype": "", "aclass": "currency",
        "asset": asset, "amount": amount, "fee": fee, "balance": "0"
    })
}

/// Page 0: six lines. Page 6: one repeat and one new spend. Page 7: repeats only.
fn ledger_pages() -> HashMap<usize, Value> {
    let deposit = entry("D1", 1000.0, "deposit", "ZEUR", "1000.0000", "0.0000");
    HashMap::from([
        (
            0,
            json!({"ledger": {
                "L-DEP": deposit.clone(),
                "L-WDR": entry("W1", 1100.0, "withdrawal", "XXBT", "-0.0100000000", "0.0005000000"),
                "L-SPEND": entry("R1", 1200.0, "spend", "ZEUR", "-100.00", "0"),
                "L-RECV": entry("R1", 1200.5, "receive", "XXBT", "0.002", "0.00001"),
                "L-TB": entry("TR1", 1300.0, "trade", "XXBT", "0.5", "0"),
                "L-TQ": entry("TR1", 1300.0, "trade", "ZEUR", "-15000.0000", "24.0000")
            }, "count": 7}),
        ),
        (
            6,
            json!({"ledger": {
                "L-DEP": deposit.clone(),
                "L-SPEND2": entry("R2", 1400.0, "spend", "ZEUR", "-50.00", "0")
            }, "count": 7}),
        ),
        (7, json!({"ledger": {"L-DEP": deposit}, "count": 7})),
    ])
}

fn trade_pages() -> HashMap<usize, Value> {
    HashMap::from([(
        0,
        json!({"trades": {
            "TR1": {
                "ordertxid": "O1", "pair": "XXBTZEUR", "time": 1300.0, "type": "buy",
                "ordertype": "market", "price": "30000.0", "cost": "15000.00000",
                "fee": "24.00000", "vol": "0.50000000", "margin": "0", "misc": "",
                "ledgers": ["L-TB", "L-TQ"]
            },
            "TR2": {
                "ordertxid": "O2", "pair": "XXBTZEUR", "time": 1500.0, "type": "sell",
                "ordertype": "limit", "price": "31000.0", "cost": "3100.00000",
                "fee": "4.96000", "vol": "0.10000000", "margin": "0", "misc": ""
            }
        }, "count": 2}),
    )])
}

fn full_api() -> Arc<FakeApi> {
    Arc::new(FakeApi {
        ledger_pages: ledger_pages(),
        trade_pages: trade_pages(),
        ..Default::default()
    })
}

async fn fetcher(
    api: Arc<FakeApi>,
    sink: Arc<MemorySubmitter>,
    cache: &Path,
) -> Fetcher<Arc<FakeApi>> {
    Fetcher::builder("main", api, sink)
        .limiter(Arc::new(RateLimiter::new(1000, Duration::from_secs(1))))
        .cache_dir(cache)
        .build()
        .await
        .unwrap()
}

fn trade<'a>(submitted: &'a Submitted, id: &str) -> &'a Trade {
    submitted
        .trades
        .iter()
        .find(|t| t.tx_id == id)
        .unwrap_or_else(|| panic!("trade {} not submitted", id))
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ledger_dedups_and_stops_on_first_empty_page() {
    let tmp = tempfile::tempdir().unwrap();
    let api = full_api();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api.clone(), sink.clone(), tmp.path()).await;

    let outcome = f.ledger(None).await.unwrap();

    assert_eq!(api.ledger_offsets(), vec![0, 6, 7]);
    assert_eq!(outcome.records.len(), 7);
    assert_eq!(outcome.report.pages, 3);
    assert_eq!(outcome.report.next_offset, 7);
    assert_eq!(outcome.report.processed, 2);
    assert_eq!(outcome.report.synthesized, 1);
    assert_eq!(outcome.report.skipped, 1);
    assert!(outcome.report.is_complete());

    // Newest first within a page.
    let first_page: Vec<_> = outcome.records[..6].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(first_page[0], "L-TB");
    assert_eq!(first_page[5], "L-DEP");
}

#[tokio::test]
async fn test_ledger_emits_transfers() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(full_api(), sink.clone(), tmp.path()).await;
    f.ledger(None).await.unwrap();

    let submitted = sink.snapshot();
    assert_eq!(submitted.transfers.len(), 2);

    let withdrawal = submitted
        .transfers
        .iter()
        .find(|t| t.tx_id == "L-WDR")
        .unwrap();
    assert_eq!(withdrawal.action, TransferAction::Withdrawal);
    assert_eq!(withdrawal.source, "main");
    assert!(withdrawal.destination.is_empty());
    assert_eq!(withdrawal.asset, "BTC");
    assert_eq!(withdrawal.asset_decimals, 10);
    assert_eq!(withdrawal.amount.to_string(), "0.0100000000");
    assert_eq!(withdrawal.fee.to_string(), "0.0005000000");
    assert_eq!(withdrawal.fee_currency, "BTC");
    assert!(withdrawal.created.is_some());
    assert_eq!(withdrawal.plugin, PluginInfo::default().id);

    let deposit = submitted
        .transfers
        .iter()
        .find(|t| t.tx_id == "L-DEP")
        .unwrap();
    assert_eq!(deposit.action, TransferAction::Deposit);
    assert_eq!(deposit.destination, "main");
    assert_eq!(deposit.asset, "EUR");
}

#[tokio::test]
async fn test_ledger_composes_card_purchase() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(full_api(), sink.clone(), tmp.path()).await;
    f.ledger(None).await.unwrap();

    let submitted = sink.snapshot();
    let r1 = trade(&submitted, "R1");
    assert_eq!(r1.asset, "BTC");
    assert_eq!(r1.quote, "EUR");
    assert_eq!(r1.price.to_string(), "50000");
    assert_eq!(r1.amount.to_string(), "0.002");
    assert_eq!(r1.value.to_string(), "100.00");
    assert_eq!(r1.fee.to_string(), "0.00001");
    assert_eq!(r1.fee_currency, "BTC");
    assert_eq!(r1.asset_decimals, 10);
    assert_eq!(r1.quote_decimals, 4);
    assert_eq!(r1.order_id, "L-SPEND");

    // R2 has no receive line.
    assert!(submitted.trades.iter().all(|t| t.tx_id != "R2"));
    let errors = submitted.logs_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("R2"));
}

#[tokio::test]
async fn test_spend_without_receive_logs_one_error() {
    let tmp = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi {
        ledger_pages: HashMap::from([(
            0,
            json!({"ledger": {
                "L-SPEND": entry("R1", 1200.0, "spend", "ZEUR", "-100.00", "0")
            }, "count": 1}),
        )]),
        ..Default::default()
    });
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api, sink.clone(), tmp.path()).await;

    let outcome = f.ledger(None).await.unwrap();
    assert_eq!(outcome.report.synthesized, 0);
    assert_eq!(outcome.report.skipped, 1);

    let submitted = sink.snapshot();
    assert!(submitted.trades.is_empty());
    let errors = submitted.logs_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("R1"));
}

#[tokio::test]
async fn test_transport_error_aborts_and_closes_job() {
    let tmp = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi {
        ledger_pages: ledger_pages(),
        failing_ledger_offsets: vec![6],
        ..Default::default()
    });
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api, sink.clone(), tmp.path()).await;

    let err = f.ledger(None).await.unwrap_err();
    assert!(matches!(err, ImportError::Http(HttpError::Unauthorized(_))));

    let submitted = sink.snapshot();
    // The first page was processed, conversions were never composed.
    assert_eq!(submitted.transfers.len(), 2);
    assert!(submitted.trades.is_empty());
    assert_eq!(submitted.progress.last().unwrap().progress, 100);
    let errors = submitted.logs_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("after 2 transfers"));

    // Nothing was cached for the failing page.
    assert!(!tmp.path().join("main_ledgers_0_6.json").exists());
    assert!(tmp.path().join("main_ledgers_0_0.json").exists());
}

#[tokio::test]
async fn test_submission_failure_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySubmitter::failing_after(1));
    let f = fetcher(full_api(), sink.clone(), tmp.path()).await;

    let err = f.ledger(None).await.unwrap_err();
    assert!(matches!(err, ImportError::Submit(SubmitError::Rejected(_))));
    assert_eq!(sink.snapshot().transfers.len(), 1);
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rerun_over_same_range_is_served_from_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let api = full_api();

    let first = fetcher(api.clone(), Arc::new(MemorySubmitter::new()), tmp.path()).await;
    let a = first.ledger(None).await.unwrap();
    let calls_after_first = api.ledger_offsets().len();

    let second = fetcher(api.clone(), Arc::new(MemorySubmitter::new()), tmp.path()).await;
    let b = second.ledger(None).await.unwrap();

    assert_eq!(api.ledger_offsets().len(), calls_after_first);
    assert_eq!(a.records, b.records);
    assert_eq!(a.report, b.report);
}

// ─── Trades ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_run_reconciles_trades_against_ledger() {
    let tmp = tempfile::tempdir().unwrap();
    let api = full_api();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api.clone(), sink.clone(), tmp.path()).await;

    let report = f.run(None).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.trades.processed, 2);
    assert_eq!(api.trade_offsets(), vec![0, 2]);

    let submitted = sink.snapshot();
    let tr1 = trade(&submitted, "TR1");
    assert_eq!(tr1.ticker, "XBT/EUR");
    assert_eq!(tr1.action, TxAction::Buy);
    assert_eq!(tr1.order_type, OrderType::Taker);
    assert_eq!(tr1.amount.to_string(), "0.5");
    assert_eq!(tr1.quote_fee.to_string(), "24.0000");
    assert_eq!(tr1.quote_fee_currency, "EUR");
    assert_eq!(tr1.value.to_string(), "15000.00000");

    // No ledger references: exchange-quoted volume.
    let tr2 = trade(&submitted, "TR2");
    assert_eq!(tr2.action, TxAction::Sell);
    assert_eq!(tr2.order_type, OrderType::Maker);
    assert_eq!(tr2.amount.to_string(), "0.10000000");

    let infos = submitted.logs_at(LogLevel::Info);
    assert!(infos.iter().any(|m| m.contains("Fetched 2 new trades from main")));
    assert!(infos.iter().any(|m| m.contains("Fetched 2 new transfers from main")));
}

#[tokio::test]
async fn test_trades_without_ledger_or_snapshot_fall_back_to_volume() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(full_api(), sink.clone(), tmp.path()).await;

    let report = f.trades(None, &[]).await.unwrap();
    assert_eq!(report.processed, 2);

    let submitted = sink.snapshot();
    let tr1 = trade(&submitted, "TR1");
    assert_eq!(tr1.amount.to_string(), "0.50000000");
    assert!(tr1.quote_fee.is_zero());
}

#[tokio::test]
async fn test_trades_reuse_ledger_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let api = full_api();

    let first = fetcher(api.clone(), Arc::new(MemorySubmitter::new()), tmp.path()).await;
    first.run(None).await.unwrap();
    assert!(tmp.path().join("main_ledger.json").is_file());

    let sink = Arc::new(MemorySubmitter::new());
    let second = fetcher(api, sink.clone(), tmp.path()).await;
    second.trades(None, &[]).await.unwrap();

    let submitted = sink.snapshot();
    assert_eq!(trade(&submitted, "TR1").amount.to_string(), "0.5");
}

fn fill(order: &str, time: f64, vol: &str) -> Value {
    json!({
        "ordertxid": order, "pair": "XXBTZEUR", "time": time, "type": "buy",
        "ordertype": "market", "price": "30000.0", "cost": "30.00000",
        "fee": "0.05000", "vol": vol, "margin": "0", "misc": ""
    })
}

#[tokio::test]
async fn test_trade_pages_dedup_and_stop_on_first_repeat_page() {
    let tmp = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi {
        trade_pages: HashMap::from([
            (
                0,
                json!({"trades": {
                    "TR1": fill("O1", 1300.0, "0.00100000"),
                    "TR2": fill("O2", 1310.0, "0.00200000")
                }, "count": 3}),
            ),
            (
                2,
                json!({"trades": {
                    "TR1": fill("O1", 1300.0, "0.00100000"),
                    "TR3": fill("O3", 1320.0, "0.00300000")
                }, "count": 3}),
            ),
            (
                3,
                json!({"trades": {"TR1": fill("O1", 1300.0, "0.00100000")}, "count": 3}),
            ),
        ]),
        ..Default::default()
    });
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api.clone(), sink.clone(), tmp.path()).await;

    let report = f.trades(None, &[]).await.unwrap();
    assert_eq!(api.trade_offsets(), vec![0, 2, 3]);
    assert_eq!(report.processed, 3);
    assert_eq!(report.pages, 3);
    assert_eq!(report.next_offset, 3);

    let submitted = sink.snapshot();
    assert_eq!(submitted.trades.len(), 3);
    assert_eq!(submitted.trades.iter().filter(|t| t.tx_id == "TR1").count(), 1);
    assert_eq!(trade(&submitted, "TR3").amount.to_string(), "0.00300000");
}

#[tokio::test]
async fn test_corrupt_snapshot_still_reports_and_closes_job() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("main_ledger.json"), "not json").unwrap();
    let api = full_api();
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api.clone(), sink.clone(), tmp.path()).await;

    let err = f.trades(None, &[]).await.unwrap_err();
    assert!(matches!(err, ImportError::Cache(CacheError::Corrupt { .. })));
    assert!(api.trade_offsets().is_empty());

    let submitted = sink.snapshot();
    assert!(submitted.trades.is_empty());
    assert_eq!(submitted.progress.first().unwrap().progress, -1);
    assert_eq!(submitted.progress.last().unwrap().progress, 100);
    let errors = submitted.logs_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Fetching trades from main failed after 0 trades"));
}

#[tokio::test]
async fn test_unknown_pair_stops_run_without_error() {
    let tmp = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi {
        trade_pages: HashMap::from([(
            0,
            json!({"trades": {
                "TX": {
                    "ordertxid": "O9", "pair": "XETHZJPY", "time": 2000.0, "type": "buy",
                    "ordertype": "market", "price": "1", "cost": "1", "fee": "0", "vol": "1"
                }
            }, "count": 1}),
        )]),
        ..Default::default()
    });
    let sink = Arc::new(MemorySubmitter::new());
    let f = fetcher(api.clone(), sink.clone(), tmp.path()).await;

    let report = f.trades(None, &[]).await.unwrap();
    assert_eq!(
        report.aborted,
        Some(IntegrityError::UnknownPair {
            trade_id: "TX".to_string(),
            pair: "XETHZJPY".to_string(),
        })
    );
    assert_eq!(report.processed, 0);
    assert_eq!(api.trade_offsets(), vec![0]);

    let submitted = sink.snapshot();
    assert!(submitted.trades.is_empty());
    assert_eq!(submitted.progress.last().unwrap().progress, 100);
    let errors = submitted.logs_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("XETHZJPY"));
}

#[tokio::test]
async fn test_directory_loads_once_per_fetcher() {
    let tmp = tempfile::tempdir().unwrap();
    let api = full_api();
    let f = fetcher(api.clone(), Arc::new(MemorySubmitter::new()), tmp.path()).await;
    f.run(None).await.unwrap();

    assert_eq!(api.metadata_calls.load(Ordering::SeqCst), 2);
    assert_eq!(f.directory().asset_count(), 3);
    assert_eq!(f.directory().pair_count(), 1);
}
