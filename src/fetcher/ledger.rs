//! Ledger run: transfers, conversion buffering and synthetic trades.

use super::compose::{compose_conversion, pair_conversion};
use super::job::Job;
use super::{checkpoint_secs, FetchReport, Fetcher};
use crate::domain::ledger::wire::LedgersResponse;
use crate::domain::ledger::{LedgerKind, LedgerRec};
use crate::error::{HttpError, ImportResult};
use crate::submit::{LogLevel, Transfer, TransferAction};
use crate::transport::ExchangeApi;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

/// Result of [`Fetcher::ledger`].
#[derive(Debug, Clone, Default)]
pub struct LedgerOutcome {
    /// Every novel ledger line of the run, newest first per page.
    pub records: Vec<LedgerRec>,
    pub report: FetchReport,
}

#[derive(Default)]
struct LedgerRun {
    seen: HashSet<String>,
    records: Vec<LedgerRec>,
    conversions: BTreeMap<String, Vec<LedgerRec>>,
    report: FetchReport,
}

impl<A: ExchangeApi> Fetcher<A> {
    /// Pages through the ledger from `checkpoint`, submitting deposits and
    /// withdrawals as they arrive and spend/receive pairs once paging is done.
    pub async fn ledger(&self, checkpoint: Option<DateTime<Utc>>) -> ImportResult<LedgerOutcome> {
        let job = Job::open(
            self.submitter.as_ref(),
            &self.plugin.label,
            format!("Fetching newest transfers for account \"{}\"", self.label),
        )
        .await;

        let mut run = LedgerRun::default();
        let mut result = self
            .ledger_pages(checkpoint_secs(checkpoint), &job, &mut run)
            .await;
        if result.is_ok() {
            result = self.submit_conversions(&mut run).await;
        }
        job.close().await;

        match result {
            Ok(()) => {
                tracing::info!(
                    account = %self.label,
                    transfers = run.report.processed,
                    conversions = run.report.synthesized,
                    skipped = run.report.skipped,
                    "Ledger run complete"
                );
                self.app_log(
                    LogLevel::Info,
                    format!(
                        "Fetched {} new transfers from {}.",
                        run.report.processed, self.label
                    ),
                )
                .await;
                Ok(LedgerOutcome {
                    records: run.records,
                    report: run.report,
                })
            }
            Err(e) => {
                tracing::error!(account = %self.label, error = %e, "Ledger run failed");
                self.app_log(
                    LogLevel::Error,
                    format!(
                        "Fetching transfers from {} failed after {} transfers at offset {}: {}",
                        self.label, run.report.processed, run.report.next_offset, e
                    ),
                )
                .await;
                Err(e)
            }
        }
    }

    async fn ledger_pages(&self, start: i64, job: &Job<'_>, run: &mut LedgerRun) -> ImportResult<()> {
        loop {
            let offset = run.report.next_offset;
            let body = self.transport.fetch_ledger_page(start, offset).await?;
            let page: LedgersResponse =
                serde_json::from_str(&body).map_err(|e| HttpError::Malformed(e.to_string()))?;
            run.report.pages += 1;

            let mut novel = Vec::new();
            for (id, entry) in page.ledger {
                if run.seen.insert(id.clone()) {
                    let rec = LedgerRec::try_from((id, entry))
                        .map_err(|e| HttpError::Malformed(e.to_string()))?;
                    novel.push(rec);
                }
            }

            tracing::debug!(account = %self.label, offset, novel = novel.len(), "Ledger page");
            if novel.is_empty() {
                break;
            }
            run.report.next_offset += novel.len();

            novel.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));

            for rec in novel {
                match rec.kind {
                    LedgerKind::Deposit | LedgerKind::Withdrawal => {
                        let mut transfer = self.transfer(&rec);
                        transfer.stamp(&self.plugin);
                        self.submitter.submit_transfer(transfer).await?;
                        run.report.processed += 1;
                    }
                    LedgerKind::Spend | LedgerKind::Receive => {
                        run.conversions
                            .entry(rec.ref_id.clone())
                            .or_default()
                            .push(rec.clone());
                    }
                    _ => {}
                }
                run.records.push(rec);
            }

            job.update(format!(
                "Fetched {} transfers for account \"{}\"",
                run.report.processed, self.label
            ))
            .await;
        }
        Ok(())
    }

    async fn submit_conversions(&self, run: &mut LedgerRun) -> ImportResult<()> {
        for (ref_id, lines) in &run.conversions {
            let composed = pair_conversion(ref_id, lines).and_then(|(spend, receive)| {
                compose_conversion(ref_id, spend, receive, &self.directory, &self.label)
            });

            match composed {
                Ok(mut trade) => {
                    trade.stamp(&self.plugin);
                    self.submitter.submit_trade(trade).await?;
                    run.report.synthesized += 1;
                }
                Err(e) => {
                    tracing::error!(account = %self.label, ref_id = %e.ref_id(), "{}", e);
                    self.app_log(LogLevel::Error, e.to_string()).await;
                    run.report.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn transfer(&self, rec: &LedgerRec) -> Transfer {
        let asset = self.directory.canonical(&rec.asset).to_string();
        let decimals = self.directory.decimals(&rec.asset);
        let (action, source, destination) = if rec.kind == LedgerKind::Deposit {
            (TransferAction::Deposit, String::new(), self.label.clone())
        } else {
            (TransferAction::Withdrawal, self.label.clone(), String::new())
        };

        Transfer {
            tx_id: rec.id.clone(),
            ts: rec.timestamp,
            account: self.label.clone(),
            action,
            source,
            destination,
            fee_currency: asset.clone(),
            asset,
            asset_decimals: decimals,
            amount: rec.amount.abs(),
            fee: rec.fee.abs(),
            fee_decimals: decimals,
            plugin: String::new(),
            plugin_version: String::new(),
            created: None,
        }
    }
}
