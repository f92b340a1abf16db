//! Trade run: paginated trade history reconciled against the ledger set.

use super::job::Job;
use super::reconcile::reconcile_trade;
use super::{checkpoint_secs, FetchReport, Fetcher};
use crate::domain::ledger::{LedgerIndex, LedgerRec};
use crate::domain::trade::wire::TradesHistoryResponse;
use crate::domain::trade::TradeRec;
use crate::error::{HttpError, ImportResult};
use crate::submit::LogLevel;
use crate::transport::ExchangeApi;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

impl<A: ExchangeApi> Fetcher<A> {
    /// Pages through trade history from `checkpoint` and submits one trade
    /// per executed fill.
    ///
    /// A non-empty `ledger` replaces the stored snapshot; an empty one is
    /// replaced by the stored snapshot. An unknown pair or asset stops the run early; that is
    /// reported in [`FetchReport::aborted`], not as an error.
    pub async fn trades(
        &self,
        checkpoint: Option<DateTime<Utc>>,
        ledger: &[LedgerRec],
    ) -> ImportResult<FetchReport> {
        let job = Job::open(
            self.submitter.as_ref(),
            &self.plugin.label,
            format!("Fetching newest trades for account \"{}\"", self.label),
        )
        .await;

        let mut report = FetchReport::default();
        let result = match self.ledger_set(ledger) {
            Ok(snapshot) => {
                let index = LedgerIndex::new(snapshot.as_deref().unwrap_or(ledger));
                self.trade_pages(checkpoint_secs(checkpoint), &index, &job, &mut report)
                    .await
            }
            Err(e) => Err(e),
        };
        job.close().await;

        match (&result, &report.aborted) {
            (Ok(()), None) => {
                tracing::info!(account = %self.label, trades = report.processed, "Trade run complete");
                self.app_log(
                    LogLevel::Info,
                    format!("Fetched {} new trades from {}.", report.processed, self.label),
                )
                .await;
            }
            (Ok(()), Some(cause)) => {
                self.app_log(
                    LogLevel::Error,
                    format!(
                        "Stopped fetching trades from {} after {} trades: {}",
                        self.label, report.processed, cause
                    ),
                )
                .await;
            }
            (Err(e), _) => {
                tracing::error!(account = %self.label, error = %e, "Trade run failed");
                self.app_log(
                    LogLevel::Error,
                    format!(
                        "Fetching trades from {} failed after {} trades at offset {}: {}",
                        self.label, report.processed, report.next_offset, e
                    ),
                )
                .await;
            }
        }

        result.map(|()| report)
    }

    /// `Some(snapshot)` when `ledger` is empty; otherwise `ledger` becomes the
    /// new snapshot and `None` is returned.
    fn ledger_set(&self, ledger: &[LedgerRec]) -> ImportResult<Option<Vec<LedgerRec>>> {
        if ledger.is_empty() {
            return self.load_snapshot().map(Some);
        }
        if let Err(e) = self.snapshot.save(ledger) {
            tracing::warn!(account = %self.label, error = %e, "Failed to write ledger snapshot");
        }
        Ok(None)
    }

    fn load_snapshot(&self) -> ImportResult<Vec<LedgerRec>> {
        match self.snapshot.load()? {
            Some(recs) => {
                tracing::debug!(account = %self.label, lines = recs.len(), "Using ledger snapshot");
                Ok(recs)
            }
            None => {
                tracing::info!(
                    account = %self.label,
                    "No ledger set available, trades use exchange-quoted volumes"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn trade_pages(
        &self,
        start: i64,
        index: &LedgerIndex<'_>,
        job: &Job<'_>,
        report: &mut FetchReport,
    ) -> ImportResult<()> {
        let mut seen = HashSet::new();

        loop {
            let offset = report.next_offset;
            let body = self.transport.fetch_trades_page(start, 0, offset).await?;
            let page: TradesHistoryResponse =
                serde_json::from_str(&body).map_err(|e| HttpError::Malformed(e.to_string()))?;
            report.pages += 1;

            let mut novel = Vec::new();
            for (id, entry) in page.trades {
                if seen.insert(id.clone()) {
                    let mut rec = TradeRec::try_from((id, entry))
                        .map_err(|e| HttpError::Malformed(e.to_string()))?;
                    rec.resolve_ledgers(index);
                    novel.push(rec);
                }
            }

            tracing::debug!(account = %self.label, offset, novel = novel.len(), "Trade page");
            if novel.is_empty() {
                break;
            }
            report.next_offset += novel.len();

            novel.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));

            for rec in &novel {
                let mut trade = match reconcile_trade(rec, &self.directory, &self.label) {
                    Ok(trade) => trade,
                    Err(cause) => {
                        tracing::error!(account = %self.label, trade = %rec.id, "{}", cause);
                        report.aborted = Some(cause);
                        return Ok(());
                    }
                };
                trade.stamp(&self.plugin);
                self.submitter.submit_trade(trade).await?;
                report.processed += 1;
            }

            job.update(format!(
                "Fetched {} trades for account \"{}\"",
                report.processed, self.label
            ))
            .await;
        }
        Ok(())
    }
}
