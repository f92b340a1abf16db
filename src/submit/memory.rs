//! In-memory submitter for embedding hosts and tests.

use super::{JobProgress, LogLevel, Submitter, Trade, Transfer};
use crate::error::SubmitError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Everything a [`MemorySubmitter`] has accepted, in submission order per kind.
#[derive(Debug, Clone, Default)]
pub struct Submitted {
    pub trades: Vec<Trade>,
    pub transfers: Vec<Transfer>,
    pub progress: Vec<JobProgress>,
    pub logs: Vec<(LogLevel, String)>,
}

impl Submitted {
    pub fn logs_at(&self, level: LogLevel) -> Vec<&str> {
        self.logs
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

/// Collects records instead of forwarding them.
///
/// `fail_after` rejects every trade/transfer once that many have been accepted.
#[derive(Debug, Default)]
pub struct MemorySubmitter {
    inner: Mutex<Submitted>,
    fail_after: Option<usize>,
}

impl MemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(records: usize) -> Self {
        Self {
            inner: Mutex::new(Submitted::default()),
            fail_after: Some(records),
        }
    }

    pub fn snapshot(&self) -> Submitted {
        self.inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Submitted) -> R) -> Result<R, SubmitError> {
        let mut guard = self.inner.lock().map_err(|_| SubmitError::Closed)?;
        Ok(f(&mut guard))
    }

    fn check_capacity(&self, s: &Submitted) -> Result<(), SubmitError> {
        match self.fail_after {
            Some(limit) if s.trades.len() + s.transfers.len() >= limit => Err(
                SubmitError::Rejected(format!("limit of {} records reached", limit)),
            ),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Submitter for MemorySubmitter {
    async fn submit_trade(&self, trade: Trade) -> Result<(), SubmitError> {
        self.with(|s| {
            self.check_capacity(s)?;
            s.trades.push(trade);
            Ok(())
        })?
    }

    async fn submit_transfer(&self, transfer: Transfer) -> Result<(), SubmitError> {
        self.with(|s| {
            self.check_capacity(s)?;
            s.transfers.push(transfer);
            Ok(())
        })?
    }

    async fn show_job_progress(&self, job: JobProgress) -> Result<(), SubmitError> {
        self.with(|s| s.progress.push(job))
    }

    async fn app_log(&self, level: LogLevel, message: String) -> Result<(), SubmitError> {
        self.with(|s| s.logs.push((level, message)))
    }
}
