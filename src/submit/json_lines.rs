//! Newline-delimited JSON output, one object per submitted record.

use super::{JobProgress, LogLevel, Submitter, Trade, Transfer};
use crate::error::SubmitError;
use async_lock::Mutex;
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Trade(&'a Trade),
    Transfer(&'a Transfer),
    JobProgress(&'a JobProgress),
    Log { level: LogLevel, message: &'a str },
}

/// Writes records as JSON lines to any writer, flushing after each line.
///
/// The writer is a blocking `std::io::Write`; each line is written and flushed
/// while the async lock is held, on whichever task submitted it.
pub struct JsonLinesSubmitter<W> {
    out: Mutex<W>,
}

impl JsonLinesSubmitter<std::io::Stdout> {
    /// Lines go to the process's stdout. Writes block the calling task until
    /// the line is flushed, which is fine for a CLI feeding a pipe.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSubmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_line(&self, line: Line<'_>) -> Result<(), SubmitError> {
        let mut buf = serde_json::to_vec(&line)?;
        buf.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> Submitter for JsonLinesSubmitter<W> {
    async fn submit_trade(&self, trade: Trade) -> Result<(), SubmitError> {
        self.write_line(Line::Trade(&trade)).await
    }

    async fn submit_transfer(&self, transfer: Transfer) -> Result<(), SubmitError> {
        self.write_line(Line::Transfer(&transfer)).await
    }

    async fn show_job_progress(&self, job: JobProgress) -> Result<(), SubmitError> {
        self.write_line(Line::JobProgress(&job)).await
    }

    async fn app_log(&self, level: LogLevel, message: String) -> Result<(), SubmitError> {
        self.write_line(Line::Log {
            level,
            message: &message,
        })
        .await
    }
}
