//! The last ledger set seen by a trade run, kept per account.
//!
//! Lets a trade run without a preceding ledger run still apportion fees.

use crate::domain::ledger::LedgerRec;
use crate::error::CacheError;
use crate::transport::sanitize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    path: PathBuf,
}

impl LedgerSnapshot {
    /// `<dir>/<label>_ledger.json`
    pub fn new(dir: &Path, label: &str) -> Self {
        Self {
            path: dir.join(format!("{}_ledger.json", sanitize(label))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<Vec<LedgerRec>>, CacheError> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| CacheError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })
    }

    pub fn save(&self, recs: &[LedgerRec]) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(recs).map_err(|source| CacheError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        fs::write(&self.path, body).map_err(io_err)
    }
}
