//! On-disk response cache.
//!
//! One file per `(label, key)`: `<dir>/<label>_<key>.json`, holding the raw
//! `result` JSON exactly as the exchange returned it. Entries never expire.

use crate::error::CacheError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Nothing is created until the first read or write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: &str, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", sanitize(label), sanitize(key)))
    }

    /// The cached body for `key`, or `None` on a miss.
    pub fn read(&self, label: &str, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_dir()?;
        let path = self.path_for(label, key);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Writes through a temporary file so readers never see a partial entry.
    pub fn write(&self, label: &str, key: &str, body: &str) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let path = self.path_for(label, key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |p: &Path, source| CacheError::Io {
            path: p.display().to_string(),
            source,
        };
        fs::write(&tmp, body).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.display().to_string(),
            source,
        })
    }
}

/// Keeps file names portable; labels are user-chosen.
pub(crate) fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(tmp.path().join("cache"));

        assert_eq!(cache.read("main", "ledgers_0_0").unwrap(), None);
        assert!(cache.dir().is_dir(), "directory is created on first use");

        cache.write("main", "ledgers_0_0", r#"{"ledger":{}}"#).unwrap();
        assert_eq!(
            cache.read("main", "ledgers_0_0").unwrap().as_deref(),
            Some(r#"{"ledger":{}}"#)
        );
    }

    #[test]
    fn test_labels_are_disjoint() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(tmp.path());
        cache.write("alice", "k", "1").unwrap();
        assert_eq!(cache.read("bob", "k").unwrap(), None);
    }

    #[test]
    fn test_path_sanitizes_label() {
        let cache = ResponseCache::new("/tmp/c");
        let path = cache.path_for("my account/1", "trades_0_0_50");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "my_account_1_trades_0_0_50.json"
        );
    }
}
