//! Application configuration and per-account checkpoints.
//!
//! Settings come from an optional YAML file, overridden by environment
//! variables such as `KRAKEN_IMPORT__CACHE_DIR` or `KRAKEN_IMPORT__DEBUG`.

use crate::error::{CacheError, ConfigError};
use crate::http::{KrakenSigner, RateLimiter};
use crate::network;
use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ENV_PREFIX: &str = "KRAKEN_IMPORT";
const CHECKPOINT_FILE: &str = "checkpoints.json";

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Response cache, ledger snapshots and checkpoints live here.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub plugin: PluginInfo,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

fn default_api_url() -> String {
    network::DEFAULT_API_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cache_dir: default_cache_dir(),
            debug: false,
            rate_limit: RateLimitSettings::default(),
            plugin: PluginInfo::default(),
            accounts: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads `path` (if given) and the environment overrides on top of it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Looks an account up by id, then by label.
    pub fn account(&self, id_or_label: &str) -> Result<&AccountConfig, ConfigError> {
        self.accounts
            .iter()
            .find(|a| a.id == id_or_label)
            .or_else(|| self.accounts.iter().find(|a| a.label == id_or_label))
            .ok_or_else(|| ConfigError::UnknownAccount(id_or_label.to_string()))
    }

    pub fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::new(self.cache_dir.join(CHECKPOINT_FILE))
    }
}

/// Exchange call budget shared by every fetch in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_calls() -> usize {
    8
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitSettings {
    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(self.max_calls, Duration::from_secs(self.window_secs))
    }
}

/// Identity stamped onto every emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub label: String,
    pub version: String,
}

impl Default for PluginInfo {
    fn default() -> Self {
        Self {
            id: env!("CARGO_PKG_NAME").to_string(),
            label: "Kraken".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One exchange account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    /// Fallback checkpoint when none has been stored yet.
    #[serde(default)]
    pub last_fetched: Option<DateTime<Utc>>,
}

impl AccountConfig {
    pub fn signer(&self) -> Result<KrakenSigner, ConfigError> {
        KrakenSigner::new(&self.key, &self.secret)
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("notes", &self.notes)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("last_fetched", &self.last_fetched)
            .finish()
    }
}

// ─── Checkpoints ─────────────────────────────────────────────────────────────

/// `last_fetched` per account id, persisted as a JSON object.
///
/// Clones share one write lock, so accounts fetched concurrently can all
/// advance their checkpoints through the same store.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<BTreeMap<String, DateTime<Utc>>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(body) => serde_json::from_str(&body).map_err(|source| CacheError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(CacheError::Io {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    /// The stored checkpoint, else the account's configured one.
    pub fn get(&self, account: &AccountConfig) -> Result<Option<DateTime<Utc>>, CacheError> {
        Ok(self
            .load()?
            .get(&account.id)
            .copied()
            .or(account.last_fetched))
    }

    /// Read-modify-write under the store's lock; the file is replaced by rename
    /// so readers never see a partial write.
    pub fn set(&self, account_id: &str, at: DateTime<Utc>) -> Result<(), CacheError> {
        // The guarded value is (), so a poisoned lock carries no torn state.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut all = self.load()?;
        all.insert(account_id.to_string(), at);

        let io_err = |p: &Path, source| CacheError::Io {
            path: p.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let body = serde_json::to_string_pretty(&all).map_err(|source| CacheError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))
    }
}
