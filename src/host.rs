//! The boundary to whatever process hosts the importer.
//!
//! A host starts and stops the importer and owns the account settings. The
//! reconciliation core only sees this trait, so it runs the same under a
//! plugin host or the bundled [`LocalHost`].

use crate::config::{AccountConfig, AppConfig};
use crate::error::ImportResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

#[async_trait]
pub trait HostBoundary: Send + Sync {
    async fn start(&self) -> ImportResult<()>;

    async fn stop(&self) -> ImportResult<()>;

    /// Current account settings.
    async fn settings(&self) -> ImportResult<Vec<AccountConfig>>;
}

/// Serves settings from a loaded [`AppConfig`].
pub struct LocalHost {
    config: AppConfig,
    running: AtomicBool,
}

impl LocalHost {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostBoundary for LocalHost {
    async fn start(&self) -> ImportResult<()> {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(accounts = self.config.accounts.len(), "Host started");
        Ok(())
    }

    async fn stop(&self) -> ImportResult<()> {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Host stopped");
        Ok(())
    }

    async fn settings(&self) -> ImportResult<Vec<AccountConfig>> {
        Ok(self.config.accounts.clone())
    }
}
