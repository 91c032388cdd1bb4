use crate::application::notification_engine::NotificationSettings;
use crate::domain::ports::ClientStorageRef;
use crate::error::{Result, StorefrontError};
use crate::infrastructure::in_memory::InMemoryStorage;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Process-wide settings, read from flags with environment fallbacks.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace API
    #[arg(long, env = "STOREFRONT_API_URL", default_value = "http://localhost:8000", global = true)]
    pub api_url: String,

    /// Path to persistent client storage (optional). Uses RocksDB when built
    /// with `storage-rocksdb`, JSON files otherwise.
    #[arg(long, env = "STOREFRONT_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Seconds between notification polls
    #[arg(long, env = "STOREFRONT_POLL_INTERVAL_SECS", default_value_t = 30, global = true)]
    pub poll_interval_secs: u64,

    /// Only fetch unread notifications
    #[arg(long, global = true)]
    pub unread_only: bool,
}

impl Config {
    pub fn notification_settings(&self) -> Result<NotificationSettings> {
        if self.poll_interval_secs == 0 {
            return Err(StorefrontError::ConfigError(
                "poll interval must be at least one second".to_string(),
            ));
        }
        Ok(NotificationSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            unread_only: self.unread_only,
        })
    }

    /// Opens the configured client storage.
    pub fn open_storage(&self) -> Result<ClientStorageRef> {
        let Some(path) = &self.db_path else {
            tracing::debug!("no storage path configured, using in-memory storage");
            return Ok(Arc::new(InMemoryStorage::new()));
        };

        open_persistent(path)
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: &Path) -> Result<ClientStorageRef> {
    let store = crate::infrastructure::rocksdb::RocksDBStorage::open(path)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(path: &Path) -> Result<ClientStorageRef> {
    tracing::warn!(
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to JSON file storage."
    );
    let store = crate::infrastructure::file::FileStorage::open(path)?;
    Ok(Arc::new(store))
}
