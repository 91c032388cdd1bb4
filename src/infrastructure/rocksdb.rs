use crate::domain::ports::ClientStorage;
use crate::error::{Result, StorefrontError};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding client-side state (cart, profile, token).
pub const CF_CLIENT_STATE: &str = "client_state";

/// A persistent store implementation using RocksDB.
///
/// Keys are stored as UTF-8 bytes in the `client_state` Column Family.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStorage {
    db: Arc<DB>,
}

impl RocksDBStorage {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the `client_state` column family exists.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_state = ColumnFamilyDescriptor::new(CF_CLIENT_STATE, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_state])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn missing_cf() -> StorefrontError {
        StorefrontError::StorageError(Box::new(std::io::Error::other(
            "Client state column family not found",
        )))
    }
}

impl ClientStorage for RocksDBStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.db.cf_handle(CF_CLIENT_STATE).ok_or_else(Self::missing_cf)?;

        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                StorefrontError::StorageError(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Stored value is not UTF-8: {}", e),
                )))
            }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let cf = self.db.cf_handle(CF_CLIENT_STATE).ok_or_else(Self::missing_cf)?;
        self.db.put_cf(&cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let cf = self.db.cf_handle(CF_CLIENT_STATE).ok_or_else(Self::missing_cf)?;
        self.db.delete_cf(&cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStorage::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_CLIENT_STATE).is_some());
    }

    #[test]
    fn test_rocksdb_storage() {
        let dir = tempdir().unwrap();
        let store = RocksDBStorage::open(dir.path()).unwrap();

        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));

        store.remove("cart").unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }
}
