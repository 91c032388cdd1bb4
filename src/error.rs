use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Storage error: {0}")]
    StorageError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for StorefrontError {
    fn from(err: rocksdb::Error) -> Self {
        StorefrontError::StorageError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Reasons the cart refuses a guarded add.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("products cannot be added to the cart while the business view is active")]
    BusinessView,
}

/// Failures reported by a notification backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request was not authorized")]
    Unauthorized,
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("could not parse response: {0}")]
    Parse(String),
}
