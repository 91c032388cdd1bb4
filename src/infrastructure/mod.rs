//! Adapters for the domain ports: client storage backends and the
//! notification backend client.

pub mod file;
pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
