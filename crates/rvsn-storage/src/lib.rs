//! Storage layer for rvsn.
//!
//! This crate provides a key-value storage abstraction with two kinds of
//! values and two backends:
//! - JSON documents (commit log, counters, folder listings)
//! - raw blobs (file tips, diff scripts, full snapshots)
//!
//! Backends:
//! - JSON file storage (default)
//! - In-memory storage (for testing)

pub mod error;
pub mod json;
pub mod lock;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use lock::StorageLock;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A trait for key-value storage backends.
///
/// Keys are represented as path segments, e.g., `["objects", "12", "latest"]`.
/// Documents are serialized/deserialized as JSON; blobs are stored verbatim.
/// A document key and a blob key never alias each other.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a document from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>>;

    /// Write a document to storage.
    ///
    /// Creates parent directories if necessary.
    async fn write<T: Serialize + Send + Sync>(&self, key: &[&str], value: &T)
        -> StorageResult<()>;

    /// Update a document in storage.
    ///
    /// The editor function is called with the current value (or default if not exists).
    /// The updated value is written back to storage.
    async fn update<T, F>(&self, key: &[&str], editor: F) -> StorageResult<T>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Default,
        F: FnOnce(&mut T) + Send;

    /// Check if a document exists.
    async fn exists(&self, key: &[&str]) -> StorageResult<bool>;

    /// Read a blob. Returns `None` if the key doesn't exist.
    async fn read_blob(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>>;

    /// Write a blob, replacing any previous value.
    async fn write_blob(&self, key: &[&str], bytes: &[u8]) -> StorageResult<()>;

    /// Check if a blob exists.
    async fn blob_exists(&self, key: &[&str]) -> StorageResult<bool>;

    /// Create the container for every key under `prefix`.
    async fn create_prefix(&self, prefix: &[&str]) -> StorageResult<()>;

    /// Check whether anything was ever created under `prefix`.
    async fn prefix_exists(&self, prefix: &[&str]) -> StorageResult<bool>;

    /// Wait for exclusive access to the whole store.
    ///
    /// Every handle over the same backing location contends for one lock.
    async fn lock_exclusive(&self) -> StorageResult<StorageLock>;
}
