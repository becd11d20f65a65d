//! In-memory storage implementation for testing.

use crate::{Storage, StorageError, StorageLock, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    documents: HashMap<String, String>,
    blobs: HashMap<String, Vec<u8>>,
    prefixes: HashSet<String>,
}

/// In-memory storage for testing.
///
/// This stores all data in memory and is not persistent.
pub struct MemoryStorage {
    data: RwLock<Inner>,
    exclusive: Arc<Mutex<()>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Inner::default()),
            exclusive: Arc::new(Mutex::new(())),
        }
    }

    /// Convert a key slice to a storage key string.
    fn key_to_string(key: &[&str]) -> StorageResult<String> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }
        Ok(key.join("/"))
    }

    /// Number of blobs stored, for assertions in tests.
    pub fn blob_count(&self) -> usize {
        self.data.read().map(|d| d.blobs.len()).unwrap_or(0)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(StorageError::poisoned)?;

        match data.documents.get(&key_str) {
            Some(json) => {
                let value: T = serde_json::from_str(json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        let key_str = Self::key_to_string(key)?;
        let json = serde_json::to_string(value)?;

        let mut data = self
            .data
            .write()
            .map_err(StorageError::poisoned)?;
        data.documents.insert(key_str, json);

        Ok(())
    }

    async fn update<T, F>(&self, key: &[&str], editor: F) -> StorageResult<T>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Default,
        F: FnOnce(&mut T) + Send,
    {
        let mut value: T = self.read(key).await?.unwrap_or_default();
        editor(&mut value);
        self.write(key, &value).await?;
        Ok(value)
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(StorageError::poisoned)?;
        Ok(data.documents.contains_key(&key_str))
    }

    async fn read_blob(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(StorageError::poisoned)?;
        Ok(data.blobs.get(&key_str).cloned())
    }

    async fn write_blob(&self, key: &[&str], bytes: &[u8]) -> StorageResult<()> {
        let key_str = Self::key_to_string(key)?;
        let mut data = self
            .data
            .write()
            .map_err(StorageError::poisoned)?;
        data.blobs.insert(key_str, bytes.to_vec());
        Ok(())
    }

    async fn blob_exists(&self, key: &[&str]) -> StorageResult<bool> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(StorageError::poisoned)?;
        Ok(data.blobs.contains_key(&key_str))
    }

    async fn create_prefix(&self, prefix: &[&str]) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(StorageError::poisoned)?;
        data.prefixes.insert(prefix.join("/"));
        Ok(())
    }

    async fn prefix_exists(&self, prefix: &[&str]) -> StorageResult<bool> {
        let prefix_str = prefix.join("/");
        let with_sep = format!("{prefix_str}/");
        let data = self
            .data
            .read()
            .map_err(StorageError::poisoned)?;
        Ok(data.prefixes.contains(&prefix_str)
            || data.documents.keys().any(|k| k.starts_with(&with_sep))
            || data.blobs.keys().any(|k| k.starts_with(&with_sep)))
    }

    async fn lock_exclusive(&self) -> StorageResult<StorageLock> {
        Ok(StorageLock::acquire_memory(self.exclusive.clone()).await)
    }
}
