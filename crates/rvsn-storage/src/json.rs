//! JSON file-based storage implementation.
//!
//! This storage backend stores each key as a separate file.
//! Document keys are mapped to `.json` files: `["objects", "3", "latest"]` -> `objects/3/latest.json`.
//! Blob keys are mapped to files named exactly like their last component:
//! `["objects", "3", "latest"]` -> `objects/3/latest`.

use crate::{Storage, StorageError, StorageLock, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// JSON file-based storage.
#[derive(Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    /// Create a new JSON storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The directory every key is resolved against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a key, validating every component.
    fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        // Validate key components (no path traversal)
        for component in key {
            if component.is_empty()
                || component.contains('/')
                || component.contains('\\')
                || *component == "."
                || *component == ".."
            {
                return Err(StorageError::invalid_key(format!(
                    "Invalid key component: {}",
                    component
                )));
            }
        }

        let mut path = self.base_path.clone();
        for component in key {
            path.push(component);
        }

        Ok(path)
    }

    fn document_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        let mut path = self.key_to_path(key)?;
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".json");
        path.set_file_name(name);
        Ok(path)
    }

    /// Get the directory path for a prefix.
    fn prefix_to_dir(&self, prefix: &[&str]) -> StorageResult<PathBuf> {
        if prefix.is_empty() {
            return Ok(self.base_path.clone());
        }
        self.key_to_path(prefix)
    }
}

/// Write atomically (write to temp file, then rename), creating parents.
async fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let written = match fs::write(&temp_path, bytes).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&temp_path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
            }
        }
        return Err(StorageError::Io(e));
    }
    Ok(())
}

async fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let path = self.document_path(key)?;
        debug!(path = %path.display(), "Reading document");

        match read_optional(&path).await? {
            Some(content) => Ok(Some(serde_json::from_slice(&content)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        let path = self.document_path(key)?;
        debug!(path = %path.display(), "Writing document");

        let content = serde_json::to_string_pretty(value)?;
        write_atomic(&path, content.as_bytes()).await
    }

    async fn update<T, F>(&self, key: &[&str], editor: F) -> StorageResult<T>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Default,
        F: FnOnce(&mut T) + Send,
    {
        // Read current value
        let mut value: T = self.read(key).await?.unwrap_or_default();

        // Apply edit
        editor(&mut value);

        // Write back
        self.write(key, &value).await?;

        Ok(value)
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.document_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn read_blob(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading blob");
        read_optional(&path).await
    }

    async fn write_blob(&self, key: &[&str], bytes: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), size = bytes.len(), "Writing blob");
        write_atomic(&path, bytes).await
    }

    async fn blob_exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn create_prefix(&self, prefix: &[&str]) -> StorageResult<()> {
        let dir = self.prefix_to_dir(prefix)?;
        debug!(path = %dir.display(), "Creating storage directory");
        fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn prefix_exists(&self, prefix: &[&str]) -> StorageResult<bool> {
        let dir = self.prefix_to_dir(prefix)?;
        Ok(fs::try_exists(&dir).await?)
    }

    async fn lock_exclusive(&self) -> StorageResult<StorageLock> {
        StorageLock::acquire_file(&self.base_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        storage.write(&["test", "data"], &data).await.unwrap();
        assert!(dir.path().join("test/data.json").exists());

        let read: Option<TestData> = storage.read(&["test", "data"]).await.unwrap();
        assert_eq!(read, Some(data));
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let read: Option<TestData> = storage.read(&["nonexistent"]).await.unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn test_update() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let updated: Vec<i32> = storage
            .update(&["log"], |v: &mut Vec<i32>| v.push(1))
            .await
            .unwrap();
        assert_eq!(updated, vec![1]);

        let updated: Vec<i32> = storage
            .update(&["log"], |v: &mut Vec<i32>| v.push(2))
            .await
            .unwrap();
        assert_eq!(updated, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_blob_round_trip_keeps_name() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage
            .write_blob(&["objects", "3", "abc123.diff"], b"0d1")
            .await
            .unwrap();
        assert!(dir.path().join("objects/3/abc123.diff").exists());
        assert!(!dir.path().join("objects/3/abc123.diff.tmp").exists());

        let bytes = storage
            .read_blob(&["objects", "3", "abc123.diff"])
            .await
            .unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"0d1"[..]));
        assert!(storage
            .blob_exists(&["objects", "3", "abc123.diff"])
            .await
            .unwrap());
        assert!(!storage.blob_exists(&["objects", "3", "abc123"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_document_and_blob_do_not_alias() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.write(&["objects", "0", "latest"], &vec![1]).await.unwrap();
        assert!(storage.exists(&["objects", "0", "latest"]).await.unwrap());
        assert!(!storage.blob_exists(&["objects", "0", "latest"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_prefix() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        assert!(!storage.prefix_exists(&["objects", "7"]).await.unwrap());
        storage.create_prefix(&["objects", "7"]).await.unwrap();
        assert!(storage.prefix_exists(&["objects", "7"]).await.unwrap());
        assert!(dir.path().join("objects/7").is_dir());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        // A directory where the blob should go makes the rename fail.
        std::fs::create_dir_all(dir.path().join("objects/1/latest/inner")).unwrap();
        assert!(storage
            .write_blob(&["objects", "1", "latest"], b"data")
            .await
            .is_err());

        assert!(!dir.path().join("objects/1/latest.tmp").exists());
        assert!(dir.path().join("objects/1/latest").is_dir());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let data = TestData::default();

        // Empty key
        assert!(storage.write(&[], &data).await.is_err());

        // Path traversal attempt
        assert!(storage
            .write(&["..", "etc", "passwd"], &data)
            .await
            .is_err());

        // Slash in component
        assert!(storage.write_blob(&["path/traversal"], b"x").await.is_err());
    }
}
