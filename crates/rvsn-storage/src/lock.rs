//! Exclusive storage locks.
//!
//! Mutating repository operations hold a [`StorageLock`] for their whole
//! duration. The JSON backend locks a `lock` file under its base directory
//! with `flock`, so separate processes and separate handles over one folder
//! are serialized. The lock is released when the guard is dropped.

use crate::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Name of the lock file inside a storage directory.
pub const LOCK_FILE: &str = "lock";

/// Guard over the exclusive storage lock.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct StorageLock {
    _held: Held,
}

// Held only for its Drop.
#[allow(dead_code)]
enum Held {
    #[cfg(unix)]
    File(nix::fcntl::Flock<File>),
    #[cfg(not(unix))]
    File(File),
    Memory(OwnedMutexGuard<()>),
}

impl StorageLock {
    /// Block until the lock file under `dir` is held exclusively.
    pub async fn acquire_file(dir: &Path) -> StorageResult<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(LOCK_FILE);

        let lock_path = path.clone();
        let held = tokio::task::spawn_blocking(move || -> StorageResult<Held> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)?;
            lock_exclusive(file)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        debug!(path = %path.display(), "Acquired storage lock");
        Ok(Self { _held: held })
    }

    /// Wait for an in-process mutex shared by every user of one backend.
    pub async fn acquire_memory(mutex: Arc<Mutex<()>>) -> Self {
        Self {
            _held: Held::Memory(mutex.lock_owned().await),
        }
    }
}

#[cfg(unix)]
fn lock_exclusive(file: File) -> StorageResult<Held> {
    use nix::fcntl::{Flock, FlockArg};

    match Flock::lock(file, FlockArg::LockExclusive) {
        Ok(lock) => Ok(Held::File(lock)),
        Err((_, errno)) => Err(StorageError::Io(errno.into())),
    }
}

#[cfg(not(unix))]
fn lock_exclusive(file: File) -> StorageResult<Held> {
    Ok(Held::File(file))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_lock_creates_lock_file() {
        let dir = tempdir().unwrap();
        let _lock = StorageLock::acquire_file(dir.path()).await.unwrap();
        assert!(dir.path().join(LOCK_FILE).is_file());
    }

    #[tokio::test]
    async fn test_second_file_lock_waits_for_first() {
        let dir = tempdir().unwrap();
        let first = StorageLock::acquire_file(dir.path()).await.unwrap();

        let path = dir.path().to_path_buf();
        let waiter = tokio::spawn(async move { StorageLock::acquire_file(&path).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_file_lock_reacquired_after_drop() {
        let dir = tempdir().unwrap();
        drop(StorageLock::acquire_file(dir.path()).await.unwrap());
        let again = tokio::time::timeout(
            Duration::from_secs(5),
            StorageLock::acquire_file(dir.path()),
        )
        .await
        .unwrap();
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_memory_lock_is_exclusive() {
        let mutex = Arc::new(Mutex::new(()));
        let first = StorageLock::acquire_memory(mutex.clone()).await;
        assert!(mutex.try_lock().is_err());
        drop(first);
        assert!(mutex.try_lock().is_ok());
    }
}
