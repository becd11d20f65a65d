//! Access to the live project files.
//!
//! The engine never touches the project directly: every read and mutation of
//! the working tree goes through [`WorkTree`]. Items are addressed by ids,
//! `/`-separated paths relative to the project root (the root is `""`).

use async_trait::async_trait;
use rvsn_util::path::{join_id, normalize_id};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{RvsnError, RvsnResult};
use crate::model::{compare_entries, EntryKind, ObjectEntry};

/// Number of leading bytes inspected by [`is_binary`].
pub const BINARY_SNIFF_LEN: usize = 4096;

/// Heuristic binary detection: any control byte other than tab, LF or CR
/// within the first [`BINARY_SNIFF_LEN`] bytes.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(BINARY_SNIFF_LEN)
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r'))
}

/// The live working tree collaborator.
#[async_trait]
pub trait WorkTree: Send + Sync {
    /// Kind of the item at `id`, or `None` if it does not exist.
    async fn kind(&self, id: &str) -> RvsnResult<Option<EntryKind>>;

    async fn exists(&self, id: &str) -> RvsnResult<bool> {
        Ok(self.kind(id).await?.is_some())
    }

    async fn is_file(&self, id: &str) -> RvsnResult<bool> {
        Ok(self.kind(id).await? == Some(EntryKind::File))
    }

    async fn is_folder(&self, id: &str) -> RvsnResult<bool> {
        Ok(self.kind(id).await? == Some(EntryKind::Folder))
    }

    /// Children of a folder, ordered by name then kind, without identities.
    async fn list_children(&self, id: &str) -> RvsnResult<Vec<ObjectEntry>>;

    async fn read(&self, id: &str) -> RvsnResult<Vec<u8>>;

    /// Write a file, replacing its content.
    async fn write(&self, id: &str, bytes: &[u8]) -> RvsnResult<()>;

    async fn create_folder(&self, id: &str) -> RvsnResult<()>;

    /// Remove a file, or a folder with everything below it.
    async fn remove(&self, id: &str) -> RvsnResult<()>;

    /// Translate an id into a filesystem path.
    fn id_to_path(&self, id: &str) -> RvsnResult<PathBuf>;

    /// Translate a filesystem path inside the project into an id.
    fn path_to_id(&self, path: &Path) -> RvsnResult<String>;
}

/// Working tree backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalWorkTree {
    root: PathBuf,
    hidden: Vec<String>,
}

impl LocalWorkTree {
    /// Create a working tree rooted at `root`.
    ///
    /// Items whose ids equal or lie below one of `hidden` are invisible.
    pub fn new(root: impl Into<PathBuf>, hidden: impl IntoIterator<Item = String>) -> Self {
        let hidden = hidden
            .into_iter()
            .filter_map(|id| normalize_id(&id))
            .filter(|id| !id.is_empty())
            .collect();
        Self {
            root: root.into(),
            hidden,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_hidden(&self, id: &str) -> bool {
        self.hidden.iter().any(|h| match id.strip_prefix(h.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        })
    }

    /// Resolve an id to a visible path.
    fn visible_path(&self, id: &str) -> RvsnResult<(String, PathBuf)> {
        let id = normalize_id(id).ok_or_else(|| RvsnError::not_found(id.to_string()))?;
        if self.is_hidden(&id) {
            return Err(RvsnError::not_found(id));
        }
        let path = self.id_to_path(&id)?;
        Ok((id, path))
    }
}

#[async_trait]
impl WorkTree for LocalWorkTree {
    async fn kind(&self, id: &str) -> RvsnResult<Option<EntryKind>> {
        let (_, path) = match self.visible_path(id) {
            Ok(found) => found,
            Err(RvsnError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Folder)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_children(&self, id: &str) -> RvsnResult<Vec<ObjectEntry>> {
        let (id, path) = self.visible_path(id)?;
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&path).await?;

        while let Some(child) = dir.next_entry().await? {
            let Some(name) = child.file_name().to_str().map(str::to_string) else {
                warn!(path = %child.path().display(), "Skipping entry with non UTF-8 name");
                continue;
            };
            let child_id = join_id(&id, &name);
            if self.is_hidden(&child_id) {
                continue;
            }

            let meta = fs::metadata(child.path()).await?;
            let (kind, content_hash) = if meta.is_dir() {
                (EntryKind::Folder, String::new())
            } else {
                let bytes = fs::read(child.path()).await?;
                (EntryKind::File, rvsn_util::content_hash(&bytes))
            };

            entries.push(ObjectEntry {
                name,
                path: child_id,
                kind,
                identity: None,
                content_hash,
            });
        }

        entries.sort_by(compare_entries);
        debug!(id = %id, count = entries.len(), "Listed working tree folder");
        Ok(entries)
    }

    async fn read(&self, id: &str) -> RvsnResult<Vec<u8>> {
        let (_, path) = self.visible_path(id)?;
        Ok(fs::read(&path).await?)
    }

    async fn write(&self, id: &str, bytes: &[u8]) -> RvsnResult<()> {
        let (_, path) = self.visible_path(id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!(id = %id, size = bytes.len(), "Wrote working tree file");
        Ok(())
    }

    async fn create_folder(&self, id: &str) -> RvsnResult<()> {
        let (_, path) = self.visible_path(id)?;
        fs::create_dir_all(&path).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> RvsnResult<()> {
        let (id, path) = self.visible_path(id)?;
        if id.is_empty() {
            return Err(RvsnError::invalid_state("refusing to remove the project root"));
        }
        let meta = fs::metadata(&path).await?;
        if meta.is_dir() {
            fs::remove_dir_all(&path).await?;
        } else {
            fs::remove_file(&path).await?;
        }
        debug!(id = %id, "Removed working tree item");
        Ok(())
    }

    fn id_to_path(&self, id: &str) -> RvsnResult<PathBuf> {
        let id = normalize_id(id).ok_or_else(|| RvsnError::not_found(id.to_string()))?;
        let mut path = self.root.clone();
        for part in id.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        Ok(path)
    }

    fn path_to_id(&self, path: &Path) -> RvsnResult<String> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| RvsnError::not_found(path.display().to_string()))?;
        let parts = relative
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .map(str::to_string)
                    .ok_or_else(|| RvsnError::not_found(path.display().to_string()))
            })
            .collect::<RvsnResult<Vec<_>>>()?;
        normalize_id(&parts.join("/"))
            .ok_or_else(|| RvsnError::not_found(path.display().to_string()))
    }
}
