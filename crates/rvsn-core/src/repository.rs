//! The repository handle exposing every operation to callers.

use rvsn_diff::unified_diff;
use rvsn_storage::{JsonStorage, Storage, StorageLock};
use rvsn_util::path::{file_name, normalize_id, project_vc_dir};
use rvsn_util::TimingGuard;
use std::path::PathBuf;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::debug;

use crate::commit::CommitManager;
use crate::compare::{Changes, CompareEngine};
use crate::config::RepoConfig;
use crate::error::{RvsnError, RvsnResult};
use crate::history::{CommitLog, HistoryReconstructor};
use crate::info::{Download, FileContent, FileInfo, TreeNode};
use crate::model::{Commit, CommitRef, EntryKind, RepoInfo};
use crate::revert::{RevertEngine, RevertStats};
use crate::store::ObjectStore;
use crate::view::TreeView;
use crate::worktree::{is_binary, LocalWorkTree, WorkTree};

/// A version-controlled project.
///
/// Commits and reverts hold the repository lock exclusively for their whole
/// duration; reads share it. Mutations also hold the storage lock, which
/// serializes them against other handles and processes over the same
/// storage, and reload the counters once it is held.
pub struct Repository<S = JsonStorage, W = LocalWorkTree> {
    store: ObjectStore<S>,
    tree: W,
    state: RwLock<RepoInfo>,
}

impl Repository {
    /// Open the repository of the project at `root`, initializing storage on
    /// first use.
    pub async fn open(root: impl Into<PathBuf>, config: &RepoConfig) -> RvsnResult<Self> {
        config.validate()?;
        let root = root.into();
        let storage = JsonStorage::new(project_vc_dir(&root, &config.version_control_folder));
        let tree = LocalWorkTree::new(root, config.hidden_paths());
        Self::with_parts(storage, tree).await
    }
}

impl<S: Storage, W: WorkTree> Repository<S, W> {
    /// Open a repository over explicit storage and working tree.
    pub async fn with_parts(storage: S, tree: W) -> RvsnResult<Self> {
        let store = ObjectStore::new(storage);
        let info = {
            let _lock = store.storage().lock_exclusive().await?;
            store.open().await?
        };
        Ok(Self {
            store,
            tree,
            state: RwLock::new(info),
        })
    }

    pub fn work_tree(&self) -> &W {
        &self.tree
    }

    pub fn store(&self) -> &ObjectStore<S> {
        &self.store
    }

    /// Take the storage lock and refresh `state` from what is stored.
    async fn lock_storage(&self, state: &mut RepoInfo) -> RvsnResult<StorageLock> {
        let lock = self.store.storage().lock_exclusive().await?;
        *state = self.store.open().await?;
        Ok(lock)
    }

    async fn log(&self) -> RvsnResult<CommitLog> {
        Ok(CommitLog::new(self.store.load_commits().await?))
    }

    fn view<'a>(&'a self, log: &'a CommitLog) -> TreeView<'a, S, W> {
        TreeView::new(HistoryReconstructor::new(&self.store, log), &self.tree)
    }

    /// Record the working tree as a new commit.
    pub async fn commit(&self, title: &str, comment: &str) -> RvsnResult<Commit> {
        let _timing = TimingGuard::repository("commit");
        let mut state = self.state.write().await;
        let _lock = self.lock_storage(&mut state).await?;
        let log = self.log().await?;
        CommitManager::new(&self.store, &self.tree)
            .commit(&mut state, &log, title, comment)
            .await
    }

    /// All commits, oldest first.
    pub async fn list_commits(&self) -> RvsnResult<Vec<Commit>> {
        let _state = self.state.read().await;
        Ok(self.log().await?.into_commits())
    }

    pub async fn commit_info(&self, id: &str) -> RvsnResult<Commit> {
        let _state = self.state.read().await;
        self.log()
            .await?
            .find(id)
            .cloned()
            .ok_or_else(|| RvsnError::not_found(format!("commit {id}")))
    }

    /// Commits strictly after `at`, oldest first.
    pub async fn history_after(&self, at: &CommitRef) -> RvsnResult<Vec<Commit>> {
        let _state = self.state.read().await;
        let log = self.log().await?;
        Ok(log.after(at)?.to_vec())
    }

    /// Children of folder `path` at `at`.
    ///
    /// With `include_root` and the root path, the listing is wrapped in a
    /// single `/` node.
    pub async fn listing_at_commit(
        &self,
        path: &str,
        at: &CommitRef,
        include_root: bool,
    ) -> RvsnResult<Vec<TreeNode>> {
        let id = item_id(path)?;
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(at)?;

        let entries = self.view(&log).listing(&id, None, at).await?;
        let nodes: Vec<TreeNode> = entries.iter().map(TreeNode::from_entry).collect();
        if include_root && id.is_empty() {
            return Ok(vec![TreeNode::root(nodes)]);
        }
        Ok(nodes)
    }

    /// Metadata of the item at `path` as of `at`.
    pub async fn file_info_at_commit(&self, path: &str, at: &CommitRef) -> RvsnResult<FileInfo> {
        let id = item_id(path)?;
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(at)?;
        let view = self.view(&log);

        match view.object_kind_at(&id, at).await? {
            None => Err(RvsnError::not_found(format!("{id} at {at}"))),
            Some(EntryKind::Folder) => Ok(FileInfo::folder()),
            Some(EntryKind::File) => {
                let bytes = view.file(&id, at).await?;
                Ok(FileInfo::file(&id, &bytes))
            }
        }
    }

    /// Metadata and content of the item at `path` as of `at`.
    pub async fn file_content_at_commit(
        &self,
        path: &str,
        at: &CommitRef,
        want_base64: bool,
    ) -> RvsnResult<FileContent> {
        let id = item_id(path)?;
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(at)?;
        let view = self.view(&log);

        match view.object_kind_at(&id, at).await? {
            None => Err(RvsnError::not_found(format!("{id} at {at}"))),
            Some(EntryKind::Folder) => Ok(FileContent::folder()),
            Some(EntryKind::File) => {
                let bytes = view.file(&id, at).await?;
                Ok(FileContent::new(FileInfo::file(&id, &bytes), &bytes, want_base64))
            }
        }
    }

    /// Stream the file at `path` as of `at` into `writer`.
    pub async fn download_at_commit<O>(
        &self,
        path: &str,
        at: &CommitRef,
        writer: &mut O,
    ) -> RvsnResult<Download>
    where
        O: AsyncWrite + Unpin + Send,
    {
        let id = item_id(path)?;
        let bytes = {
            let _state = self.state.read().await;
            let log = self.log().await?;
            log.check(at)?;
            self.view(&log).file(&id, at).await?
        };

        writer.write_all(&bytes).await?;
        writer.flush().await?;
        debug!(id = %id, at = %at, size = bytes.len(), "Downloaded file");
        Ok(Download {
            name: file_name(&id).to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Make the whole working tree match `at`.
    pub async fn revert_all(&self, at: &CommitRef) -> RvsnResult<RevertStats> {
        let _timing = TimingGuard::repository("revert_all");
        let mut state = self.state.write().await;
        let _lock = self.lock_storage(&mut state).await?;
        let log = self.log().await?;
        log.check(at)?;
        let view = self.view(&log);
        RevertEngine::new(&view).revert_all(at).await
    }

    /// Make one file or folder match `at`.
    pub async fn revert_item(&self, path: &str, at: &CommitRef) -> RvsnResult<RevertStats> {
        let id = item_id(path)?;
        let _timing = TimingGuard::repository("revert_item");
        let mut state = self.state.write().await;
        let _lock = self.lock_storage(&mut state).await?;
        let log = self.log().await?;
        log.check(at)?;
        let view = self.view(&log);
        RevertEngine::new(&view).revert_item(&id, at).await
    }

    /// Changes below folder `path` from `older` to `newer`.
    pub async fn changes_between(
        &self,
        older: &CommitRef,
        newer: &CommitRef,
        path: &str,
        deep: bool,
    ) -> RvsnResult<Changes> {
        let id = item_id(path)?;
        let _timing = TimingGuard::repository("changes_between");
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(older)?;
        log.check(newer)?;
        let view = self.view(&log);
        CompareEngine::new(&view)
            .changes_between(older, newer, &id, deep)
            .await
    }

    /// Unified diff of one file from `older` to `newer`.
    ///
    /// A side where the file does not exist counts as empty.
    pub async fn file_diff(
        &self,
        path: &str,
        older: &CommitRef,
        newer: &CommitRef,
    ) -> RvsnResult<String> {
        let id = item_id(path)?;
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(older)?;
        log.check(newer)?;
        let view = self.view(&log);

        let before = file_or_empty(&view, &id, older).await?;
        let after = file_or_empty(&view, &id, newer).await?;
        if before.is_none() && after.is_none() {
            return Err(RvsnError::not_found(format!("file {id}")));
        }
        let before = before.unwrap_or_default();
        let after = after.unwrap_or_default();

        if is_binary(&before) || is_binary(&after) {
            if before == after {
                return Ok(String::new());
            }
            return Ok(format!("Binary files a/{id} and b/{id} differ\n"));
        }
        Ok(unified_diff(
            &String::from_utf8_lossy(&before),
            &String::from_utf8_lossy(&after),
            &id,
        ))
    }

    /// Kind of the item at `path` as of `at`, `None` if it did not exist.
    pub async fn object_kind_at(&self, path: &str, at: &CommitRef) -> RvsnResult<Option<EntryKind>> {
        let id = item_id(path)?;
        let _state = self.state.read().await;
        let log = self.log().await?;
        log.check(at)?;
        self.view(&log).object_kind_at(&id, at).await
    }
}

fn item_id(path: &str) -> RvsnResult<String> {
    normalize_id(path).ok_or_else(|| RvsnError::not_found(format!("path {path}")))
}

async fn file_or_empty<S: Storage, W: WorkTree>(
    view: &TreeView<'_, S, W>,
    id: &str,
    at: &CommitRef,
) -> RvsnResult<Option<Vec<u8>>> {
    match view.object_kind_at(id, at).await? {
        Some(EntryKind::File) => Ok(Some(view.file(id, at).await?)),
        Some(EntryKind::Folder) => Err(RvsnError::not_found(format!("file {id} at {at}"))),
        None => {
            debug!(id = %id, at = %at, "File absent, diffing against empty");
            Ok(None)
        }
    }
}
