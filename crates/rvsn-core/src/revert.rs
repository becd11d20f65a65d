//! Making the working tree match a past state.

use futures::future::BoxFuture;
use futures::FutureExt;
use rvsn_storage::Storage;
use tracing::{debug, info};

use crate::error::{RvsnError, RvsnResult};
use crate::merge::{merge_join, Merged};
use crate::model::{compare_entries, CommitRef, EntryKind, ObjectEntry, Vcid};
use crate::view::TreeView;
use crate::worktree::WorkTree;

/// Counters gathered while reverting, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RevertStats {
    pub removed: usize,
    pub created: usize,
    pub rewritten: usize,
}

/// Rewrites the working tree to match a reconstructed state.
pub struct RevertEngine<'v, 'a, S, W> {
    view: &'v TreeView<'a, S, W>,
}

impl<'v, 'a, S: Storage, W: WorkTree> RevertEngine<'v, 'a, S, W> {
    pub fn new(view: &'v TreeView<'a, S, W>) -> Self {
        Self { view }
    }

    /// Revert the whole project.
    pub async fn revert_all(&self, at: &CommitRef) -> RvsnResult<RevertStats> {
        let mut stats = RevertStats::default();
        self.revert_folder("", Vcid::ROOT, at, &mut stats).await?;
        info!(
            at = %at,
            removed = stats.removed,
            created = stats.created,
            rewritten = stats.rewritten,
            "Reverted project"
        );
        Ok(stats)
    }

    /// Revert one file or folder.
    ///
    /// An item absent at `at` is removed from the working tree; an item that
    /// changed kind is replaced.
    pub async fn revert_item(&self, id: &str, at: &CommitRef) -> RvsnResult<RevertStats> {
        if id.is_empty() {
            return self.revert_all(at).await;
        }
        let mut stats = RevertStats::default();
        if *at == CommitRef::Current {
            return Ok(stats);
        }

        let tree = self.view.tree();
        let live = tree.kind(id).await?;
        let target = self.view.entry_at(id, at).await?;

        match (live, target) {
            (None, None) => return Err(RvsnError::not_found(format!("{id} at {at}"))),
            (Some(_), None) => {
                tree.remove(id).await?;
                stats.removed += 1;
            }
            (live, Some(entry)) => {
                if live.is_some() && live != Some(entry.kind) {
                    tree.remove(id).await?;
                    stats.removed += 1;
                }
                match entry.kind {
                    EntryKind::File => {
                        self.restore_file(id, entry.vcid()?, at).await?;
                        stats.rewritten += 1;
                    }
                    EntryKind::Folder => {
                        tree.create_folder(id).await?;
                        self.revert_folder(id, entry.vcid()?, at, &mut stats).await?;
                    }
                }
            }
        }

        info!(
            id = %id,
            at = %at,
            removed = stats.removed,
            created = stats.created,
            rewritten = stats.rewritten,
            "Reverted item"
        );
        Ok(stats)
    }

    fn revert_folder<'b>(
        &'b self,
        id: &'b str,
        vcid: Vcid,
        at: &'b CommitRef,
        stats: &'b mut RevertStats,
    ) -> BoxFuture<'b, RvsnResult<()>> {
        async move {
            if *at == CommitRef::Current {
                return Ok(());
            }

            let tree = self.view.tree();
            let live = tree.list_children(id).await?;
            let target = self.view.listing(id, Some(vcid), at).await?;

            let mut removals: Vec<ObjectEntry> = Vec::new();
            let mut creations: Vec<ObjectEntry> = Vec::new();
            let mut updates: Vec<ObjectEntry> = Vec::new();
            for step in merge_join(target, live, compare_entries) {
                match step {
                    Merged::Left(wanted) => creations.push(wanted),
                    Merged::Right(extra) => removals.push(extra),
                    Merged::Both(wanted, current) => {
                        if wanted.is_folder() || wanted.content_hash != current.content_hash {
                            updates.push(wanted);
                        }
                    }
                }
            }

            // Removals go first so a name can switch between file and folder.
            for extra in &removals {
                debug!(path = %extra.path, "Removing");
                tree.remove(&extra.path).await?;
                stats.removed += 1;
            }

            for wanted in &creations {
                debug!(path = %wanted.path, kind = %wanted.kind, "Recreating");
                match wanted.kind {
                    EntryKind::File => {
                        self.restore_file(&wanted.path, wanted.vcid()?, at).await?;
                    }
                    EntryKind::Folder => {
                        tree.create_folder(&wanted.path).await?;
                        self.revert_folder(&wanted.path, wanted.vcid()?, at, stats)
                            .await?;
                    }
                }
                stats.created += 1;
            }

            for wanted in &updates {
                match wanted.kind {
                    EntryKind::File => {
                        debug!(path = %wanted.path, "Rewriting");
                        self.restore_file(&wanted.path, wanted.vcid()?, at).await?;
                        stats.rewritten += 1;
                    }
                    EntryKind::Folder => {
                        self.revert_folder(&wanted.path, wanted.vcid()?, at, stats)
                            .await?;
                    }
                }
            }

            Ok(())
        }
        .boxed()
    }

    async fn restore_file(&self, id: &str, vcid: Vcid, at: &CommitRef) -> RvsnResult<()> {
        let bytes = self.view.history().file_at(vcid, at).await?;
        self.view.tree().write(id, &bytes).await
    }
}
