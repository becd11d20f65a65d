//! Differences between two states of the tree.

use futures::future::BoxFuture;
use futures::FutureExt;
use rvsn_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorKind, RvsnError, RvsnResult};
use crate::merge::{merge_join, Merged};
use crate::model::{compare_entries, compare_entry_paths, CommitRef, EntryKind, ObjectEntry, Vcid};
use crate::view::TreeView;
use crate::worktree::WorkTree;

/// Classification of one folder's children between two states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderChanges {
    pub new: Vec<ObjectEntry>,
    pub deleted: Vec<ObjectEntry>,
    pub preserved: Vec<ObjectEntry>,
    pub modified: Vec<ObjectEntry>,
}

/// Everything that differs below a folder between two states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    pub new: Vec<ObjectEntry>,
    pub deleted: Vec<ObjectEntry>,
    pub modified: Vec<ObjectEntry>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

/// Reconciles listings of two states.
pub struct CompareEngine<'v, 'a, S, W> {
    view: &'v TreeView<'a, S, W>,
}

impl<'v, 'a, S: Storage, W: WorkTree> CompareEngine<'v, 'a, S, W> {
    pub fn new(view: &'v TreeView<'a, S, W>) -> Self {
        Self { view }
    }

    /// Compare the direct children of folder `id`.
    ///
    /// A folder missing on one side counts as empty there. Entries matched on
    /// both sides carry the identity of whichever side has one.
    pub async fn folder_changes(
        &self,
        id: &str,
        vcid: Option<Vcid>,
        older: &CommitRef,
        newer: &CommitRef,
    ) -> RvsnResult<FolderChanges> {
        let older_items = self.side_listing(id, vcid, older).await?;
        let newer_items = self.side_listing(id, vcid, newer).await?;

        let mut changes = FolderChanges::default();
        for step in merge_join(older_items, newer_items, compare_entries) {
            match step {
                Merged::Left(gone) => changes.deleted.push(gone),
                Merged::Right(added) => changes.new.push(added),
                Merged::Both(mut before, after) => {
                    before.identity = before.identity.or(after.identity);
                    if before.content_hash == after.content_hash {
                        changes.preserved.push(before);
                    } else {
                        changes.modified.push(before);
                    }
                }
            }
        }
        Ok(changes)
    }

    /// Collect every change below folder `id` between `older` and `newer`.
    ///
    /// With `deep`, new and deleted folders are expanded into every entry
    /// below them, and both lists are ordered by path.
    pub async fn changes_between(
        &self,
        older: &CommitRef,
        newer: &CommitRef,
        id: &str,
        deep: bool,
    ) -> RvsnResult<Changes> {
        let older_kind = self.view.object_kind_at(id, older).await?;
        let newer_kind = self.view.object_kind_at(id, newer).await?;
        if older_kind != Some(EntryKind::Folder) && newer_kind != Some(EntryKind::Folder) {
            return Err(RvsnError::not_found(format!("folder {id}")));
        }

        let mut changes = Changes::default();
        self.collect(id, None, older, newer, &mut changes).await?;

        if deep {
            changes.new = self.expand(changes.new, newer).await?;
            changes.deleted = self.expand(changes.deleted, older).await?;
        }

        debug!(
            id = %id,
            older = %older,
            newer = %newer,
            new = changes.new.len(),
            deleted = changes.deleted.len(),
            modified = changes.modified.len(),
            "Compared states"
        );
        Ok(changes)
    }

    fn collect<'b>(
        &'b self,
        id: &'b str,
        vcid: Option<Vcid>,
        older: &'b CommitRef,
        newer: &'b CommitRef,
        out: &'b mut Changes,
    ) -> BoxFuture<'b, RvsnResult<()>> {
        async move {
            let folder = self.folder_changes(id, vcid, older, newer).await?;
            out.new.extend(folder.new);
            out.deleted.extend(folder.deleted);
            out.modified.extend(folder.modified);

            for entry in folder.preserved.iter().filter(|e| e.is_folder()) {
                self.collect(&entry.path, entry.identity, older, newer, out)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    async fn expand(&self, entries: Vec<ObjectEntry>, at: &CommitRef) -> RvsnResult<Vec<ObjectEntry>> {
        let mut all = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_folder() {
                let below = self.view.deep_listing(&entry.path, entry.identity, at).await?;
                all.push(entry);
                all.extend(below);
            } else {
                all.push(entry);
            }
        }
        all.sort_by(compare_entry_paths);
        Ok(all)
    }

    async fn side_listing(
        &self,
        id: &str,
        vcid: Option<Vcid>,
        at: &CommitRef,
    ) -> RvsnResult<Vec<ObjectEntry>> {
        match self.view.listing(id, vcid, at).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            other => other,
        }
    }
}
