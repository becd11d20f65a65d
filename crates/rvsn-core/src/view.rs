//! Path-addressed reads of the tree at any commit reference.

use futures::future::BoxFuture;
use futures::FutureExt;
use rvsn_storage::Storage;
use rvsn_util::path::{file_name, join_id, parent_id, split_id};

use crate::error::{ErrorKind, RvsnError, RvsnResult};
use crate::history::HistoryReconstructor;
use crate::model::{compare_entry_paths, CommitRef, EntryKind, ObjectEntry, Vcid};
use crate::worktree::WorkTree;

/// Reads the tree at a [`CommitRef`], going to the working tree for
/// [`CommitRef::Current`] and to history otherwise.
pub struct TreeView<'a, S, W> {
    history: HistoryReconstructor<'a, S>,
    tree: &'a W,
}

impl<'a, S: Storage, W: WorkTree> TreeView<'a, S, W> {
    pub fn new(history: HistoryReconstructor<'a, S>, tree: &'a W) -> Self {
        Self { history, tree }
    }

    pub fn history(&self) -> &HistoryReconstructor<'a, S> {
        &self.history
    }

    pub fn tree(&self) -> &'a W {
        self.tree
    }

    /// Walk `id` from the root to its identity, reading listings at `at`.
    ///
    /// Intermediate components must be folders; the last one must match
    /// `kind` when given. The working tree has no identities, so `at` must
    /// name a stored state.
    pub async fn resolve_identity(
        &self,
        id: &str,
        at: &CommitRef,
        kind: Option<EntryKind>,
    ) -> RvsnResult<Vcid> {
        let parts = split_id(id);
        let mut vcid = Vcid::ROOT;

        for (i, part) in parts.iter().enumerate() {
            let last = i + 1 == parts.len();
            let wanted = if last { kind } else { Some(EntryKind::Folder) };
            let entries = self.history.listing_at(vcid, at).await?;
            let found = entries
                .iter()
                .find(|e| e.name == *part && wanted.map_or(true, |k| e.kind == k))
                .ok_or_else(|| RvsnError::not_found(format!("{id} at {at}")))?;
            vcid = found.vcid()?;
        }

        Ok(vcid)
    }

    /// Children of folder `id` at `at`, ordered by name then kind.
    ///
    /// `vcid` skips resolution when the caller already knows the identity.
    pub async fn listing(
        &self,
        id: &str,
        vcid: Option<Vcid>,
        at: &CommitRef,
    ) -> RvsnResult<Vec<ObjectEntry>> {
        match at {
            CommitRef::Current => {
                if !self.tree.is_folder(id).await? {
                    return Err(RvsnError::not_found(format!("folder {id}")));
                }
                self.tree.list_children(id).await
            }
            CommitRef::Initial => Ok(Vec::new()),
            _ => {
                let vcid = match vcid {
                    Some(vcid) => vcid,
                    None => {
                        self.resolve_identity(id, at, Some(EntryKind::Folder))
                            .await?
                    }
                };
                let mut entries = self.history.listing_at(vcid, at).await?;
                for entry in &mut entries {
                    entry.path = join_id(id, &entry.name);
                }
                Ok(entries)
            }
        }
    }

    /// Every entry below folder `id`, ordered by path.
    pub fn deep_listing<'b>(
        &'b self,
        id: &'b str,
        vcid: Option<Vcid>,
        at: &'b CommitRef,
    ) -> BoxFuture<'b, RvsnResult<Vec<ObjectEntry>>> {
        async move {
            let entries = self.listing(id, vcid, at).await?;
            let mut all = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.is_folder() {
                    let children = self.deep_listing(&entry.path, entry.identity, at).await?;
                    all.push(entry);
                    all.extend(children);
                } else {
                    all.push(entry);
                }
            }
            all.sort_by(compare_entry_paths);
            Ok(all)
        }
        .boxed()
    }

    /// The entry at `id`, or `None` if nothing existed there at `at`.
    ///
    /// The root is reported as a folder with the root identity. When a file
    /// and a folder share the name, the folder wins.
    pub async fn entry_at(&self, id: &str, at: &CommitRef) -> RvsnResult<Option<ObjectEntry>> {
        if id.is_empty() {
            return Ok(Some(ObjectEntry {
                name: String::new(),
                path: String::new(),
                kind: EntryKind::Folder,
                identity: Some(Vcid::ROOT),
                content_hash: String::new(),
            }));
        }

        let siblings = match self.listing(parent_id(id), None, at).await {
            Ok(siblings) => siblings,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let name = file_name(id);
        Ok(siblings.into_iter().find(|e| e.name == name))
    }

    pub async fn object_kind_at(&self, id: &str, at: &CommitRef) -> RvsnResult<Option<EntryKind>> {
        if *at == CommitRef::Current {
            return self.tree.kind(id).await;
        }
        Ok(self.entry_at(id, at).await?.map(|e| e.kind))
    }

    /// Content of file `id` at `at`.
    pub async fn file(&self, id: &str, at: &CommitRef) -> RvsnResult<Vec<u8>> {
        match at {
            CommitRef::Current => {
                if !self.tree.is_file(id).await? {
                    return Err(RvsnError::not_found(format!("file {id}")));
                }
                self.tree.read(id).await
            }
            _ => {
                let entry = self
                    .entry_at(id, at)
                    .await?
                    .filter(|e| e.kind == EntryKind::File)
                    .ok_or_else(|| RvsnError::not_found(format!("file {id} at {at}")))?;
                self.history.file_at(entry.vcid()?, at).await
            }
        }
    }
}
