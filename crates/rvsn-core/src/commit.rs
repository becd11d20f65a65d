//! Recording the working tree as a new commit.

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use rvsn_diff::create_script;
use rvsn_storage::Storage;
use rvsn_util::commit_id;
use tracing::{debug, info};

use crate::error::{RvsnError, RvsnResult};
use crate::history::CommitLog;
use crate::merge::{merge_join, merge_sorted, Merged};
use crate::model::{compare_entries, Commit, EntryKind, ObjectEntry, RepoInfo, Vcid};
use crate::store::{listing_text, Delta, ObjectStore};
use crate::worktree::{is_binary, WorkTree};

/// Counters gathered while committing, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitStats {
    pub folders_changed: usize,
    pub files_changed: usize,
    pub identities_allocated: usize,
    pub identities_reused: usize,
}

/// Walks the working tree and records what changed since the tip.
pub struct CommitManager<'a, S, W> {
    store: &'a ObjectStore<S>,
    tree: &'a W,
}

impl<'a, S: Storage, W: WorkTree> CommitManager<'a, S, W> {
    pub fn new(store: &'a ObjectStore<S>, tree: &'a W) -> Self {
        Self { store, tree }
    }

    /// Record the working tree as a new commit appended to `log`.
    ///
    /// Not transactional: a failure part way leaves the identities already
    /// visited updated, and the commit record is only appended at the end.
    pub async fn commit(
        &self,
        info: &mut RepoInfo,
        log: &CommitLog,
        title: &str,
        comment: &str,
    ) -> RvsnResult<Commit> {
        let timestamp = Utc::now();
        let id = commit_id(timestamp.timestamp());
        if log.find(&id).is_some() {
            return Err(RvsnError::invalid_state(format!(
                "generated commit id {id} is already in the log"
            )));
        }

        let commit = Commit {
            id,
            timestamp,
            title: title.to_string(),
            comment: comment.to_string(),
            previous_commit_id: log.previous_id(),
        };

        let mut pass = CommitPass {
            store: self.store,
            tree: self.tree,
            info: &mut *info,
            commit_id: &commit.id,
            stats: CommitStats::default(),
        };
        pass.commit_folder(String::new(), Vcid::ROOT).await?;
        let stats = pass.stats;

        self.store.append_commit(&commit).await?;
        self.store.save_info(info).await?;

        info!(
            commit = %commit.id,
            folders_changed = stats.folders_changed,
            files_changed = stats.files_changed,
            allocated = stats.identities_allocated,
            reused = stats.identities_reused,
            "Committed"
        );
        Ok(commit)
    }
}

/// State of one in-progress commit.
struct CommitPass<'a, S, W> {
    store: &'a ObjectStore<S>,
    tree: &'a W,
    info: &'a mut RepoInfo,
    commit_id: &'a str,
    stats: CommitStats,
}

impl<'a, S: Storage, W: WorkTree> CommitPass<'a, S, W> {
    fn commit_entry<'b>(&'b mut self, entry: &'b ObjectEntry) -> BoxFuture<'b, RvsnResult<()>> {
        async move {
            let vcid = entry.vcid()?;
            match entry.kind {
                EntryKind::File => self.commit_file(&entry.path, vcid).await,
                EntryKind::Folder => self.commit_folder(entry.path.clone(), vcid).await,
            }
        }
        .boxed()
    }

    fn commit_folder(&mut self, id: String, vcid: Vcid) -> BoxFuture<'_, RvsnResult<()>> {
        async move {
            let tip = self.store.read_listing(vcid).await?;
            let live = self.tree.list_children(&id).await?;
            let mut known = self.store.known_entries(vcid).await?;
            let tip_text = listing_text(&tip)?;

            let mut changed = false;
            let mut listing = Vec::with_capacity(live.len());
            let mut fresh = Vec::new();

            for step in merge_join(tip, live, compare_entries) {
                match step {
                    Merged::Left(gone) => {
                        debug!(path = %gone.path, "Removed since tip");
                        changed = true;
                    }
                    Merged::Both(old, mut current) => {
                        current.identity = old.identity;
                        match current.kind {
                            EntryKind::File if old.content_hash != current.content_hash => {
                                changed = true;
                                self.commit_file(&current.path, old.vcid()?).await?;
                                refresh_known(&mut known, &current);
                            }
                            EntryKind::File => {}
                            EntryKind::Folder => {
                                self.commit_folder(current.path.clone(), old.vcid()?).await?;
                            }
                        }
                        listing.push(current);
                    }
                    Merged::Right(mut created) => {
                        changed = true;
                        match known.binary_search_by(|k| compare_entries(k, &created)) {
                            Ok(pos) => {
                                created.identity = known[pos].identity;
                                known[pos].content_hash = created.content_hash.clone();
                                self.stats.identities_reused += 1;
                                debug!(path = %created.path, vcid = ?created.identity, "Reusing identity");
                            }
                            Err(_) => {
                                let vcid =
                                    self.store.allocate_identity(self.info, created.kind).await?;
                                created.identity = Some(vcid);
                                fresh.push(created.clone());
                                self.stats.identities_allocated += 1;
                            }
                        }
                        self.commit_entry(&created).await?;
                        listing.push(created);
                    }
                }
            }

            if changed {
                let new_text = listing_text(&listing)?;
                let script = create_script(new_text.as_bytes(), tip_text.as_bytes());
                self.store
                    .record_delta(vcid, self.commit_id, &Delta::Script(script))
                    .await?;
                self.store.write_listing(vcid, &listing).await?;
                self.stats.folders_changed += 1;
                debug!(id = %id, vcid = %vcid, entries = listing.len(), "Folder changed");
            }

            let known = merge_sorted(known, fresh, compare_entries);
            self.store.write_known_entries(vcid, &known).await
        }
        .boxed()
    }

    async fn commit_file(&mut self, id: &str, vcid: Vcid) -> RvsnResult<()> {
        let current = self.tree.read(id).await?;

        if let Some(latest) = self.store.tip_file(vcid).await? {
            if latest == current {
                debug!(id = %id, vcid = %vcid, "Content matches tip");
                return Ok(());
            }
            let delta = if is_binary(&current) || is_binary(&latest) {
                Delta::Snapshot(latest)
            } else {
                Delta::Script(create_script(&current, &latest))
            };
            self.store.record_delta(vcid, self.commit_id, &delta).await?;
        }

        self.store.write_file(vcid, &current).await?;
        self.stats.files_changed += 1;
        debug!(id = %id, vcid = %vcid, size = current.len(), "File committed");
        Ok(())
    }
}

/// Keep the recorded hash of a known entry current.
fn refresh_known(known: &mut [ObjectEntry], entry: &ObjectEntry) {
    if let Ok(pos) = known.binary_search_by(|k| compare_entries(k, entry)) {
        known[pos].content_hash = entry.content_hash.clone();
    }
}
