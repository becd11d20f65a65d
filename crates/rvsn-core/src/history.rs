//! Commit log and reconstruction of past states.

use rvsn_diff::apply_script;
use rvsn_storage::Storage;
use tracing::debug;

use crate::error::{RvsnError, RvsnResult};
use crate::model::{Commit, CommitRef, ObjectEntry, Vcid, NO_COMMIT};
use crate::store::{listing_text, parse_listing, Delta, ObjectStore};

/// The ordered commit log. Its order is the only timeline.
#[derive(Debug, Clone, Default)]
pub struct CommitLog {
    commits: Vec<Commit>,
}

impl CommitLog {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self { commits }
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }

    pub fn tail(&self) -> Option<&Commit> {
        self.commits.last()
    }

    /// Id to link a new commit to.
    pub fn previous_id(&self) -> String {
        self.tail()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| NO_COMMIT.to_string())
    }

    pub fn find(&self, id: &str) -> Option<&Commit> {
        self.commits.iter().find(|c| c.id == id)
    }

    /// Commits strictly newer than `at`, oldest first.
    ///
    /// The initial state precedes the whole log; the tip and the live tree
    /// have nothing after them.
    pub fn after(&self, at: &CommitRef) -> RvsnResult<&[Commit]> {
        match at {
            CommitRef::Initial => Ok(&self.commits),
            CommitRef::Latest | CommitRef::Current => Ok(&[]),
            CommitRef::Id(id) => self
                .commits
                .iter()
                .position(|c| &c.id == id)
                .map(|pos| &self.commits[pos + 1..])
                .ok_or_else(|| RvsnError::not_found(format!("commit {id}"))),
        }
    }

    /// Fail with `NotFound` for a commit id missing from the log.
    pub fn check(&self, at: &CommitRef) -> RvsnResult<()> {
        self.after(at).map(|_| ())
    }
}

/// Replays stored deltas on top of tips to rebuild past states.
pub struct HistoryReconstructor<'a, S> {
    store: &'a ObjectStore<S>,
    log: &'a CommitLog,
}

impl<'a, S: Storage> HistoryReconstructor<'a, S> {
    pub fn new(store: &'a ObjectStore<S>, log: &'a CommitLog) -> Self {
        Self { store, log }
    }

    pub fn store(&self) -> &'a ObjectStore<S> {
        self.store
    }

    /// Listing of a folder identity as of a commit.
    pub async fn listing_at(&self, vcid: Vcid, at: &CommitRef) -> RvsnResult<Vec<ObjectEntry>> {
        let after = match at {
            CommitRef::Initial => return Ok(Vec::new()),
            CommitRef::Current => {
                return Err(RvsnError::invalid_state(
                    "the working tree has no stored listing",
                ))
            }
            _ => self.log.after(at)?,
        };

        let tip = self.store.read_listing(vcid).await?;
        if after.is_empty() {
            return Ok(tip);
        }

        let mut text = listing_text(&tip)?.into_bytes();
        for commit in after.iter().rev() {
            text = self.apply(vcid, commit, text).await?;
        }
        debug!(vcid = %vcid, at = %at, replayed = after.len(), "Reconstructed listing");
        parse_listing(&text).map_err(|e| {
            RvsnError::invalid_state(format!("listing of {vcid} at {at} is unreadable: {e}"))
        })
    }

    /// Content of a file identity as of a commit.
    pub async fn file_at(&self, vcid: Vcid, at: &CommitRef) -> RvsnResult<Vec<u8>> {
        let after = match at {
            CommitRef::Initial => {
                return Err(RvsnError::not_found(format!(
                    "file {vcid} before the first commit"
                )))
            }
            CommitRef::Current => {
                return Err(RvsnError::invalid_state(
                    "the working tree has no stored content",
                ))
            }
            _ => self.log.after(at)?,
        };
        if after.is_empty() {
            return self.store.read_file(vcid).await;
        }

        // Start from the oldest full snapshot newer than `at`, if any.
        let mut start = after.len();
        for (pos, commit) in after.iter().enumerate() {
            if self.store.has_snapshot(vcid, &commit.id).await? {
                start = pos;
                break;
            }
        }

        let mut content = if start < after.len() {
            match self.store.delta(vcid, &after[start].id).await? {
                Some(Delta::Snapshot(bytes)) => bytes,
                _ => {
                    return Err(RvsnError::invalid_state(format!(
                        "snapshot of {vcid} at {} vanished",
                        after[start].id
                    )))
                }
            }
        } else {
            self.store.read_file(vcid).await?
        };

        for commit in after[..start].iter().rev() {
            content = self.apply(vcid, commit, content).await?;
        }
        debug!(vcid = %vcid, at = %at, replayed = start, "Reconstructed file");
        Ok(content)
    }

    /// Undo one commit's change to an identity.
    async fn apply(&self, vcid: Vcid, commit: &Commit, state: Vec<u8>) -> RvsnResult<Vec<u8>> {
        match self.store.delta(vcid, &commit.id).await? {
            None => Ok(state),
            Some(Delta::Snapshot(bytes)) => Ok(bytes),
            Some(Delta::Script(script)) => apply_script(&state, &script).map_err(|e| {
                RvsnError::invalid_state(format!(
                    "delta of {vcid} recorded by {} does not apply: {e}",
                    commit.id
                ))
            }),
        }
    }
}
