//! Per-identity object storage.
//!
//! Keys under the storage root:
//!
//! - `info` / `commits`: identity counter and commit log;
//! - `objects/<vcid>/latest`: tip listing (document) or tip bytes (blob);
//! - `objects/<vcid>/objects`: every child ever seen by a folder;
//! - `objects/<vcid>/<commit>.diff`: reverse edit script recorded by a commit;
//! - `objects/<vcid>/<commit>`: full snapshot of the previous tip, for binary content.

use rvsn_storage::Storage;
use tracing::debug;

use crate::error::{RvsnError, RvsnResult};
use crate::model::{Commit, EntryKind, ObjectEntry, RepoInfo, Vcid};

const INFO: &str = "info";
const COMMITS: &str = "commits";
const OBJECTS: &str = "objects";
const LATEST: &str = "latest";
const KNOWN: &str = "objects";

/// A reverse delta recorded by one commit for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Edit script turning the tip after the commit into the state before it.
    Script(Vec<u8>),
    /// Full content of the state before the commit.
    Snapshot(Vec<u8>),
}

/// Serialized text form of a listing, the form listing deltas are computed on.
pub fn listing_text(entries: &[ObjectEntry]) -> RvsnResult<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Parse the text form of a listing.
pub fn parse_listing(text: &[u8]) -> RvsnResult<Vec<ObjectEntry>> {
    Ok(serde_json::from_slice(text)?)
}

/// Identity slots, tips and delta chains on top of a [`Storage`] backend.
pub struct ObjectStore<S> {
    storage: S,
}

impl<S: Storage> ObjectStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the repository counters, initializing empty storage first.
    pub async fn open(&self) -> RvsnResult<RepoInfo> {
        if let Some(info) = self.storage.read::<RepoInfo>(&[INFO]).await? {
            debug!(max_vcid = info.max_vcid, "Loaded repository info");
            return Ok(info);
        }

        debug!("Initializing empty repository storage");
        self.storage.write(&[COMMITS], &Vec::<Commit>::new()).await?;
        self.storage.create_prefix(&[OBJECTS]).await?;

        let mut info = RepoInfo::default();
        let root = self.allocate_identity(&mut info, EntryKind::Folder).await?;
        if root != Vcid::ROOT {
            return Err(RvsnError::invalid_state(format!(
                "root folder was allocated identity {root}"
            )));
        }
        Ok(info)
    }

    pub async fn save_info(&self, info: &RepoInfo) -> RvsnResult<()> {
        self.storage.write(&[INFO], info).await?;
        Ok(())
    }

    /// The commit log, oldest first.
    pub async fn load_commits(&self) -> RvsnResult<Vec<Commit>> {
        Ok(self
            .storage
            .read::<Vec<Commit>>(&[COMMITS])
            .await?
            .unwrap_or_default())
    }

    pub async fn append_commit(&self, commit: &Commit) -> RvsnResult<()> {
        let commit = commit.clone();
        self.storage
            .update::<Vec<Commit>, _>(&[COMMITS], move |commits| commits.push(commit))
            .await?;
        Ok(())
    }

    /// Allocate a fresh identity and create its slot.
    ///
    /// Folder slots start with empty tip and known listings. The counter is
    /// persisted before returning.
    pub async fn allocate_identity(&self, info: &mut RepoInfo, kind: EntryKind) -> RvsnResult<Vcid> {
        let next = info.max_vcid + 1;
        let vcid = Vcid(u64::try_from(next).map_err(|_| {
            RvsnError::invalid_state(format!("identity counter is corrupt: {}", info.max_vcid))
        })?);
        let id = vcid.to_string();

        if self.storage.prefix_exists(&[OBJECTS, &id]).await? {
            return Err(RvsnError::invalid_state(format!(
                "identity slot {vcid} already exists"
            )));
        }

        self.storage.create_prefix(&[OBJECTS, &id]).await?;
        if kind.is_folder() {
            let empty: Vec<ObjectEntry> = Vec::new();
            self.storage.write(&[OBJECTS, &id, LATEST], &empty).await?;
            self.storage.write(&[OBJECTS, &id, KNOWN], &empty).await?;
        }

        info.max_vcid = next;
        self.save_info(info).await?;
        debug!(vcid = %vcid, kind = %kind, "Allocated identity");
        Ok(vcid)
    }

    /// Tip listing of a folder identity.
    pub async fn read_listing(&self, vcid: Vcid) -> RvsnResult<Vec<ObjectEntry>> {
        let id = vcid.to_string();
        self.storage
            .read(&[OBJECTS, &id, LATEST])
            .await?
            .ok_or_else(|| RvsnError::invalid_state(format!("folder {vcid} has no tip listing")))
    }

    pub async fn write_listing(&self, vcid: Vcid, entries: &[ObjectEntry]) -> RvsnResult<()> {
        let id = vcid.to_string();
        self.storage.write(&[OBJECTS, &id, LATEST], &entries).await?;
        Ok(())
    }

    /// Every child a folder identity ever had, ordered by name then kind.
    pub async fn known_entries(&self, vcid: Vcid) -> RvsnResult<Vec<ObjectEntry>> {
        let id = vcid.to_string();
        Ok(self
            .storage
            .read(&[OBJECTS, &id, KNOWN])
            .await?
            .unwrap_or_default())
    }

    pub async fn write_known_entries(&self, vcid: Vcid, entries: &[ObjectEntry]) -> RvsnResult<()> {
        let id = vcid.to_string();
        self.storage.write(&[OBJECTS, &id, KNOWN], &entries).await?;
        Ok(())
    }

    /// Tip bytes of a file identity, if it was ever committed.
    pub async fn tip_file(&self, vcid: Vcid) -> RvsnResult<Option<Vec<u8>>> {
        let id = vcid.to_string();
        Ok(self.storage.read_blob(&[OBJECTS, &id, LATEST]).await?)
    }

    pub async fn read_file(&self, vcid: Vcid) -> RvsnResult<Vec<u8>> {
        self.tip_file(vcid)
            .await?
            .ok_or_else(|| RvsnError::invalid_state(format!("file {vcid} has no tip content")))
    }

    pub async fn write_file(&self, vcid: Vcid, bytes: &[u8]) -> RvsnResult<()> {
        let id = vcid.to_string();
        self.storage.write_blob(&[OBJECTS, &id, LATEST], bytes).await?;
        Ok(())
    }

    /// Persist the delta a commit recorded for an identity.
    ///
    /// A delta is written once; recording a second one for the same pair fails.
    pub async fn record_delta(&self, vcid: Vcid, commit_id: &str, delta: &Delta) -> RvsnResult<()> {
        let id = vcid.to_string();
        let script_name = script_name(commit_id);
        if self.storage.blob_exists(&[OBJECTS, &id, &script_name]).await?
            || self.storage.blob_exists(&[OBJECTS, &id, commit_id]).await?
        {
            return Err(RvsnError::invalid_state(format!(
                "commit {commit_id} already recorded a delta for {vcid}"
            )));
        }

        match delta {
            Delta::Script(script) => {
                self.storage
                    .write_blob(&[OBJECTS, &id, &script_name], script)
                    .await?;
            }
            Delta::Snapshot(bytes) => {
                self.storage.write_blob(&[OBJECTS, &id, commit_id], bytes).await?;
            }
        }
        debug!(
            vcid = %vcid,
            commit = %commit_id,
            snapshot = matches!(delta, Delta::Snapshot(_)),
            "Recorded delta"
        );
        Ok(())
    }

    /// The delta a commit recorded for an identity; `None` means unchanged.
    pub async fn delta(&self, vcid: Vcid, commit_id: &str) -> RvsnResult<Option<Delta>> {
        let id = vcid.to_string();
        if let Some(bytes) = self.storage.read_blob(&[OBJECTS, &id, commit_id]).await? {
            return Ok(Some(Delta::Snapshot(bytes)));
        }
        Ok(self
            .storage
            .read_blob(&[OBJECTS, &id, &script_name(commit_id)])
            .await?
            .map(Delta::Script))
    }

    pub async fn has_snapshot(&self, vcid: Vcid, commit_id: &str) -> RvsnResult<bool> {
        let id = vcid.to_string();
        Ok(self.storage.blob_exists(&[OBJECTS, &id, commit_id]).await?)
    }
}

fn script_name(commit_id: &str) -> String {
    format!("{commit_id}.diff")
}
