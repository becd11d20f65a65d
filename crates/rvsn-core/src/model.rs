//! Data model: identities, tree entries, commits and commit references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{RvsnError, RvsnResult};

/// Sentinel stored as `previous_commit_id` of the first commit.
pub const NO_COMMIT: &str = "none";

/// Identity of one tree entry's storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vcid(pub u64);

impl Vcid {
    /// The project root folder.
    pub const ROOT: Vcid = Vcid(0);
}

impl fmt::Display for Vcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a tree entry. Folders sort before files of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One child of a folder listing.
///
/// `identity` is `None` only for entries read from the live working tree
/// that were not matched against a stored listing yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    /// Project-relative id of the entry (`d/x.txt`).
    pub path: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Vcid>,
    /// Checksum of the file bytes; empty for folders.
    #[serde(default)]
    pub content_hash: String,
}

impl ObjectEntry {
    /// The stored identity, or an error for an entry that has none.
    pub fn vcid(&self) -> RvsnResult<Vcid> {
        self.identity.ok_or_else(|| {
            RvsnError::invalid_state(format!("entry {} has no identity", self.path))
        })
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}

/// Order entries by name (byte-wise), then folders before files.
pub fn compare_entries(a: &ObjectEntry, b: &ObjectEntry) -> Ordering {
    a.name
        .as_bytes()
        .cmp(b.name.as_bytes())
        .then(a.kind.cmp(&b.kind))
}

/// Order entries by project path, then folders before files.
pub fn compare_entry_paths(a: &ObjectEntry, b: &ObjectEntry) -> Ordering {
    a.path
        .as_bytes()
        .cmp(b.path.as_bytes())
        .then(a.kind.cmp(&b.kind))
}

/// A recorded commit. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub comment: String,
    /// Id of the preceding commit, or [`NO_COMMIT`].
    pub previous_commit_id: String,
}

/// Persisted repository counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Highest identity allocated so far, `-1` before the root exists.
    pub max_vcid: i64,
}

impl Default for RepoInfo {
    fn default() -> Self {
        Self { max_vcid: -1 }
    }
}

/// A point in history that reads and reverts can target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommitRef {
    /// The live working tree.
    Current,
    /// The most recent commit (the tip).
    Latest,
    /// The empty state before the first commit.
    Initial,
    /// A specific commit.
    Id(String),
}

impl CommitRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }
}

impl FromStr for CommitRef {
    type Err = RvsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(RvsnError::not_found("empty commit reference")),
            "current" => Ok(Self::Current),
            "latest" => Ok(Self::Latest),
            "none" | "initial" => Ok(Self::Initial),
            other => Ok(Self::Id(other.to_string())),
        }
    }
}

impl fmt::Display for CommitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Latest => f.write_str("latest"),
            Self::Initial => f.write_str("initial"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind) -> ObjectEntry {
        ObjectEntry {
            name: name.to_string(),
            path: name.to_string(),
            kind,
            identity: Some(Vcid(1)),
            content_hash: String::new(),
        }
    }

    #[test]
    fn test_folder_sorts_before_file_of_same_name() {
        let folder = entry("a", EntryKind::Folder);
        let file = entry("a", EntryKind::File);
        assert_eq!(compare_entries(&folder, &file), Ordering::Less);
        assert_eq!(
            compare_entries(&entry("B", EntryKind::File), &entry("a", EntryKind::Folder)),
            Ordering::Less
        );
    }

    #[test]
    fn test_entry_serialization_shape() {
        let json = serde_json::to_value(entry("x.txt", EntryKind::File)).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["identity"], 1);

        let live = ObjectEntry {
            identity: None,
            ..entry("y", EntryKind::Folder)
        };
        let json = serde_json::to_value(&live).unwrap();
        assert!(json.get("identity").is_none());
        assert!(live.vcid().is_err());
    }

    #[test]
    fn test_commit_ref_parsing() {
        assert_eq!("current".parse::<CommitRef>().unwrap(), CommitRef::Current);
        assert_eq!("latest".parse::<CommitRef>().unwrap(), CommitRef::Latest);
        assert_eq!("none".parse::<CommitRef>().unwrap(), CommitRef::Initial);
        assert_eq!("initial".parse::<CommitRef>().unwrap(), CommitRef::Initial);
        assert_eq!(
            "3f9a0c12de".parse::<CommitRef>().unwrap(),
            CommitRef::id("3f9a0c12de")
        );
        assert!("  ".parse::<CommitRef>().is_err());
    }

    #[test]
    fn test_repo_info_default() {
        assert_eq!(RepoInfo::default().max_vcid, -1);
    }
}
