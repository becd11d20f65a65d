//! Result shapes of the read operations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rvsn_util::path::{extension, file_name};
use serde::{Deserialize, Serialize};

use crate::model::{EntryKind, ObjectEntry};
use crate::worktree::is_binary;

/// Children of a [`TreeNode`]: `true` for a folder whose children are not
/// included, `false` for a file, or the nested nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeChildren {
    Lazy(bool),
    Nodes(Vec<TreeNode>),
}

/// One node of a folder listing as shown to a tree widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub text: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub children: TreeChildren,
}

impl TreeNode {
    pub fn from_entry(entry: &ObjectEntry) -> Self {
        Self {
            text: entry.name.clone(),
            id: entry.path.clone(),
            kind: entry.kind,
            children: TreeChildren::Lazy(entry.is_folder()),
        }
    }

    /// The `/` node wrapping the listing of the project root.
    pub fn root(children: Vec<TreeNode>) -> Self {
        Self {
            text: "/".to_string(),
            id: "/".to_string(),
            kind: EntryKind::Folder,
            children: TreeChildren::Nodes(children),
        }
    }
}

/// Metadata of a file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub mimetype: String,
    pub ext: String,
    pub size: u64,
    pub binary: bool,
}

impl FileInfo {
    pub fn folder() -> Self {
        Self {
            kind: EntryKind::Folder,
            mimetype: String::new(),
            ext: String::new(),
            size: 0,
            binary: false,
        }
    }

    /// Describe file `id` holding `bytes`.
    pub fn file(id: &str, bytes: &[u8]) -> Self {
        let binary = is_binary(bytes);
        let mimetype = match mime_guess::from_path(file_name(id)).first() {
            Some(mime) => mime.essence_str().to_string(),
            None if binary => "application/octet-stream".to_string(),
            None => "text/plain".to_string(),
        };
        Self {
            kind: EntryKind::File,
            mimetype,
            ext: extension(file_name(id)).to_string(),
            size: bytes.len() as u64,
            binary,
        }
    }
}

/// Metadata plus content of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(flatten)]
    pub info: FileInfo,
    pub content: String,
    pub base64: bool,
}

impl FileContent {
    /// Binary content, or content that is not valid UTF-8, is always base64 encoded.
    pub fn new(info: FileInfo, bytes: &[u8], want_base64: bool) -> Self {
        if !want_base64 && !info.binary {
            if let Ok(text) = std::str::from_utf8(bytes) {
                return Self {
                    info,
                    content: text.to_string(),
                    base64: false,
                };
            }
        }
        Self {
            info,
            content: STANDARD.encode(bytes),
            base64: true,
        }
    }

    pub fn folder() -> Self {
        Self {
            info: FileInfo::folder(),
            content: String::new(),
            base64: false,
        }
    }

    /// The raw bytes this content describes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.base64 {
            STANDARD.decode(&self.content)
        } else {
            Ok(self.content.as_bytes().to_vec())
        }
    }
}

/// Result of streaming a file to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Suggested file name.
    pub name: String,
    pub size: u64,
}
