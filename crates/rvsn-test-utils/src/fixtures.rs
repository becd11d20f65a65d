//! Test fixtures for creating reproducible project trees.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Recorded state of a project tree: every item id mapped to its bytes, or
/// `None` for folders.
pub type TreeState = BTreeMap<String, Option<Vec<u8>>>;

/// A temporary test project with configurable file structure.
///
/// Creates a temporary directory that is automatically cleaned up
/// when the project is dropped.
///
/// # Example
///
/// ```rust
/// use rvsn_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_file("d/x.txt", "1")
///     .with_dir("empty")
///     .build();
///
/// assert!(project.path().join("d/x.txt").exists());
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    /// Files to create (path relative to root -> contents).
    files: HashMap<PathBuf, Vec<u8>>,
    /// Directories to create (paths relative to root).
    dirs: Vec<PathBuf>,
}

impl TestProject {
    /// Create a new test project builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: HashMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a text file. Parent directories are created automatically.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.with_binary(path, contents.into().as_bytes())
    }

    /// Add a file with arbitrary bytes.
    pub fn with_binary(mut self, path: impl AsRef<Path>, contents: &[u8]) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.to_vec());
        self
    }

    /// Add an empty directory to the project.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add an `rvsn.json` configuration file.
    pub fn with_config(self, config: &str) -> Self {
        self.with_file("rvsn.json", config)
    }

    /// Build the project, creating all files and directories.
    pub fn build(self) -> BuiltTestProject {
        let root = self.temp_dir.path();

        for dir in &self.dirs {
            let full_path = root.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (path, contents) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!(
                        "Failed to create parent directory for {}: {}",
                        full_path.display(),
                        e
                    )
                });
            }
            fs::write(&full_path, contents)
                .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        }

        BuiltTestProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A built test project with files created on disk.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a text file from the project.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.path().join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Read raw bytes from the project.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Vec<u8> {
        let full_path = self.path().join(path.as_ref());
        fs::read(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Check if a file or directory exists in the project.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.path().join(path.as_ref()).exists()
    }

    /// Write a text file (for modifying during tests).
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        self.write_bytes(path, contents.as_ref().as_bytes());
    }

    /// Write raw bytes (for modifying during tests).
    pub fn write_bytes(&self, path: impl AsRef<Path>, contents: &[u8]) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&full_path, contents)
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
    }

    /// Create a directory (and its parents).
    pub fn create_dir(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::create_dir_all(&full_path)
            .unwrap_or_else(|e| panic!("Failed to create directory {}: {}", full_path.display(), e));
    }

    /// Delete a file from the project.
    pub fn delete_file(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::remove_file(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete file {}: {}", full_path.display(), e));
    }

    /// Delete a directory and everything below it.
    pub fn delete_dir(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::remove_dir_all(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete directory {}: {}", full_path.display(), e));
    }

    /// Record every file and folder below the root, skipping the top-level
    /// entries named in `skip` (e.g. the storage folder).
    pub fn tree_state(&self, skip: &[&str]) -> TreeState {
        let mut state = TreeState::new();
        collect(self.path(), "", skip, &mut state);
        state
    }
}

fn collect(dir: &Path, prefix: &str, skip: &[&str], state: &mut TreeState) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e));
    for entry in entries {
        let entry = entry.unwrap_or_else(|e| panic!("Failed to read entry: {}", e));
        let name = entry.file_name().to_string_lossy().into_owned();
        if prefix.is_empty() && skip.contains(&name.as_str()) {
            continue;
        }
        let id = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();
        if path.is_dir() {
            state.insert(id.clone(), None);
            collect(&path, &id, skip, state);
        } else {
            let bytes = fs::read(&path)
                .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
            state.insert(id, Some(bytes));
        }
    }
}

/// Common test file contents.
pub mod content {
    /// Bytes classified as binary (control bytes in the first block).
    pub const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 13];

    /// A multi-line text file.
    pub const LINES: &str = "first\nsecond\nthird\nfourth\n";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_project() {
        let project = TestProject::new().build();
        assert!(project.path().exists());
        assert!(project.tree_state(&[]).is_empty());
    }

    #[test]
    fn test_project_with_files() {
        let project = TestProject::new()
            .with_file("test.txt", "Hello")
            .with_binary("bin/data", &[0, 1, 2])
            .with_dir("empty")
            .build();

        assert_eq!(project.read_file("test.txt"), "Hello");
        assert_eq!(project.read_bytes("bin/data"), vec![0, 1, 2]);
        assert!(project.path().join("empty").is_dir());
    }

    #[test]
    fn test_write_and_delete() {
        let project = TestProject::new().build();

        project.write_file("deep/nested/file.txt", "content");
        assert!(project.file_exists("deep/nested/file.txt"));

        project.delete_file("deep/nested/file.txt");
        assert!(!project.file_exists("deep/nested/file.txt"));

        project.delete_dir("deep");
        assert!(!project.file_exists("deep"));
    }

    #[test]
    fn test_tree_state_skips_top_level_names() {
        let project = TestProject::new()
            .with_file("a.txt", "a")
            .with_file("d/x.txt", "x")
            .with_file(".rvsn/info.json", "{}")
            .build();

        let state = project.tree_state(&[".rvsn"]);
        let ids: Vec<_> = state.keys().cloned().collect();
        assert_eq!(ids, vec!["a.txt", "d", "d/x.txt"]);
        assert_eq!(state["d"], None);
        assert_eq!(state["a.txt"], Some(b"a".to_vec()));
    }

    #[test]
    fn test_with_config() {
        let project = TestProject::new().with_config(r#"{"blacklist": []}"#).build();
        assert!(project.file_exists("rvsn.json"));
    }
}
