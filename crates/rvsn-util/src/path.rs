//! Path utilities.
//!
//! Items of a project are addressed by ids: `/`-separated paths relative to
//! the project root, without leading or trailing separators. The root itself
//! is the empty id.

use std::path::{Path, PathBuf};

/// Normalize an item id.
///
/// Leading, trailing and repeated separators as well as `.` components are
/// dropped; `/` and the empty string both denote the root. Returns `None`
/// for ids containing `..`, which could escape the project.
pub fn normalize_id(id: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in id.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Join a child name onto a parent id.
pub fn join_id(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Split a normalized id into its components.
pub fn split_id(id: &str) -> Vec<&str> {
    id.split('/').filter(|p| !p.is_empty()).collect()
}

/// The parent id of a normalized id (the root is its own parent).
pub fn parent_id(id: &str) -> &str {
    match id.rfind('/') {
        Some(pos) => &id[..pos],
        None => "",
    }
}

/// The last component of a normalized id.
pub fn file_name(id: &str) -> &str {
    match id.rfind('/') {
        Some(pos) => &id[pos + 1..],
        None => id,
    }
}

/// The extension of a name: everything after the last `.`, or empty.
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => "",
    }
}

/// Storage directory of a project, `folder` being relative to its root.
pub fn project_vc_dir(project_root: &Path, folder: &str) -> PathBuf {
    let mut dir = project_root.to_path_buf();
    for part in split_id(folder) {
        dir.push(part);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("/"), Some(String::new()));
        assert_eq!(normalize_id(""), Some(String::new()));
        assert_eq!(normalize_id("/d//x.txt/"), Some("d/x.txt".to_string()));
        assert_eq!(normalize_id("./d/./x"), Some("d/x".to_string()));
        assert_eq!(normalize_id("d/../../etc"), None);
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join_id("", "a.txt"), "a.txt");
        assert_eq!(join_id("d", "x.txt"), "d/x.txt");
        assert_eq!(split_id("d/e/f"), vec!["d", "e", "f"]);
        assert!(split_id("").is_empty());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_id("d/e/f.txt"), "d/e");
        assert_eq!(parent_id("f.txt"), "");
        assert_eq!(file_name("d/e/f.txt"), "f.txt");
        assert_eq!(file_name("f.txt"), "f.txt");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("main.rs"), "rs");
        assert_eq!(extension("archive.tar.gz"), "gz");
        assert_eq!(extension("Makefile"), "");
    }

    #[test]
    fn test_project_vc_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            project_vc_dir(dir.path(), ".rvsn"),
            dir.path().join(".rvsn")
        );
        assert_eq!(
            project_vc_dir(dir.path(), "/meta/vc/"),
            dir.path().join("meta").join("vc")
        );
    }
}
