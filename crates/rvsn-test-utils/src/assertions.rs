//! Assertion helpers for project trees.

use std::path::Path;

use crate::fixtures::TreeState;

/// Assert that a file's bytes equal `expected` exactly.
///
/// # Example
///
/// ```rust
/// use rvsn_test_utils::assertions::assert_file_bytes;
/// use tempfile::TempDir;
///
/// let dir = TempDir::new().unwrap();
/// let path = dir.path().join("a.bin");
/// std::fs::write(&path, [0u8, 1]).unwrap();
///
/// assert_file_bytes(&path, &[0, 1]);
/// ```
pub fn assert_file_bytes(path: &Path, expected: &[u8]) {
    let content = std::fs::read(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));

    assert_eq!(
        content,
        expected,
        "File {} content does not match expected.\nExpected:\n{}\nActual:\n{}",
        path.display(),
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(&content)
    );
}

/// Assert that two recorded trees are identical, naming the first difference.
pub fn assert_tree_eq(actual: &TreeState, expected: &TreeState) {
    for (id, bytes) in expected {
        match actual.get(id) {
            None => panic!("Missing {id} in tree"),
            Some(found) if found != bytes => panic!(
                "{id} differs.\nExpected:\n{:?}\nActual:\n{:?}",
                bytes.as_deref().map(String::from_utf8_lossy),
                found.as_deref().map(String::from_utf8_lossy)
            ),
            Some(_) => {}
        }
    }
    if let Some(extra) = actual.keys().find(|id| !expected.contains_key(*id)) {
        panic!("Unexpected {extra} in tree");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_tree_eq_accepts_equal_trees() {
        let mut a = TreeState::new();
        a.insert("d".to_string(), None);
        a.insert("d/x".to_string(), Some(b"1".to_vec()));
        assert_tree_eq(&a, &a.clone());
    }

    #[test]
    #[should_panic(expected = "d/x differs")]
    fn test_assert_tree_eq_reports_difference() {
        let mut a = TreeState::new();
        a.insert("d/x".to_string(), Some(b"1".to_vec()));
        let mut b = a.clone();
        b.insert("d/x".to_string(), Some(b"2".to_vec()));
        assert_tree_eq(&a, &b);
    }

    #[test]
    #[should_panic(expected = "Unexpected extra")]
    fn test_assert_tree_eq_reports_extra() {
        let mut a = TreeState::new();
        a.insert("extra".to_string(), None);
        assert_tree_eq(&a, &TreeState::new());
    }
}
