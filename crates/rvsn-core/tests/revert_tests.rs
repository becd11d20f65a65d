//! Reverting the working tree to committed states, and comparing states in
//! both directions.

use rvsn_core::{Commit, CommitRef, ErrorKind, ObjectEntry, RepoConfig, Repository};
use rvsn_test_utils::assertions::{assert_file_bytes, assert_tree_eq};
use rvsn_test_utils::fixtures::content::{LINES, PNG_HEADER};
use rvsn_test_utils::{BuiltTestProject, TestProject};

const VC: &[&str] = &[".rvsn"];

async fn open(project: &BuiltTestProject) -> Repository {
    Repository::open(project.path(), &RepoConfig::default())
        .await
        .unwrap()
}

fn at(commit: &Commit) -> CommitRef {
    CommitRef::id(&commit.id)
}

fn paths(entries: &[ObjectEntry]) -> Vec<String> {
    entries.iter().map(|e| e.path.clone()).collect()
}

/// A project with two commits that touch every kind of change.
async fn two_commit_project() -> (BuiltTestProject, Repository, Commit, Commit) {
    let project = TestProject::new()
        .with_file("a.txt", LINES)
        .with_file("d/x.txt", "1")
        .with_file("d/e/deep.txt", "deep")
        .with_binary("img.png", PNG_HEADER)
        .build();
    let repo = open(&project).await;
    let c1 = repo.commit("c1", "").await.unwrap();

    project.write_file("a.txt", "first\nchanged\nthird\n");
    project.delete_file("d/x.txt");
    project.write_file("d/new.txt", "new");
    project.delete_dir("d/e");
    project.write_file("d/e", "now a file");
    project.write_bytes("img.png", &[0x89, b'P', b'N', b'G', 0, 1]);
    project.write_file("n/z.txt", "z");
    let c2 = repo.commit("c2", "").await.unwrap();

    (project, repo, c1, c2)
}

#[tokio::test]
async fn test_revert_to_latest_is_noop() {
    let (project, repo, _c1, _c2) = two_commit_project().await;
    let before = project.tree_state(VC);

    let stats = repo.revert_all(&CommitRef::Latest).await.unwrap();

    assert_eq!(stats.removed + stats.created + stats.rewritten, 0);
    assert_tree_eq(&project.tree_state(VC), &before);
}

#[tokio::test]
async fn test_revert_to_current_is_noop() {
    let (project, repo, _c1, _c2) = two_commit_project().await;
    project.write_file("a.txt", "uncommitted");
    let before = project.tree_state(VC);

    repo.revert_all(&CommitRef::Current).await.unwrap();
    repo.revert_item("a.txt", &CommitRef::Current).await.unwrap();

    assert_tree_eq(&project.tree_state(VC), &before);
}

#[tokio::test]
async fn test_revert_all_restores_older_commit() {
    let project = TestProject::new()
        .with_file("a.txt", LINES)
        .with_file("d/x.txt", "1")
        .with_file("d/e/deep.txt", "deep")
        .with_binary("img.png", PNG_HEADER)
        .with_dir("empty")
        .build();
    let repo = open(&project).await;
    let c1 = repo.commit("c1", "").await.unwrap();
    let state1 = project.tree_state(VC);

    project.write_file("a.txt", "first\nchanged\nthird\n");
    project.delete_file("d/x.txt");
    project.write_file("d/new.txt", "new");
    project.delete_dir("d/e");
    project.write_file("d/e", "now a file");
    project.write_bytes("img.png", &[0x89, b'P', b'N', b'G', 0, 1]);
    project.delete_dir("empty");
    repo.commit("c2", "").await.unwrap();

    // Uncommitted edits are discarded too.
    project.write_file("a.txt", "uncommitted");
    project.write_file("stray/file.txt", "stray");

    repo.revert_all(&at(&c1)).await.unwrap();
    assert_tree_eq(&project.tree_state(VC), &state1);

    // The log is untouched by reverting.
    assert_eq!(repo.list_commits().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_revert_then_commit_matches_old_listing() {
    let (_project, repo, c1, _c2) = two_commit_project().await;

    repo.revert_all(&at(&c1)).await.unwrap();
    let c3 = repo.commit("back to c1", "").await.unwrap();

    for path in ["/", "d", "d/e"] {
        let old = repo.listing_at_commit(path, &at(&c1), false).await.unwrap();
        let new = repo.listing_at_commit(path, &at(&c3), false).await.unwrap();
        assert_eq!(old, new, "listing of {path}");
    }
}

#[tokio::test]
async fn test_revert_to_initial_empties_tree() {
    let (project, repo, _c1, _c2) = two_commit_project().await;

    repo.revert_all(&CommitRef::Initial).await.unwrap();

    assert!(project.tree_state(VC).is_empty());
    assert!(project.file_exists(".rvsn/commits.json"));
}

#[tokio::test]
async fn test_revert_item_file() {
    let (project, repo, c1, _c2) = two_commit_project().await;
    project.write_file("d/new.txt", "edited");

    repo.revert_item("a.txt", &at(&c1)).await.unwrap();

    assert_file_bytes(&project.path().join("a.txt"), LINES.as_bytes());
    // Siblings are left alone.
    assert_eq!(project.read_file("d/new.txt"), "edited");
}

#[tokio::test]
async fn test_revert_item_recreates_deleted_file() {
    let (project, repo, c1, _c2) = two_commit_project().await;

    repo.revert_item("d/x.txt", &at(&c1)).await.unwrap();

    assert_eq!(project.read_file("d/x.txt"), "1");
}

#[tokio::test]
async fn test_revert_item_removes_file_absent_at_target() {
    let (project, repo, c1, _c2) = two_commit_project().await;

    let stats = repo.revert_item("d/new.txt", &at(&c1)).await.unwrap();

    assert_eq!(stats.removed, 1);
    assert!(!project.file_exists("d/new.txt"));
}

#[tokio::test]
async fn test_revert_item_replaces_changed_kind() {
    let (project, repo, c1, c2) = two_commit_project().await;

    repo.revert_item("d/e", &at(&c1)).await.unwrap();
    assert_eq!(project.read_file("d/e/deep.txt"), "deep");

    repo.revert_item("d/e", &at(&c2)).await.unwrap();
    assert_eq!(project.read_file("d/e"), "now a file");
}

#[tokio::test]
async fn test_revert_item_binary() {
    let (project, repo, c1, _c2) = two_commit_project().await;

    repo.revert_item("img.png", &at(&c1)).await.unwrap();

    assert_eq!(project.read_bytes("img.png"), PNG_HEADER);
}

#[tokio::test]
async fn test_revert_item_missing_everywhere() {
    let (_project, repo, c1, _c2) = two_commit_project().await;

    let err = repo.revert_item("ghost.txt", &at(&c1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_changes_are_symmetric() {
    let (_project, repo, c1, c2) = two_commit_project().await;

    for deep in [false, true] {
        let forward = repo
            .changes_between(&at(&c1), &at(&c2), "/", deep)
            .await
            .unwrap();
        let backward = repo
            .changes_between(&at(&c2), &at(&c1), "/", deep)
            .await
            .unwrap();
        assert_eq!(paths(&forward.new), paths(&backward.deleted));
        assert_eq!(paths(&forward.deleted), paths(&backward.new));
        assert_eq!(paths(&forward.modified), paths(&backward.modified));
    }
}

#[tokio::test]
async fn test_changes_report_kind_switch() {
    let (_project, repo, c1, c2) = two_commit_project().await;

    let changes = repo
        .changes_between(&at(&c1), &at(&c2), "/", true)
        .await
        .unwrap();

    assert_eq!(
        paths(&changes.new),
        vec!["d/e", "d/new.txt", "n", "n/z.txt"]
    );
    assert_eq!(
        paths(&changes.deleted),
        vec!["d/e", "d/e/deep.txt", "d/x.txt"]
    );
    assert_eq!(paths(&changes.modified), vec!["a.txt", "img.png"]);
}

#[tokio::test]
async fn test_changes_of_folder_missing_on_one_side() {
    let (_project, repo, c1, c2) = two_commit_project().await;

    let created = repo
        .changes_between(&at(&c1), &at(&c2), "n", false)
        .await
        .unwrap();
    assert_eq!(paths(&created.new), vec!["n/z.txt"]);

    let err = repo
        .changes_between(&at(&c1), &at(&c2), "a.txt", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
