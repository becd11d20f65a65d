//! Commit log commands: recording, listing and comparing commits.

use clap::Args;
use rvsn_core::{CommitRef, Repository};
use serde_json::json;

use super::print_json;

/// Arguments of `rvsn changes`.
#[derive(Args)]
pub struct ChangesArgs {
    /// Older state (commit id, latest, current or initial)
    #[arg(long, default_value = "latest")]
    pub from: CommitRef,
    /// Newer state
    #[arg(long, default_value = "current")]
    pub to: CommitRef,
    /// Folder to compare
    #[arg(default_value = "/")]
    pub path: String,
    /// Expand new and deleted folders into everything below them
    #[arg(long)]
    pub deep: bool,
}

pub async fn handle_commit(repo: &Repository, title: &str, comment: &str) -> anyhow::Result<()> {
    let commit = repo.commit(title, comment).await?;
    print_json(&commit)
}

pub async fn handle_log(repo: &Repository, after: Option<CommitRef>) -> anyhow::Result<()> {
    let commits = match after {
        Some(at) => repo.history_after(&at).await?,
        None => repo.list_commits().await?,
    };
    print_json(&commits)
}

pub async fn handle_show(repo: &Repository, id: &str) -> anyhow::Result<()> {
    let commit = repo.commit_info(id).await?;
    print_json(&commit)
}

pub async fn handle_changes(repo: &Repository, args: ChangesArgs) -> anyhow::Result<()> {
    let changes = repo
        .changes_between(&args.from, &args.to, &args.path, args.deep)
        .await?;
    print_json(&changes)
}

pub async fn handle_diff(
    repo: &Repository,
    path: &str,
    from: &CommitRef,
    to: &CommitRef,
) -> anyhow::Result<()> {
    let diff = repo.file_diff(path, from, to).await?;
    print!("{diff}");
    Ok(())
}

pub async fn handle_revert(
    repo: &Repository,
    path: Option<&str>,
    to: &CommitRef,
) -> anyhow::Result<()> {
    let stats = match path {
        Some(path) => repo.revert_item(path, to).await?,
        None => repo.revert_all(to).await?,
    };
    print_json(&json!({
        "reverted_to": to.to_string(),
        "removed": stats.removed,
        "created": stats.created,
        "rewritten": stats.rewritten,
    }))
}
