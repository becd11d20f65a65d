//! Commands reading the project tree at a commit reference.

use anyhow::Context;
use rvsn_core::{CommitRef, Repository};
use serde_json::json;
use std::path::Path;

use super::print_json;

pub async fn handle_ls(
    repo: &Repository,
    path: &str,
    at: &CommitRef,
    include_root: bool,
) -> anyhow::Result<()> {
    let nodes = repo.listing_at_commit(path, at, include_root).await?;
    print_json(&nodes)
}

pub async fn handle_info(repo: &Repository, path: &str, at: &CommitRef) -> anyhow::Result<()> {
    let info = repo.file_info_at_commit(path, at).await?;
    print_json(&info)
}

pub async fn handle_cat(
    repo: &Repository,
    path: &str,
    at: &CommitRef,
    base64: bool,
) -> anyhow::Result<()> {
    let content = repo.file_content_at_commit(path, at, base64).await?;
    print_json(&content)
}

pub async fn handle_kind(repo: &Repository, path: &str, at: &CommitRef) -> anyhow::Result<()> {
    let kind = repo.object_kind_at(path, at).await?;
    print_json(&json!({ "path": path, "at": at.to_string(), "kind": kind }))
}

/// Write the file to `output`, or raw to stdout when no output is given.
pub async fn handle_download(
    repo: &Repository,
    path: &str,
    at: &CommitRef,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(output) => {
            let mut file = tokio::fs::File::create(output)
                .await
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let download = repo.download_at_commit(path, at, &mut file).await?;
            print_json(&download)
        }
        None => {
            let mut stdout = tokio::io::stdout();
            repo.download_at_commit(path, at, &mut stdout).await?;
            Ok(())
        }
    }
}
