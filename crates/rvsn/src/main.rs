//! rvsn - lightweight version control for project folders.
//!
//! This is the main entry point for the rvsn CLI. Every command opens the
//! repository of the project root and prints its result as JSON.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::*;
use rvsn_core::{CommitRef, ErrorKind, RepoConfig, Repository, RvsnError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rvsn")]
#[command(author, version, about = "Lightweight version control for project folders", long_about = None)]
struct Cli {
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to rvsn.json in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the working tree as a new commit
    Commit {
        /// Commit title
        title: String,
        /// Longer description
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// List commits, oldest first
    Log {
        /// Only commits after this one
        #[arg(long)]
        after: Option<CommitRef>,
    },
    /// Show one commit
    Show {
        /// Commit ID
        id: String,
    },
    /// List a folder
    Ls {
        /// Folder path
        #[arg(default_value = "/")]
        path: String,
        /// State to read (commit id, latest, current or initial)
        #[arg(long, default_value = "current")]
        at: CommitRef,
        /// Wrap the root listing in a single root node
        #[arg(long)]
        include_root: bool,
    },
    /// Show file metadata
    Info {
        /// File or folder path
        path: String,
        #[arg(long, default_value = "current")]
        at: CommitRef,
    },
    /// Show file metadata and content
    Cat {
        /// File path
        path: String,
        #[arg(long, default_value = "current")]
        at: CommitRef,
        /// Encode text content as base64 too
        #[arg(long)]
        base64: bool,
    },
    /// Report whether a path was a file or a folder
    Kind {
        path: String,
        #[arg(long, default_value = "current")]
        at: CommitRef,
    },
    /// Write a file as it was at a commit
    Download {
        /// File path
        path: String,
        #[arg(long, default_value = "current")]
        at: CommitRef,
        /// Output file (raw bytes go to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Make the working tree, or one item of it, match a commit
    Revert {
        /// Target state
        #[arg(long)]
        to: CommitRef,
        /// Only revert this file or folder
        path: Option<String>,
    },
    /// List new, deleted and modified entries between two states
    Changes(ChangesArgs),
    /// Show a unified diff of one file between two states
    Diff {
        /// File path
        path: String,
        #[arg(long, default_value = "latest")]
        from: CommitRef,
        #[arg(long, default_value = "current")]
        to: CommitRef,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code(&e)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, source) = load_config(&cli.root, cli.config.as_deref()).await?;
    let log_file = init_logging(cli.verbose, config.log_level.as_deref());
    if let Some(source) = &source {
        tracing::debug!(path = %source.display(), "Loaded configuration");
    }

    let repo = Repository::open(&cli.root, &config)
        .await
        .with_context(|| format!("Failed to open repository at {}", cli.root.display()))?;

    let result = match cli.command {
        Commands::Commit { title, comment } => handle_commit(&repo, &title, &comment).await,
        Commands::Log { after } => handle_log(&repo, after).await,
        Commands::Show { id } => handle_show(&repo, &id).await,
        Commands::Ls {
            path,
            at,
            include_root,
        } => handle_ls(&repo, &path, &at, include_root).await,
        Commands::Info { path, at } => handle_info(&repo, &path, &at).await,
        Commands::Cat { path, at, base64 } => handle_cat(&repo, &path, &at, base64).await,
        Commands::Kind { path, at } => handle_kind(&repo, &path, &at).await,
        Commands::Download { path, at, output } => {
            handle_download(&repo, &path, &at, output.as_deref()).await
        }
        Commands::Revert { to, path } => handle_revert(&repo, path.as_deref(), &to).await,
        Commands::Changes(args) => handle_changes(&repo, args).await,
        Commands::Diff { path, from, to } => handle_diff(&repo, &path, &from, &to).await,
        Commands::Version => Ok(()),
    };

    if let (Err(e), Some(path)) = (&result, log_file) {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
        eprintln!("Logs: {}", path.display());
    }
    result
}

async fn load_config(
    root: &Path,
    explicit: Option<&Path>,
) -> anyhow::Result<(RepoConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            let config = RepoConfig::load_file(path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => Ok(RepoConfig::load(root).await?),
    }
}

/// 2 for missing items, 3 for inconsistent state, 1 for everything else.
fn exit_code(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<RvsnError>().map(RvsnError::kind) {
        Some(ErrorKind::NotFound) => ExitCode::from(2),
        Some(ErrorKind::InvalidState) => ExitCode::from(3),
        _ => ExitCode::FAILURE,
    }
}

fn print_version() {
    println!("rvsn {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Lightweight version control for project folders.");
}
