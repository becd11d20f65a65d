//! Version control engine for rvsn.
//!
//! Records snapshots ("commits") of a project tree, reconstructs any past
//! state from reverse deltas, reverts the working tree and compares states.
//!
//! - [`store`]: identity slots, tips and delta chains
//! - [`commit`]: recording the working tree
//! - [`history`]: commit log and reconstruction of past states
//! - [`revert`]: rewriting the working tree to a past state
//! - [`compare`]: new/deleted/modified sets between two states
//! - [`repository`]: the handle callers use
//!
//! # Example
//!
//! ```no_run
//! use rvsn_core::{CommitRef, RepoConfig, Repository};
//!
//! # async fn example() -> Result<(), rvsn_core::RvsnError> {
//! let repo = Repository::open("/project/root", &RepoConfig::default()).await?;
//! let first = repo.commit("Initial", "").await?;
//!
//! // ... edit files ...
//!
//! let changes = repo
//!     .changes_between(&CommitRef::id(&first.id), &CommitRef::Current, "/", true)
//!     .await?;
//! for entry in &changes.modified {
//!     println!("modified: {}", entry.path);
//! }
//! repo.revert_all(&CommitRef::id(&first.id)).await?;
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod compare;
pub mod config;
pub mod error;
pub mod history;
pub mod info;
pub mod merge;
pub mod model;
pub mod repository;
pub mod revert;
pub mod store;
pub mod view;
pub mod worktree;

pub use compare::{Changes, FolderChanges};
pub use config::RepoConfig;
pub use error::{ErrorKind, RvsnError, RvsnResult};
pub use info::{Download, FileContent, FileInfo, TreeChildren, TreeNode};
pub use model::{Commit, CommitRef, EntryKind, ObjectEntry, Vcid};
pub use repository::Repository;
pub use revert::RevertStats;
pub use worktree::{is_binary, LocalWorkTree, WorkTree};
