//! Repository configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{RvsnError, RvsnResult};

/// Name of the project-level configuration file.
pub const CONFIG_FILE: &str = "rvsn.json";

/// Default storage folder inside the project.
pub const DEFAULT_VC_FOLDER: &str = ".rvsn";

/// Repository configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Storage folder, relative to the project root. Always hidden from the
    /// working tree.
    pub version_control_folder: String,

    /// Extra project-relative paths that are never listed, committed or reverted.
    pub blacklist: Vec<String>,

    /// Default log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            version_control_folder: DEFAULT_VC_FOLDER.to_string(),
            blacklist: Vec::new(),
            log_level: None,
        }
    }
}

impl RepoConfig {
    /// Load the configuration for a project.
    ///
    /// Reads `rvsn.json` from the project root when present, defaults otherwise.
    /// Returns the file the configuration came from.
    pub async fn load(project_dir: &Path) -> RvsnResult<(Self, Option<PathBuf>)> {
        let path = project_dir.join(CONFIG_FILE);
        if tokio::fs::try_exists(&path).await? {
            let config = Self::load_file(&path).await?;
            return Ok((config, Some(path)));
        }
        debug!(dir = %project_dir.display(), "No project config, using defaults");
        Ok((Self::default(), None))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> RvsnResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse configuration JSON; `source` names it in errors.
    pub fn parse(content: &str, source: &str) -> RvsnResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| RvsnError::config(format!("{source}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the storage folder is usable.
    pub fn validate(&self) -> RvsnResult<()> {
        let folder = self.version_control_folder.trim_matches(['/', '\\']);
        if folder.is_empty() {
            return Err(RvsnError::config("Cannot initialize version control"));
        }
        if rvsn_util::path::normalize_id(folder).is_none() || Path::new(folder).is_absolute() {
            return Err(RvsnError::config(format!(
                "version_control_folder must stay inside the project: {}",
                self.version_control_folder
            )));
        }
        Ok(())
    }

    /// Paths hidden from the working tree: the blacklist plus the storage folder.
    pub fn hidden_paths(&self) -> Vec<String> {
        let mut hidden = self.blacklist.clone();
        hidden.push(self.version_control_folder.clone());
        hidden
    }
}
