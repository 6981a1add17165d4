//! core::paths
//!
//! Path routing for treesmith storage locations inside a repository.
//!
//! Everything lives under `<common_dir>/treesmith/`, which is shared by
//! linked worktrees and exists for bare repositories too:
//! - `config.toml` - Repository configuration
//! - `lock` - Exclusive lock file
//!
//! # Example
//!
//! ```
//! use treesmith::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(
//!     PathBuf::from("/srv/repo.git"),
//!     PathBuf::from("/srv/repo.git"),
//! );
//!
//! assert_eq!(
//!     paths.repo_config_path(),
//!     PathBuf::from("/srv/repo.git/treesmith/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::git::RepoInfo;

/// Storage locations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Path to the per-worktree git directory.
    pub git_dir: PathBuf,

    /// Path to the shared git directory (refs, objects, config).
    pub common_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    /// Create RepoPaths from a RepoInfo.
    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self {
            git_dir: info.git_dir.clone(),
            common_dir: info.common_dir.clone(),
        }
    }

    /// Get the root treesmith directory under common_dir.
    pub fn repo_tool_dir(&self) -> PathBuf {
        self.common_dir.join("treesmith")
    }

    /// Get the path to the repository configuration file.
    ///
    /// This is `<common_dir>/treesmith/config.toml`.
    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_tool_dir().join("config.toml")
    }

    /// Get the path to the repository lock file.
    ///
    /// This is `<common_dir>/treesmith/lock`.
    pub fn repo_lock_path(&self) -> PathBuf {
        self.repo_tool_dir().join("lock")
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}
