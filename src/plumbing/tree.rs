//! plumbing::tree
//!
//! The write-tree operation.
//!
//! # Algorithm
//!
//! 1. Parse every request entry ([`TreeOp::parse`]); nothing is written if
//!    any entry is rejected.
//! 2. Seed a [`TreeMerge`] from the base tree's direct entries, if one is given.
//! 3. Resolve and apply each operation in request order. Upserts replace,
//!    deletes remove, and deleting an absent name is a no-op.
//! 4. Write the merged entry set as a tree object.
//!
//! The merge holds at most one entry per name, and the last write for a name
//! wins. Entry order is canonicalized by the store when the tree is written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::entry::{EntryResolver, ResolvedOp, TreeOp, WriteTreeEntry};
use super::{object_url, ErrorKind};
use crate::core::config::Config;
use crate::core::types::{EntryName, ObjectKind, Oid};
use crate::git::{Git, GitError, TreeEntry};

/// Errors from tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid entry name '{name}': {message}")]
    InvalidName { name: String, message: String },

    #[error("invalid mode for entry '{name}': {message}")]
    InvalidMode { name: String, message: String },

    #[error("entry '{name}' has both sha and content")]
    ConflictingSource { name: String },

    #[error("entry '{name}' references '{sha}', which is not an object id")]
    InvalidReference { name: String, sha: String },

    #[error("entry '{name}' has invalid base64 content: {message}")]
    InvalidContent { name: String, message: String },

    #[error("base tree not found: {sha}")]
    BaseTreeNotFound { sha: String },

    /// A referenced object is not in the store.
    #[error("object does not exist: {sha}")]
    MissingObject { sha: String },

    #[error("object {sha} is a {actual}, but its mode requires a {expected}")]
    ObjectTypeMismatch {
        sha: String,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("sha not found: {sha}")]
    ShaNotFound { sha: String },

    #[error("repository is read-only")]
    ReadOnlyRepository,

    #[error(transparent)]
    Git(GitError),
}

impl TreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::ReadOnlyRepository => ErrorKind::Forbidden,
            TreeError::Git(_) => ErrorKind::Server,
            _ => ErrorKind::Caller,
        }
    }
}

/// Log a store failure and wrap it.
pub(crate) fn store_error(git: &Git, err: GitError) -> TreeError {
    error!(repo = %git.git_dir().display(), error = %err, "object store failure");
    TreeError::Git(err)
}

/// A write-tree request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteTreeRequest {
    pub tree: Vec<WriteTreeEntry>,
    /// Tree (or commit) whose entries the edits apply to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
}

impl WriteTreeRequest {
    /// The base tree reference, treating an empty string as absent.
    pub fn base_tree(&self) -> Option<&str> {
        self.base_tree.as_deref().filter(|b| !b.is_empty())
    }
}

/// The result of a write-tree request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteTreeResponse {
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A name-keyed set of tree entries under construction.
#[derive(Debug, Clone, Default)]
pub struct TreeMerge {
    entries: BTreeMap<EntryName, TreeEntry>,
}

impl TreeMerge {
    /// An empty merge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a merge with the direct entries of `base`.
    ///
    /// A commit id is peeled to its root tree.
    ///
    /// # Errors
    ///
    /// - [`TreeError::BaseTreeNotFound`] if `base` is not an object id or does
    ///   not resolve to a tree
    pub fn from_base(git: &Git, base: &str) -> Result<Self, TreeError> {
        let not_found = || TreeError::BaseTreeNotFound {
            sha: base.to_string(),
        };

        let oid = Oid::new(base).map_err(|_| not_found())?;
        let tree = match git.peel_to_tree(&oid) {
            Ok(tree) => tree,
            Err(GitError::ObjectNotFound { .. }) => return Err(not_found()),
            Err(e) => return Err(store_error(git, e)),
        };

        let mut merge = Self::new();
        for entry in git.tree_entries(&tree).map_err(|e| store_error(git, e))? {
            merge.entries.insert(entry.name.clone(), entry);
        }

        debug!(base = %tree, entries = merge.len(), "seeded merge from base tree");
        Ok(merge)
    }

    pub fn apply(&mut self, op: ResolvedOp) {
        match op {
            ResolvedOp::Upsert(entry) => {
                self.entries.insert(entry.name.clone(), entry);
            }
            ResolvedOp::Delete(name) => {
                self.entries.remove(&name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries.into_values().collect()
    }
}

/// Write the merged entry set as a tree.
///
/// # Errors
///
/// - [`TreeError::MissingObject`] if an entry references an absent object
/// - [`TreeError::ObjectTypeMismatch`] if an object disagrees with its mode
pub fn materialize(git: &Git, entries: &[TreeEntry]) -> Result<Oid, TreeError> {
    git.write_tree(entries).map_err(|e| match e {
        GitError::ObjectNotFound { oid } => TreeError::MissingObject { sha: oid },
        GitError::ObjectTypeMismatch {
            oid,
            expected,
            actual,
        } => TreeError::ObjectTypeMismatch {
            sha: oid,
            expected,
            actual,
        },
        other => store_error(git, other),
    })
}

/// Merge a base tree with sparse edits and write the result.
#[tracing::instrument(
    skip_all,
    fields(repo = %git.git_dir().display(), entries = request.tree.len())
)]
pub fn write_tree(
    git: &Git,
    config: &Config,
    request: &WriteTreeRequest,
) -> Result<WriteTreeResponse, TreeError> {
    if config.is_read_only() {
        return Err(TreeError::ReadOnlyRepository);
    }

    let ops = request
        .tree
        .iter()
        .map(TreeOp::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let mut merge = match request.base_tree() {
        Some(base) => TreeMerge::from_base(git, base)?,
        None => TreeMerge::new(),
    };

    let resolver = EntryResolver::new(git);
    for op in ops {
        merge.apply(resolver.resolve(op)?);
    }

    let sha = materialize(git, &merge.into_entries())?;
    debug!(tree = %sha, "wrote tree");

    Ok(WriteTreeResponse {
        url: object_url(config, ObjectKind::Tree, &sha),
        sha: sha.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, RepoConfig};
    use crate::core::types::EntryMode;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Git) {
        let dir = TempDir::new().unwrap();
        let git = Git::init(dir.path(), true).unwrap();
        (dir, git)
    }

    fn entry(name: &str, oid: &Oid) -> TreeEntry {
        TreeEntry {
            name: EntryName::new(name).unwrap(),
            mode: EntryMode::Blob,
            oid: oid.clone(),
        }
    }

    mod merge {
        use super::*;

        #[test]
        fn last_write_wins() {
            let (_dir, git) = repo();
            let a = git.write_blob(b"a").unwrap();
            let b = git.write_blob(b"b").unwrap();

            let mut merge = TreeMerge::new();
            merge.apply(ResolvedOp::Upsert(entry("f", &a)));
            merge.apply(ResolvedOp::Upsert(entry("f", &b)));

            assert_eq!(merge.len(), 1);
            assert_eq!(merge.get("f").unwrap().oid, b);
        }

        #[test]
        fn delete_absent_is_noop() {
            let mut merge = TreeMerge::new();
            merge.apply(ResolvedOp::Delete(EntryName::new("ghost").unwrap()));
            assert!(merge.is_empty());
        }

        #[test]
        fn get_by_exact_name() {
            let (_dir, git) = repo();
            let blob = git.write_blob(b"x").unwrap();

            let mut merge = TreeMerge::new();
            for name in ["a", "a.txt", "a-b", "b"] {
                merge.apply(ResolvedOp::Upsert(entry(name, &blob)));
            }

            assert_eq!(merge.get("a.txt").unwrap().name.as_str(), "a.txt");
            assert_eq!(merge.get("a").unwrap().name.as_str(), "a");
            assert!(merge.get("A").is_none());
            assert!(merge.get("a.tx").is_none());
        }

        #[test]
        fn base_tree_seeds_entries() {
            let (_dir, git) = repo();
            let blob = git.write_blob(b"x").unwrap();
            let base = git
                .write_tree(&[entry("one", &blob), entry("two", &blob)])
                .unwrap();

            let merge = TreeMerge::from_base(&git, base.as_str()).unwrap();
            assert_eq!(merge.len(), 2);
            assert!(merge.get("two").is_some());
        }

        #[test]
        fn missing_base_tree() {
            let (_dir, git) = repo();
            let err = TreeMerge::from_base(&git, "0000000000000000000000000000000000000001")
                .unwrap_err();
            assert!(matches!(err, TreeError::BaseTreeNotFound { .. }));
        }

        #[test]
        fn blob_is_not_a_base_tree() {
            let (_dir, git) = repo();
            let blob = git.write_blob(b"x").unwrap();
            let err = TreeMerge::from_base(&git, blob.as_str()).unwrap_err();
            assert!(matches!(err, TreeError::BaseTreeNotFound { ref sha } if *sha == blob.to_string()));
        }

        #[test]
        fn branch_name_is_not_a_base_tree() {
            let (_dir, git) = repo();
            let err = TreeMerge::from_base(&git, "main").unwrap_err();
            assert!(matches!(err, TreeError::BaseTreeNotFound { .. }));
        }
    }

    mod write {
        use super::*;

        #[test]
        fn single_file() {
            let (_dir, git) = repo();
            let request = WriteTreeRequest {
                tree: vec![WriteTreeEntry::content(
                    "file1",
                    "100644",
                    "dGVzdCBjb250ZW50cwo=",
                )],
                base_tree: None,
            };

            let response = write_tree(&git, &Config::default(), &request).unwrap();
            assert_eq!(response.sha, "72e65790d93b0e20a0488b56de1833e6210991e2");
            assert_eq!(response.url, None);
        }

        #[test]
        fn rejected_request_writes_nothing() {
            let (_dir, git) = repo();
            let request = WriteTreeRequest {
                tree: vec![
                    WriteTreeEntry::content("file1", "100644", "dGVzdCBjb250ZW50cwo="),
                    WriteTreeEntry::content(".git", "100644", "dGVzdCBjb250ZW50cwo="),
                ],
                base_tree: None,
            };

            assert!(write_tree(&git, &Config::default(), &request).is_err());
            let blob = Oid::new("891cd65628f1c7caa1bd2c382cc7e27c38e6d34d").unwrap();
            assert_eq!(git.object_kind(&blob).unwrap(), None);
        }

        #[test]
        fn missing_object() {
            let (_dir, git) = repo();
            let request = WriteTreeRequest {
                tree: vec![WriteTreeEntry::object(
                    "f",
                    "100644",
                    "1111111111111111111111111111111111111111",
                )],
                base_tree: None,
            };

            let err = write_tree(&git, &Config::default(), &request).unwrap_err();
            assert!(matches!(err, TreeError::MissingObject { ref sha } if sha.starts_with("1111")));
            assert_eq!(err.kind(), ErrorKind::Caller);
        }

        #[test]
        fn read_only_refused() {
            let (_dir, git) = repo();
            let config = Config::new(
                GlobalConfig::default(),
                Some(RepoConfig {
                    archived: Some(true),
                    ..Default::default()
                }),
            );

            let err = write_tree(&git, &config, &WriteTreeRequest::default()).unwrap_err();
            assert!(matches!(err, TreeError::ReadOnlyRepository));
            assert_eq!(err.kind(), ErrorKind::Forbidden);
        }

        #[test]
        fn empty_request_is_empty_tree() {
            let (_dir, git) = repo();
            let response =
                write_tree(&git, &Config::default(), &WriteTreeRequest::default()).unwrap();
            assert_eq!(response.sha, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        }
    }
}
