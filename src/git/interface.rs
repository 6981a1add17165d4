//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to the object store. Trees,
//! blobs, commits and refs are all read and written through [`Git`], which
//! returns strong types and normalizes libgit2 errors into typed failure
//! categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::ObjectNotFound`]: A referenced object does not exist
//! - [`GitError::ObjectTypeMismatch`]: An object exists but has the wrong type
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CasFailed`]: Compare-and-swap precondition failed
//!
//! # Example
//!
//! ```ignore
//! use treesmith::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let blob = git.write_blob(b"hello\n")?;
//! println!("blob is {blob}");
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::core::types::{EntryMode, EntryName, ObjectKind, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    ///
    /// The ref moved between the time it was read and the time it was
    /// updated.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Object exists but is not of the type its reference requires.
    #[error("object {oid} is a {actual}, expected a {expected}")]
    ObjectTypeMismatch {
        /// The offending OID
        oid: String,
        /// The type the reference requires
        expected: ObjectKind,
        /// The type actually stored
        actual: ObjectKind,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A stored tree contains an entry this tool cannot represent.
    #[error("unsupported tree entry in {tree}: {message}")]
    UnsupportedEntry {
        /// The tree holding the entry
        tree: String,
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidEntryName(msg) | TypeError::InvalidEntryMode(msg) => {
                GitError::Internal { message: msg }
            }
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the git directory (the repository itself when bare)
    pub git_dir: PathBuf,
    /// Path to the shared git directory (differs from git_dir in linked worktrees)
    pub common_dir: PathBuf,
    /// Path to the working directory, `None` for bare repositories
    pub work_dir: Option<PathBuf>,
}

/// One direct entry of a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: EntryName,
    pub mode: EntryMode,
    pub oid: Oid,
}

/// An entry reached while walking a tree, with its path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeWalkEntry {
    /// Slash-separated path relative to the walked tree
    pub path: String,
    pub mode: EntryMode,
    pub kind: ObjectKind,
    pub oid: Oid,
    /// Blob size in bytes, 0 for trees and submodule commits
    pub size: u64,
}

/// A name, email and timestamp as recorded in a commit header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonStamp {
    pub name: String,
    pub email: String,
    pub when: DateTime<FixedOffset>,
}

/// Everything needed to serialize a commit object.
#[derive(Debug, Clone)]
pub struct CommitDraft {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: PersonStamp,
    pub committer: PersonStamp,
    pub message: String,
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// The root tree of the commit
    pub tree: Oid,
    /// Parent commits, in order
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    pub author: PersonStamp,
    pub committer: PersonStamp,
}

/// A detached signature together with the bytes it signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSignature {
    /// The armored signature from the `gpgsig` header
    pub signature: String,
    /// The commit object with the signature header removed
    pub payload: String,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All object and ref
/// reads and writes flow through this interface. No other module should
/// import `git2` directly.
///
/// Object writes are content addressed and therefore idempotent. Ref updates
/// use compare-and-swap semantics.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository. Bare
    /// repositories are accepted.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        Ok(Self { repo })
    }

    /// Create a new repository at `path` and open it.
    pub fn init(path: &Path, bare: bool) -> Result<Self, GitError> {
        let repo = if bare {
            git2::Repository::init_bare(path)
        } else {
            git2::Repository::init(path)
        };
        let repo = repo.map_err(|e| GitError::AccessError {
            message: format!("cannot initialize {}: {}", path.display(), e.message()),
        })?;

        Ok(Self { repo })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
        }
    }

    /// Get direct access to the git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Whether the repository has no working directory.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    /// Read a string value from the repository's effective Git config.
    ///
    /// Returns `None` when the key is not set anywhere.
    pub fn config_string(&self, key: &str) -> Result<Option<String>, GitError> {
        let config = self.repo.config().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, key)),
        }
    }

    /// Set a string value in the repository-local Git config.
    pub fn set_config_string(&self, key: &str, value: &str) -> Result<(), GitError> {
        let mut config = self
            .repo
            .config()
            .and_then(|c| c.open_level(git2::ConfigLevel::Local))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        config
            .set_str(key, value)
            .map_err(|e| GitError::from_git2(e, key))
    }

    // =========================================================================
    // Object Queries
    // =========================================================================

    /// Look up the type of a stored object without reading its body.
    ///
    /// Returns `None` if the object does not exist.
    pub fn object_kind(&self, oid: &Oid) -> Result<Option<ObjectKind>, GitError> {
        Ok(self.object_header(oid)?.map(|(kind, _)| kind))
    }

    fn object_header(&self, oid: &Oid) -> Result<Option<(ObjectKind, u64)>, GitError> {
        let git_oid = match to_git2_oid(oid) {
            Ok(git_oid) => git_oid,
            Err(GitError::ObjectNotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let odb = self.repo.odb().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        match odb.read_header(git_oid) {
            Ok((size, kind)) => Ok(Some((kind_from_git2(kind, oid)?, size as u64))),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, oid.as_str())),
        }
    }

    /// Resolve an object id to a tree, peeling commits to their root tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the object doesn't exist or cannot
    ///   be peeled to a tree
    pub fn peel_to_tree(&self, oid: &Oid) -> Result<Oid, GitError> {
        let git_oid = to_git2_oid(oid)?;

        let object = self
            .repo
            .find_object(git_oid, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let tree = object.peel_to_tree().map_err(|_| GitError::ObjectNotFound {
            oid: oid.to_string(),
        })?;

        from_git2_oid(tree.id())
    }

    /// Resolve a revision expression (tree id, commit id, branch name) to a tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the expression doesn't resolve to a tree
    pub fn resolve_treeish(&self, spec: &str) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .revparse_single(spec)
            .and_then(|object| object.peel_to_tree())
            .map_err(|_| GitError::ObjectNotFound {
                oid: spec.to_string(),
            })?;

        from_git2_oid(tree.id())
    }

    // =========================================================================
    // Blob Operations
    // =========================================================================

    /// Write content as a blob and return its OID.
    ///
    /// Writing content that is already stored returns the existing OID.
    pub fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        let oid = self.repo.blob(content).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        from_git2_oid(oid)
    }

    /// Read a blob by OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the blob doesn't exist
    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let git_oid = to_git2_oid(oid)?;

        let blob = self
            .repo
            .find_blob(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Tree Operations
    // =========================================================================

    /// List the direct entries of a tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the tree doesn't exist
    /// - [`GitError::UnsupportedEntry`] if an entry has a name or mode that
    ///   cannot be written back
    pub fn tree_entries(&self, tree: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        let git_oid = to_git2_oid(tree)?;

        let tree_obj = self
            .repo
            .find_tree(git_oid)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let mut entries = Vec::with_capacity(tree_obj.len());
        for entry in tree_obj.iter() {
            let name = entry.name().ok_or_else(|| GitError::UnsupportedEntry {
                tree: tree.to_string(),
                message: "entry name is not valid UTF-8".into(),
            })?;
            let name = EntryName::new(name).map_err(|e| GitError::UnsupportedEntry {
                tree: tree.to_string(),
                message: e.to_string(),
            })?;
            let mode = mode_from_filemode(entry.filemode(), tree)?;

            entries.push(TreeEntry {
                name,
                mode,
                oid: from_git2_oid(entry.id())?,
            });
        }

        Ok(entries)
    }

    /// Write a tree object from a set of entries and return its OID.
    ///
    /// Entries may be given in any order; the store sorts them canonically.
    /// Every referenced object except submodule commits must already exist
    /// and have the type its mode requires.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if a referenced object is missing
    /// - [`GitError::ObjectTypeMismatch`] if an object has the wrong type
    pub fn write_tree(&self, entries: &[TreeEntry]) -> Result<Oid, GitError> {
        for entry in entries {
            let expected = entry.mode.object_kind();
            if expected == ObjectKind::Commit {
                // Submodule commits live in another repository.
                continue;
            }

            match self.object_kind(&entry.oid)? {
                None => {
                    return Err(GitError::ObjectNotFound {
                        oid: entry.oid.to_string(),
                    })
                }
                Some(actual) if actual != expected => {
                    return Err(GitError::ObjectTypeMismatch {
                        oid: entry.oid.to_string(),
                        expected,
                        actual,
                    })
                }
                Some(_) => {}
            }
        }

        let mut builder = self.repo.treebuilder(None).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        for entry in entries {
            builder
                .insert(
                    entry.name.as_str(),
                    to_git2_oid(&entry.oid)?,
                    entry.mode.filemode(),
                )
                .map_err(|e| GitError::Internal {
                    message: format!("{}: {}", entry.name, e.message()),
                })?;
        }

        let oid = builder.write().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        from_git2_oid(oid)
    }

    /// Walk a tree in pre-order.
    ///
    /// With `recursive` false only direct entries are returned. Paths are
    /// relative to the walked tree. Blob sizes are read from object headers.
    pub fn walk_tree(&self, tree: &Oid, recursive: bool) -> Result<Vec<TreeWalkEntry>, GitError> {
        let git_oid = to_git2_oid(tree)?;

        let tree_obj = self
            .repo
            .find_tree(git_oid)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let mut raw = Vec::new();
        tree_obj
            .walk(git2::TreeWalkMode::PreOrder, |root, entry| {
                let path = entry.name().map(|name| format!("{root}{name}"));
                raw.push((path, entry.filemode(), entry.id()));
                if recursive {
                    git2::TreeWalkResult::Ok
                } else {
                    git2::TreeWalkResult::Skip
                }
            })
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let mut walked = Vec::with_capacity(raw.len());
        for (path, filemode, id) in raw {
            let path = path.ok_or_else(|| GitError::UnsupportedEntry {
                tree: tree.to_string(),
                message: "entry name is not valid UTF-8".into(),
            })?;
            let mode = mode_from_filemode(filemode, tree)?;
            let oid = from_git2_oid(id)?;
            let kind = mode.object_kind();
            let size = if kind == ObjectKind::Blob {
                self.object_header(&oid)?.map(|(_, size)| size).unwrap_or(0)
            } else {
                0
            };

            walked.push(TreeWalkEntry {
                path,
                mode,
                kind,
                oid,
                size,
            });
        }

        Ok(walked)
    }

    // =========================================================================
    // Commit Operations
    // =========================================================================

    /// Serialize a commit object without writing it.
    ///
    /// The returned text is exactly what would be stored for an unsigned
    /// commit, and is the payload a signature must cover.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the tree or a parent doesn't exist
    pub fn commit_buffer(&self, draft: &CommitDraft) -> Result<String, GitError> {
        let tree = self
            .repo
            .find_tree(to_git2_oid(&draft.tree)?)
            .map_err(|e| GitError::from_git2(e, draft.tree.as_str()))?;

        let mut parents = Vec::with_capacity(draft.parents.len());
        for parent in &draft.parents {
            let commit = self
                .repo
                .find_commit(to_git2_oid(parent)?)
                .map_err(|e| GitError::from_git2(e, parent.as_str()))?;
            parents.push(commit);
        }
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let author = to_git2_signature(&draft.author)?;
        let committer = to_git2_signature(&draft.committer)?;

        let buffer = self
            .repo
            .commit_create_buffer(&author, &committer, &draft.message, &tree, &parent_refs)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        buffer
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GitError::Internal {
                message: "commit buffer is not valid UTF-8".into(),
            })
    }

    /// Write an unsigned commit and return its OID.
    pub fn write_commit(&self, draft: &CommitDraft) -> Result<Oid, GitError> {
        let buffer = self.commit_buffer(draft)?;
        let odb = self.repo.odb().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        let oid = odb
            .write(git2::ObjectType::Commit, buffer.as_bytes())
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        from_git2_oid(oid)
    }

    /// Write a commit from a serialized buffer plus a detached signature.
    ///
    /// The signature is stored in the `gpgsig` header.
    pub fn write_signed_commit(&self, buffer: &str, signature: &str) -> Result<Oid, GitError> {
        let oid = self
            .repo
            .commit_signed(buffer, signature, Some("gpgsig"))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        from_git2_oid(oid)
    }

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut parents = Vec::new();
        for parent_id in commit.parent_ids() {
            parents.push(from_git2_oid(parent_id)?);
        }

        let info = CommitInfo {
            oid: oid.clone(),
            tree: from_git2_oid(commit.tree_id())?,
            parents,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author: from_git2_signature(&commit.author())?,
            committer: from_git2_signature(&commit.committer())?,
        };
        Ok(info)
    }

    /// Extract the signature and signed payload of a commit.
    ///
    /// Returns `None` for unsigned commits.
    pub fn commit_signature(&self, oid: &Oid) -> Result<Option<CommitSignature>, GitError> {
        let git_oid = to_git2_oid(oid)?;

        match self.repo.extract_signature(&git_oid, None) {
            Ok((signature, payload)) => {
                let signature = signature.as_str().map(str::to_string);
                let payload = payload.as_str().map(str::to_string);
                match (signature, payload) {
                    (Some(signature), Some(payload)) => {
                        Ok(Some(CommitSignature { signature, payload }))
                    }
                    _ => Err(GitError::Internal {
                        message: format!("signature of {oid} is not valid UTF-8"),
                    }),
                }
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                // libgit2 reports both "no such commit" and "no signature" as
                // NotFound; only the former is an error.
                if self.repo.find_commit(git_oid).is_ok() {
                    Ok(None)
                } else {
                    Err(GitError::ObjectNotFound {
                        oid: oid.to_string(),
                    })
                }
            }
            Err(e) => Err(GitError::from_git2(e, oid.as_str())),
        }
    }

    // =========================================================================
    // Ref Operations
    // =========================================================================

    /// Get the commit HEAD points at.
    ///
    /// Returns `None` when HEAD is unborn (no commits on the current branch).
    pub fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Ok(Some(from_git2_oid(oid)?))
    }

    /// Resolve a ref to its direct target, returning None if it doesn't exist.
    ///
    /// Symbolic refs are followed; tags are not peeled.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.try_resolve_ref_raw(refname)? {
            Some(raw) => Ok(Some(Oid::new(raw)?)),
            None => Ok(None),
        }
    }

    /// Update a ref with compare-and-swap semantics.
    ///
    /// The update only succeeds if the ref's current value matches `expected_old`.
    /// If `expected_old` is `None`, the ref must not exist (create case).
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let current = self.try_resolve_ref_raw(refname)?;

        match (expected_old, current.as_ref()) {
            (Some(expected), Some(actual)) if expected.as_str() != actual => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected.to_string(),
                    actual: actual.clone(),
                });
            }
            (Some(expected), None) => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected.to_string(),
                    actual: "<none>".to_string(),
                });
            }
            (None, Some(actual)) => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: "<none>".to_string(),
                    actual: actual.clone(),
                });
            }
            _ => {}
        }

        self.repo
            .reference(refname, to_git2_oid(new_oid)?, true, message)
            .map_err(|e| GitError::from_git2(e, refname))?;

        Ok(())
    }

    /// Try to resolve a ref to its raw OID string (without validation).
    fn try_resolve_ref_raw(&self, refname: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let resolved = reference.resolve().unwrap_or(reference);
                let oid = resolved.target().ok_or_else(|| GitError::Internal {
                    message: format!("ref {} has no target", refname),
                })?;
                Ok(Some(oid.to_string()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }
}

// =============================================================================
// Conversions at the git2 boundary
// =============================================================================

/// Hex length of an object id in the SHA-1 object store.
const SHA1_HEX_LEN: usize = 40;

/// Convert to a git2 id. A SHA-256 length id cannot name anything in this
/// store, so it is reported as a missing object.
fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    if oid.as_str().len() != SHA1_HEX_LEN {
        return Err(GitError::ObjectNotFound {
            oid: oid.to_string(),
        });
    }
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(GitError::from)
}

fn kind_from_git2(kind: git2::ObjectType, oid: &Oid) -> Result<ObjectKind, GitError> {
    match kind {
        git2::ObjectType::Blob => Ok(ObjectKind::Blob),
        git2::ObjectType::Tree => Ok(ObjectKind::Tree),
        git2::ObjectType::Commit => Ok(ObjectKind::Commit),
        git2::ObjectType::Tag => Ok(ObjectKind::Tag),
        other => Err(GitError::Internal {
            message: format!("object {oid} has unexpected type {other}"),
        }),
    }
}

fn mode_from_filemode(filemode: i32, tree: &Oid) -> Result<EntryMode, GitError> {
    EntryMode::from_filemode(filemode).ok_or_else(|| GitError::UnsupportedEntry {
        tree: tree.to_string(),
        message: format!("unknown file mode {filemode:06o}"),
    })
}

fn to_git2_signature(stamp: &PersonStamp) -> Result<git2::Signature<'static>, GitError> {
    let offset_minutes = stamp.when.offset().local_minus_utc() / 60;
    let time = git2::Time::new(stamp.when.timestamp(), offset_minutes);

    git2::Signature::new(&stamp.name, &stamp.email, &time).map_err(|e| GitError::Internal {
        message: format!("invalid identity '{} <{}>': {}", stamp.name, stamp.email, e.message()),
    })
}

fn from_git2_signature(sig: &git2::Signature<'_>) -> Result<PersonStamp, GitError> {
    let when = sig.when();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60).ok_or_else(|| {
        GitError::Internal {
            message: format!("invalid timezone offset {}", when.offset_minutes()),
        }
    })?;
    let when = DateTime::from_timestamp(when.seconds(), 0)
        .ok_or_else(|| GitError::Internal {
            message: format!("invalid timestamp {}", when.seconds()),
        })?
        .with_timezone(&offset);

    Ok(PersonStamp {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        when,
    })
}
