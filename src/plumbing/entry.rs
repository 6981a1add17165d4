//! plumbing::entry
//!
//! Wire entries of a write-tree request and their resolution.
//!
//! Resolution is split in two phases. [`TreeOp::parse`] validates a wire
//! entry without touching the store, and [`EntryResolver::resolve`] turns a
//! validated operation into something the merge can apply, writing inline
//! content as a blob on the way. A request is fully parsed before anything is
//! resolved, so rejected input never leaves objects behind.

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

use super::tree::{store_error, TreeError};
use crate::core::types::{EntryMode, EntryName, Oid};
use crate::git::{Git, TreeEntry};

/// One entry of a write-tree request.
///
/// Provide `sha` to reference an existing object, `content` (standard
/// base64) to store new content, or neither to delete `name`. Empty strings
/// count as omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteTreeEntry {
    pub name: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl WriteTreeEntry {
    /// An entry referencing an existing object.
    pub fn object(name: &str, mode: &str, sha: &str) -> Self {
        Self {
            name: name.into(),
            mode: mode.into(),
            sha: Some(sha.into()),
            content: None,
        }
    }

    /// An entry with base64 content.
    pub fn content(name: &str, mode: &str, content: &str) -> Self {
        Self {
            name: name.into(),
            mode: mode.into(),
            sha: None,
            content: Some(content.into()),
        }
    }

    /// An entry that deletes `name`.
    pub fn delete(name: &str, mode: &str) -> Self {
        Self {
            name: name.into(),
            mode: mode.into(),
            sha: None,
            content: None,
        }
    }
}

/// Where an upserted entry's object comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// An object already in the store.
    Object(Oid),
    /// Bytes to be stored as a new blob.
    Inline(Vec<u8>),
}

/// A validated edit to a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    Upsert {
        name: EntryName,
        mode: EntryMode,
        source: EntrySource,
    },
    Delete {
        name: EntryName,
    },
}

impl TreeOp {
    /// Validate a wire entry.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidName`] for an empty, reserved, or multi-component name
    /// - [`TreeError::InvalidMode`] for an unknown mode, or content under a
    ///   tree or submodule mode
    /// - [`TreeError::ConflictingSource`] when both `sha` and `content` are given
    /// - [`TreeError::InvalidReference`] when `sha` is not a full object id
    /// - [`TreeError::InvalidContent`] when `content` is not base64
    pub fn parse(entry: &WriteTreeEntry) -> Result<Self, TreeError> {
        let name = EntryName::new(entry.name.as_str()).map_err(|e| TreeError::InvalidName {
            name: entry.name.clone(),
            message: e.to_string(),
        })?;

        let mode = EntryMode::parse(&entry.mode).map_err(|e| TreeError::InvalidMode {
            name: entry.name.clone(),
            message: e.to_string(),
        })?;

        let sha = entry.sha.as_deref().filter(|s| !s.is_empty());
        let content = entry.content.as_deref().filter(|c| !c.is_empty());

        match (sha, content) {
            (Some(_), Some(_)) => Err(TreeError::ConflictingSource {
                name: entry.name.clone(),
            }),
            (Some(sha), None) => {
                let oid = Oid::new(sha).map_err(|_| TreeError::InvalidReference {
                    name: entry.name.clone(),
                    sha: sha.to_string(),
                })?;
                Ok(TreeOp::Upsert {
                    name,
                    mode,
                    source: EntrySource::Object(oid),
                })
            }
            (None, Some(content)) => {
                if !mode.accepts_content() {
                    return Err(TreeError::InvalidMode {
                        name: entry.name.clone(),
                        message: format!(
                            "content given, but mode {mode} is not a blob, executable, or symlink"
                        ),
                    });
                }
                Ok(TreeOp::Upsert {
                    name,
                    mode,
                    source: EntrySource::Inline(decode_content(&entry.name, content)?),
                })
            }
            (None, None) => Ok(TreeOp::Delete { name }),
        }
    }

    /// The entry name this operation targets.
    pub fn name(&self) -> &EntryName {
        match self {
            TreeOp::Upsert { name, .. } | TreeOp::Delete { name } => name,
        }
    }
}

/// Decode standard base64, tolerating line breaks.
fn decode_content(name: &str, content: &str) -> Result<Vec<u8>, TreeError> {
    let compact: Vec<u8> = content
        .bytes()
        .filter(|b| *b != b'\n' && *b != b'\r')
        .collect();

    BASE64
        .decode(&compact)
        .map_err(|e| TreeError::InvalidContent {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// An operation ready to be applied to a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOp {
    Upsert(TreeEntry),
    Delete(EntryName),
}

/// Turns validated operations into tree entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryResolver<'a> {
    git: &'a Git,
}

impl<'a> EntryResolver<'a> {
    pub fn new(git: &'a Git) -> Self {
        Self { git }
    }

    /// Resolve one operation, storing inline content as a blob.
    ///
    /// Object references are passed through; their existence is checked
    /// when the tree is written.
    pub fn resolve(&self, op: TreeOp) -> Result<ResolvedOp, TreeError> {
        match op {
            TreeOp::Delete { name } => Ok(ResolvedOp::Delete(name)),
            TreeOp::Upsert { name, mode, source } => {
                let oid = match source {
                    EntrySource::Object(oid) => oid,
                    EntrySource::Inline(bytes) => self
                        .git
                        .write_blob(&bytes)
                        .map_err(|e| store_error(self.git, e))?,
                };
                Ok(ResolvedOp::Upsert(TreeEntry { name, mode, oid }))
            }
        }
    }
}
