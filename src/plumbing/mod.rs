//! plumbing
//!
//! Request-level operations over the object store.
//!
//! # Operations
//!
//! - [`tree::write_tree`] - merge a base tree with sparse edits and write the result
//! - [`listing::get_tree`] - list a tree's entries with pagination
//! - [`commit::CommitBuilder`] - build, optionally sign, and verify a commit
//!
//! Each operation takes serde request types and returns serde response
//! types, so a transport can expose them as JSON without further mapping.
//! Every error type reports an [`ErrorKind`] that tells the transport
//! whether the caller, the repository's state, or the server is at fault.

pub mod commit;
pub mod entry;
pub mod listing;
pub mod tree;
pub mod verification;

pub use commit::{CommitBuilder, CommitError, CreateCommitRequest, CreateCommitResponse};
pub use entry::{EntryResolver, EntrySource, ResolvedOp, TreeOp, WriteTreeEntry};
pub use listing::{get_tree, GitEntry, GitTreeResponse, ListTreeOptions};
pub use tree::{write_tree, TreeError, TreeMerge, WriteTreeRequest, WriteTreeResponse};
pub use verification::CommitVerification;

use crate::core::config::Config;
use crate::core::types::{ObjectKind, Oid};

/// Who is responsible for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the caller can correct and retry.
    Caller,
    /// The repository refuses the operation.
    Forbidden,
    /// Store, signer, or filesystem failure.
    Server,
}

impl ErrorKind {
    /// The HTTP status class a transport should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Caller => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::Server => 500,
        }
    }
}

/// API link for an object, when the repository has an `api_url`.
pub(crate) fn object_url(config: &Config, kind: ObjectKind, oid: &Oid) -> Option<String> {
    let collection = match kind {
        ObjectKind::Blob => "blobs",
        ObjectKind::Tree => "trees",
        ObjectKind::Commit => "commits",
        ObjectKind::Tag => "tags",
    };
    config
        .api_url()
        .map(|base| format!("{base}/git/{collection}/{oid}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, RepoConfig};

    #[test]
    fn status_classes() {
        assert_eq!(ErrorKind::Caller.http_status(), 400);
        assert_eq!(ErrorKind::Forbidden.http_status(), 403);
        assert_eq!(ErrorKind::Server.http_status(), 500);
    }

    #[test]
    fn urls_need_api_url() {
        let oid = Oid::new("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        assert_eq!(object_url(&Config::default(), ObjectKind::Tree, &oid), None);

        let config = Config::new(
            GlobalConfig::default(),
            Some(RepoConfig {
                api_url: Some("https://forge.example/api/v1/repos/o/r".into()),
                ..Default::default()
            }),
        );
        assert_eq!(
            object_url(&config, ObjectKind::Tree, &oid).as_deref(),
            Some("https://forge.example/api/v1/repos/o/r/git/trees/4b825dc642cb6eb9a060e54bf8d69288fbee4904")
        );
    }
}
