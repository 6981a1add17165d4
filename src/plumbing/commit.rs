//! plumbing::commit
//!
//! The create-commit operation.
//!
//! # Steps
//!
//! 1. Validate the tree and parents. No parents means the current HEAD
//!    commit.
//! 2. Ask the [`SigningPolicy`]. When it says sign, signing is mandatory and
//!    under a committer trust model the signer replaces the committer.
//! 3. Add trailers (`Co-authored-by`, `Co-committed-by`, `Signed-off-by`)
//!    in a fixed order, so identical inputs give identical messages.
//! 4. Write the commit, signed or explicitly unsigned.
//! 5. Re-read the commit and report its verification status.
//!
//! [`CommitBuilder::commit_and_advance`] additionally moves a ref to the new
//! commit under the repository lock.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use super::verification::{verify_commit, CommitVerification};
use super::{object_url, ErrorKind};
use crate::core::config::Config;
use crate::core::identity::{resolve_signatories, Account, Identity, IdentityHint, Signatory};
use crate::core::ops::{LockError, RepoLock};
use crate::core::paths::RepoPaths;
use crate::core::types::{ObjectKind, Oid, RefName};
use crate::git::{CommitDraft, Git, GitError, PersonStamp};
use crate::signing::{
    CommitSigner, SignError, SignatureVerifier, SigningContext, SigningDecision, SigningPolicy,
};

/// Errors from commit creation.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid parent '{parent}': {message}")]
    InvalidParent { parent: String, message: String },

    #[error("invalid tree '{tree}': {message}")]
    InvalidTree { tree: String, message: String },

    /// The tree or a parent is not in the store.
    #[error("object does not exist: {sha}")]
    MissingObject { sha: String },

    #[error("HEAD has no commits; give parents explicitly")]
    UnbornHead,

    #[error("signing failed: {0}")]
    Signing(#[source] SignError),

    #[error("repository is read-only")]
    ReadOnlyRepository,

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Git(GitError),
}

impl CommitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommitError::InvalidParent { .. }
            | CommitError::InvalidTree { .. }
            | CommitError::MissingObject { .. }
            | CommitError::UnbornHead => ErrorKind::Caller,
            CommitError::Git(GitError::CasFailed { .. }) => ErrorKind::Caller,
            CommitError::ReadOnlyRepository => ErrorKind::Forbidden,
            CommitError::Signing(_) | CommitError::Lock(_) | CommitError::Git(_) => {
                ErrorKind::Server
            }
        }
    }
}

/// Trailer keys, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrailerKey {
    CoAuthoredBy,
    CoCommittedBy,
    SignedOffBy,
}

impl TrailerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailerKey::CoAuthoredBy => "Co-authored-by",
            TrailerKey::CoCommittedBy => "Co-committed-by",
            TrailerKey::SignedOffBy => "Signed-off-by",
        }
    }
}

impl std::fmt::Display for TrailerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit message trailers. Setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailers(BTreeMap<TrailerKey, String>);

impl Trailers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: TrailerKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: TrailerKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the full commit message.
    ///
    /// Trailing newlines of `message` are trimmed and exactly one is added.
    /// Trailers follow after a blank line.
    pub fn render(&self, message: &str) -> String {
        let mut out = message.trim_end_matches(['\n', '\r']).to_string();
        out.push('\n');

        if !self.0.is_empty() {
            out.push('\n');
            for (key, value) in &self.0 {
                out.push_str(&format!("{key}: {value}\n"));
            }
        }

        out
    }
}

/// Explicit timestamps for a commit. Missing dates are "now" in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitDates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<DateTime<FixedOffset>>,
}

/// A create-commit request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCommitRequest {
    pub tree: String,
    /// Parent commit ids; empty means the current HEAD commit
    pub parents: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<IdentityHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<IdentityHint>,
    pub dates: CommitDates,
    pub signoff: bool,
}

/// The result of a create-commit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommitResponse {
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub verification: CommitVerification,
}

/// Validated inputs of [`CommitBuilder::build`].
#[derive(Debug, Clone)]
pub struct CommitParts {
    pub tree: Oid,
    /// Empty means the current HEAD commit
    pub parents: Vec<Oid>,
    pub author: Signatory,
    pub committer: Signatory,
    pub message: String,
    pub dates: CommitDates,
    pub signoff: bool,
}

/// A written commit.
#[derive(Debug, Clone)]
pub struct BuiltCommit {
    pub oid: Oid,
    pub parents: Vec<Oid>,
    pub message: String,
    pub committer: Identity,
    pub verification: CommitVerification,
}

/// Builds commits against one repository.
pub struct CommitBuilder<'a> {
    git: &'a Git,
    config: &'a Config,
    policy: &'a dyn SigningPolicy,
    signer: &'a dyn CommitSigner,
    verifier: &'a dyn SignatureVerifier,
}

impl std::fmt::Debug for CommitBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitBuilder")
            .field("git", self.git)
            .finish_non_exhaustive()
    }
}

impl<'a> CommitBuilder<'a> {
    pub fn new(
        git: &'a Git,
        config: &'a Config,
        policy: &'a dyn SigningPolicy,
        signer: &'a dyn CommitSigner,
        verifier: &'a dyn SignatureVerifier,
    ) -> Self {
        Self {
            git,
            config,
            policy,
            signer,
            verifier,
        }
    }

    /// Create a commit on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - [`CommitError::ReadOnlyRepository`] for archived or mirror repositories
    /// - [`CommitError::InvalidTree`] / [`CommitError::InvalidParent`] for
    ///   references that are not object ids of the right type
    /// - [`CommitError::MissingObject`] when the tree or a parent is absent
    /// - [`CommitError::UnbornHead`] when no parents are given and HEAD has no commit
    /// - [`CommitError::Signing`] when signing is required and fails
    #[tracing::instrument(skip_all, fields(repo = %self.git.git_dir().display(), actor = %actor.username))]
    pub fn create(
        &self,
        actor: &Account,
        request: &CreateCommitRequest,
    ) -> Result<CreateCommitResponse, CommitError> {
        if self.config.is_read_only() {
            return Err(CommitError::ReadOnlyRepository);
        }

        let built = self.build(self.parts(actor, request)?)?;
        Ok(self.respond(built))
    }

    /// Create a commit and move `refname` to it.
    ///
    /// The ref is read and updated under the repository lock, and the update
    /// is a compare-and-swap against the value read. Without explicit
    /// parents the commit's parent is the ref's current commit, or HEAD when
    /// the ref does not exist yet.
    #[tracing::instrument(skip_all, fields(repo = %self.git.git_dir().display(), refname = %refname))]
    pub fn commit_and_advance(
        &self,
        actor: &Account,
        request: &CreateCommitRequest,
        refname: &RefName,
    ) -> Result<CreateCommitResponse, CommitError> {
        if self.config.is_read_only() {
            return Err(CommitError::ReadOnlyRepository);
        }

        let paths = RepoPaths::from_repo_info(&self.git.info());
        let _lock = RepoLock::acquire(&paths)?;

        let snapshot = self
            .git
            .try_resolve_ref(refname.as_str())
            .map_err(|e| self.store_error(e))?;

        let mut parts = self.parts(actor, request)?;
        if parts.parents.is_empty() {
            if let Some(current) = &snapshot {
                parts.parents.push(current.clone());
            }
        }

        let built = self.build(parts)?;
        self.git
            .update_ref_cas(
                refname.as_str(),
                &built.oid,
                snapshot.as_ref(),
                &format!("commit-tree: {}", built.message.lines().next().unwrap_or("")),
            )
            .map_err(|e| self.store_error(e))?;

        info!(commit = %built.oid, "advanced ref");
        Ok(self.respond(built))
    }

    /// Validate a request's references and resolve its identities.
    fn parts(&self, actor: &Account, request: &CreateCommitRequest) -> Result<CommitParts, CommitError> {
        let tree = Oid::new(request.tree.as_str()).map_err(|e| CommitError::InvalidTree {
            tree: request.tree.clone(),
            message: e.to_string(),
        })?;

        let parents = request
            .parents
            .iter()
            .map(|parent| {
                Oid::new(parent.as_str()).map_err(|e| CommitError::InvalidParent {
                    parent: parent.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (author, committer) =
            resolve_signatories(request.author.as_ref(), request.committer.as_ref(), actor);

        Ok(CommitParts {
            tree,
            parents,
            author,
            committer,
            message: request.message.clone(),
            dates: request.dates.clone(),
            signoff: request.signoff,
        })
    }

    /// Build, write, and verify a commit.
    pub fn build(&self, parts: CommitParts) -> Result<BuiltCommit, CommitError> {
        self.check_tree(&parts.tree)?;
        let parents = self.check_parents(parts.parents)?;

        let decision = self
            .policy
            .evaluate(&SigningContext {
                git: self.git,
                author: &parts.author,
                parents: &parents,
            })
            .map_err(CommitError::Signing)?;

        let author = parts.author.identity();
        let mut committer = parts.committer.identity();
        let mut trailers = Trailers::new();

        let key_id = match decision {
            SigningDecision::Sign { key_id, signer } => {
                if self.config.trust_model().ties_to_committer() {
                    if signer.differs_from(&committer) {
                        trailers.set(TrailerKey::CoAuthoredBy, committer.to_string());
                        trailers.set(TrailerKey::CoCommittedBy, committer.to_string());
                    }
                    committer = signer;
                }
                Some(key_id)
            }
            SigningDecision::Unsigned { reason } => {
                debug!(reason = %reason, "writing unsigned commit");
                None
            }
        };

        if parts.signoff {
            trailers.set(TrailerKey::SignedOffBy, committer.to_string());
        }

        let now = Utc::now().fixed_offset();
        let message = trailers.render(&parts.message);
        let draft = CommitDraft {
            tree: parts.tree,
            parents: parents.clone(),
            author: stamp(&author, parts.dates.author.unwrap_or(now)),
            committer: stamp(&committer, parts.dates.committer.unwrap_or(now)),
            message: message.clone(),
        };

        let oid = match key_id {
            None => self.git.write_commit(&draft).map_err(|e| self.store_error(e))?,
            Some(key_id) => {
                let buffer = self
                    .git
                    .commit_buffer(&draft)
                    .map_err(|e| self.store_error(e))?;
                let signature = self
                    .signer
                    .sign(&key_id, &buffer)
                    .map_err(CommitError::Signing)?;
                self.git
                    .write_signed_commit(&buffer, &signature)
                    .map_err(|e| self.store_error(e))?
            }
        };

        let verification =
            verify_commit(self.git, self.verifier, &oid).map_err(|e| self.store_error(e))?;
        debug!(commit = %oid, verified = verification.verified, "wrote commit");

        Ok(BuiltCommit {
            oid,
            parents,
            message,
            committer,
            verification,
        })
    }

    fn check_tree(&self, tree: &Oid) -> Result<(), CommitError> {
        match self.git.object_kind(tree).map_err(|e| self.store_error(e))? {
            Some(ObjectKind::Tree) => Ok(()),
            Some(other) => Err(CommitError::InvalidTree {
                tree: tree.to_string(),
                message: format!("object is a {other}"),
            }),
            None => Err(CommitError::MissingObject {
                sha: tree.to_string(),
            }),
        }
    }

    fn check_parents(&self, parents: Vec<Oid>) -> Result<Vec<Oid>, CommitError> {
        if parents.is_empty() {
            return match self.git.head_oid().map_err(|e| self.store_error(e))? {
                Some(head) => Ok(vec![head]),
                None => Err(CommitError::UnbornHead),
            };
        }

        for parent in &parents {
            match self.git.object_kind(parent).map_err(|e| self.store_error(e))? {
                Some(ObjectKind::Commit) => {}
                Some(other) => {
                    return Err(CommitError::InvalidParent {
                        parent: parent.to_string(),
                        message: format!("object is a {other}"),
                    })
                }
                None => {
                    return Err(CommitError::MissingObject {
                        sha: parent.to_string(),
                    })
                }
            }
        }

        Ok(parents)
    }

    fn respond(&self, built: BuiltCommit) -> CreateCommitResponse {
        CreateCommitResponse {
            url: object_url(self.config, ObjectKind::Commit, &built.oid),
            sha: built.oid.to_string(),
            verification: built.verification,
        }
    }

    fn store_error(&self, err: GitError) -> CommitError {
        match err {
            GitError::ObjectNotFound { oid } => CommitError::MissingObject { sha: oid },
            other => {
                error!(repo = %self.git.git_dir().display(), error = %other, "commit failed");
                CommitError::Git(other)
            }
        }
    }
}

fn stamp(identity: &Identity, when: DateTime<FixedOffset>) -> PersonStamp {
    PersonStamp {
        name: identity.name.clone(),
        email: identity.email.clone(),
        when,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, RepoConfig};
    use crate::signing::mock::{MockPolicy, MockSigner, MockVerifier};
    use crate::signing::UnsignedReason;
    use chrono::TimeZone;
    use tempfile::TempDir;

    mod trailers {
        use super::*;

        #[test]
        fn fixed_order() {
            let mut trailers = Trailers::new();
            trailers.set(TrailerKey::SignedOffBy, "C <c@x.com>");
            trailers.set(TrailerKey::CoCommittedBy, "B <b@x.com>");
            trailers.set(TrailerKey::CoAuthoredBy, "A <a@x.com>");

            assert_eq!(
                trailers.render("subject\n\n"),
                "subject\n\n\
                 Co-authored-by: A <a@x.com>\n\
                 Co-committed-by: B <b@x.com>\n\
                 Signed-off-by: C <c@x.com>\n"
            );
        }

        #[test]
        fn last_value_kept() {
            let mut trailers = Trailers::new();
            trailers.set(TrailerKey::SignedOffBy, "first");
            trailers.set(TrailerKey::SignedOffBy, "second");
            assert_eq!(trailers.get(TrailerKey::SignedOffBy), Some("second"));
        }

        #[test]
        fn no_trailers_single_newline() {
            assert_eq!(Trailers::new().render("msg"), "msg\n");
            assert_eq!(Trailers::new().render("msg\n\n\n"), "msg\n");
        }
    }

    fn actor() -> Account {
        Account {
            username: "user2".into(),
            full_name: "User Two".into(),
            email: "user2@example.com".into(),
            gpg_key_ids: vec!["KEY1".into()],
            two_factor: true,
        }
    }

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .unwrap()
    }

    fn request(git: &Git) -> CreateCommitRequest {
        CreateCommitRequest {
            tree: git.write_tree(&[]).unwrap().to_string(),
            message: "initial".into(),
            dates: CommitDates {
                author: Some(date()),
                committer: Some(date()),
            },
            ..Default::default()
        }
    }

    fn unsigned() -> MockPolicy {
        MockPolicy::new(SigningDecision::Unsigned {
            reason: UnsignedReason::NoKey,
        })
    }

    mod build {
        use super::*;

        #[test]
        fn unborn_head_needs_parents() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::default();
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let err = builder.create(&actor(), &request(&git)).unwrap_err();
            assert!(matches!(err, CommitError::UnbornHead));
        }

        #[test]
        fn branch_name_parent_rejected() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::default();
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let mut req = request(&git);
            req.parents = vec!["main".into()];
            let err = builder.create(&actor(), &req).unwrap_err();
            assert!(matches!(err, CommitError::InvalidParent { ref parent, .. } if parent == "main"));
            assert_eq!(err.kind(), ErrorKind::Caller);
        }

        #[test]
        fn tree_as_parent_rejected() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::default();
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let mut req = request(&git);
            req.parents = vec![req.tree.clone()];
            assert!(matches!(
                builder.create(&actor(), &req),
                Err(CommitError::InvalidParent { .. })
            ));
        }

        #[test]
        fn missing_tree() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::default();
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let mut req = request(&git);
            req.tree = "2222222222222222222222222222222222222222".into();
            assert!(matches!(
                builder.create(&actor(), &req),
                Err(CommitError::MissingObject { .. })
            ));
        }

        #[test]
        fn identical_inputs_identical_commit() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::default();
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let root = git
                .write_commit(&CommitDraft {
                    tree: git.write_tree(&[]).unwrap(),
                    parents: vec![],
                    author: stamp(&actor().identity(), date()),
                    committer: stamp(&actor().identity(), date()),
                    message: "root\n".into(),
                })
                .unwrap();

            let mut req = request(&git);
            req.parents = vec![root.to_string()];
            let first = builder.create(&actor(), &req).unwrap();
            let second = builder.create(&actor(), &req).unwrap();
            assert_eq!(first.sha, second.sha);
            assert!(!first.verification.verified);
        }

        #[test]
        fn read_only_refused() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let config = Config::new(
                GlobalConfig::default(),
                Some(RepoConfig {
                    mirror: Some(true),
                    ..Default::default()
                }),
            );
            let (policy, signer, verifier) = (unsigned(), MockSigner::new(), MockVerifier::new());
            let builder = CommitBuilder::new(&git, &config, &policy, &signer, &verifier);

            let err = builder.create(&actor(), &request(&git)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
        }
    }
}
