//! signing
//!
//! Commit signing decisions and the cryptographic seams behind them.
//!
//! # Architecture
//!
//! Three capabilities are consumed by the commit builder:
//!
//! - [`SigningPolicy`] decides whether a commit is signed, with which key
//!   and as whom
//! - [`CommitSigner`] produces a detached signature over a commit payload
//! - [`SignatureVerifier`] checks a signature against its payload
//!
//! [`ConfiguredPolicy`] implements the policy from configuration. The
//! [`gpg`] module implements signing and verification with the `gpg`
//! binary, and [`mock`] provides deterministic doubles for tests.
//!
//! # Trust Models
//!
//! A repository's [`TrustModel`] determines whose identity a signed commit
//! carries. Under the committer models the signer becomes the committer.

pub mod gpg;
pub mod mock;
mod policy;

pub use policy::ConfiguredPolicy;

use std::str::FromStr;

use thiserror::Error;

use crate::core::identity::{Identity, Signatory};
use crate::core::types::Oid;
use crate::git::{Git, GitError};

/// Errors from signing and verification.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signing program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The signer ran but did not produce a signature.
    #[error("signing with key {key_id} failed: {message}")]
    SignerFailed { key_id: String, message: String },

    /// The verifier could not evaluate a signature.
    #[error("signature verification failed: {message}")]
    VerifierFailed { message: String },

    /// The policy could not reach a decision.
    #[error("signing policy error: {message}")]
    Policy { message: String },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// How a repository ties commit trust to identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustModel {
    /// Use the instance-wide default model.
    #[default]
    Default,
    Collaborator,
    Committer,
    CollaboratorCommitter,
}

impl TrustModel {
    /// All accepted configuration spellings.
    pub const NAMES: &'static [&'static str] =
        &["default", "collaborator", "committer", "collaboratorcommitter"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrustModel::Default => "default",
            TrustModel::Collaborator => "collaborator",
            TrustModel::Committer => "committer",
            TrustModel::CollaboratorCommitter => "collaboratorcommitter",
        }
    }

    /// Replace `Default` with the given fallback model.
    pub fn resolve(self, fallback: TrustModel) -> TrustModel {
        match self {
            TrustModel::Default => match fallback {
                TrustModel::Default => TrustModel::Collaborator,
                other => other,
            },
            other => other,
        }
    }

    /// Whether signed commits must carry the signer as committer.
    pub fn ties_to_committer(&self) -> bool {
        matches!(
            self,
            TrustModel::Committer | TrustModel::CollaboratorCommitter
        )
    }
}

impl FromStr for TrustModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(TrustModel::Default),
            "collaborator" => Ok(TrustModel::Collaborator),
            "committer" => Ok(TrustModel::Committer),
            "collaboratorcommitter" => Ok(TrustModel::CollaboratorCommitter),
            _ => Err(format!(
                "invalid trust model '{}', must be one of: {}",
                s,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for TrustModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition that must hold before a commit is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningRule {
    /// Never sign.
    Never,
    /// No condition.
    Always,
    /// The author is the actor and has a registered GPG key.
    PubKey,
    /// The author is the actor and has two-factor authentication enabled.
    TwoFa,
    /// Every parent commit carries a good signature.
    ParentSigned,
}

impl SigningRule {
    pub const NAMES: &'static [&'static str] =
        &["never", "always", "pubkey", "twofa", "parentsigned"];

    /// Rules applied when none are configured.
    pub const DEFAULTS: &'static [SigningRule] = &[
        SigningRule::PubKey,
        SigningRule::TwoFa,
        SigningRule::ParentSigned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningRule::Never => "never",
            SigningRule::Always => "always",
            SigningRule::PubKey => "pubkey",
            SigningRule::TwoFa => "twofa",
            SigningRule::ParentSigned => "parentsigned",
        }
    }
}

impl FromStr for SigningRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(SigningRule::Never),
            "always" => Ok(SigningRule::Always),
            "pubkey" => Ok(SigningRule::PubKey),
            "twofa" => Ok(SigningRule::TwoFa),
            "parentsigned" => Ok(SigningRule::ParentSigned),
            _ => Err(format!(
                "invalid signing rule '{}', must be one of: {}",
                s,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for SigningRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the signing key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKey {
    /// Never sign.
    None,
    /// Use `user.signingkey` from the repository's Git config.
    Default,
    /// Use this key id.
    Explicit(String),
}

impl SigningKey {
    /// Parse a configuration value: `none`, `default`, or a key id.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "none" => SigningKey::None,
            "default" => SigningKey::Default,
            key => SigningKey::Explicit(key.to_string()),
        }
    }
}

/// Why a commit is not signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedReason {
    /// No signing key is configured.
    NoKey,
    /// A key is configured but no signer identity could be determined.
    NoSignerIdentity,
    /// A signing rule did not pass.
    Rule(SigningRule),
}

impl std::fmt::Display for UnsignedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsignedReason::NoKey => f.write_str("nokey"),
            UnsignedReason::NoSignerIdentity => f.write_str("nosigner"),
            UnsignedReason::Rule(rule) => f.write_str(rule.as_str()),
        }
    }
}

/// The outcome of a signing policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningDecision {
    /// Write the commit unsigned. Signing is explicitly disabled.
    Unsigned { reason: UnsignedReason },
    /// Signing is mandatory: failure to sign fails the commit.
    Sign { key_id: String, signer: Identity },
}

/// What a policy sees when deciding.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub git: &'a Git,
    pub author: &'a Signatory,
    pub parents: &'a [Oid],
}

/// Decides whether and how a commit is signed.
pub trait SigningPolicy {
    fn evaluate(&self, ctx: &SigningContext<'_>) -> Result<SigningDecision, SignError>;
}

/// Produces detached signatures.
pub trait CommitSigner {
    /// Sign `payload` with `key_id` and return the ASCII-armored signature.
    fn sign(&self, key_id: &str, payload: &str) -> Result<String, SignError>;
}

/// The result of checking one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The signature is valid.
    Good {
        key_id: String,
        signer: Option<Identity>,
    },
    /// The signature does not match the payload.
    Bad { key_id: String },
    /// The key that made the signature is unknown.
    NoPublicKey { key_id: String },
}

impl SignatureCheck {
    pub fn is_good(&self) -> bool {
        matches!(self, SignatureCheck::Good { .. })
    }
}

/// Checks detached signatures.
pub trait SignatureVerifier {
    fn verify(&self, signature: &str, payload: &str) -> Result<SignatureCheck, SignError>;
}

/// Whether a stored commit carries a good signature.
pub(crate) fn commit_is_signed(
    git: &Git,
    verifier: &dyn SignatureVerifier,
    commit: &Oid,
) -> Result<bool, SignError> {
    match git.commit_signature(commit)? {
        Some(sig) => Ok(verifier.verify(&sig.signature, &sig.payload)?.is_good()),
        None => Ok(false),
    }
}
