//! plumbing::verification
//!
//! Signature verification metadata returned with a created commit.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::identity::Identity;
use crate::core::types::Oid;
use crate::git::{Git, GitError};
use crate::signing::{SignatureCheck, SignatureVerifier};

pub const REASON_NOT_SIGNED: &str = "not_signed_commit";
pub const REASON_VALID: &str = "valid";
pub const REASON_BAD_SIGNATURE: &str = "bad_signature";
pub const REASON_NO_PUBLIC_KEY: &str = "no_public_key";
pub const REASON_VERIFICATION_ERROR: &str = "verification_error";

/// Signature status of a stored commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitVerification {
    pub verified: bool,
    pub reason: String,
    /// Armored signature, empty for unsigned commits
    pub signature: String,
    pub signer: Option<Identity>,
    /// The signed bytes, empty for unsigned commits
    pub payload: String,
}

impl CommitVerification {
    fn unsigned() -> Self {
        Self {
            verified: false,
            reason: REASON_NOT_SIGNED.to_string(),
            signature: String::new(),
            signer: None,
            payload: String::new(),
        }
    }
}

/// Re-read a commit and check its signature.
///
/// A verifier that cannot evaluate the signature does not fail the call;
/// the result reports `verification_error` instead.
pub fn verify_commit(
    git: &Git,
    verifier: &dyn SignatureVerifier,
    oid: &Oid,
) -> Result<CommitVerification, GitError> {
    let Some(sig) = git.commit_signature(oid)? else {
        return Ok(CommitVerification::unsigned());
    };

    let (verified, reason, signer) = match verifier.verify(&sig.signature, &sig.payload) {
        Ok(SignatureCheck::Good { signer, .. }) => (true, REASON_VALID, signer),
        Ok(SignatureCheck::Bad { .. }) => (false, REASON_BAD_SIGNATURE, None),
        Ok(SignatureCheck::NoPublicKey { .. }) => (false, REASON_NO_PUBLIC_KEY, None),
        Err(e) => {
            warn!(commit = %oid, error = %e, "could not verify commit signature");
            (false, REASON_VERIFICATION_ERROR, None)
        }
    };

    Ok(CommitVerification {
        verified,
        reason: reason.to_string(),
        signature: sig.signature,
        signer,
        payload: sig.payload,
    })
}
