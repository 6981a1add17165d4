//! signing::mock
//!
//! Deterministic signing doubles for tests.
//!
//! # Design
//!
//! [`MockSigner`] produces an armored block that encodes the key id and a
//! digest of the payload. [`MockVerifier`] decodes that block, so a
//! signature round-trips without a keyring, and a tampered payload is
//! reported as a bad signature. [`MockPolicy`] returns a fixed decision.
//!
//! All doubles are cheap to clone and share their recorded state.
//!
//! # Example
//!
//! ```
//! use treesmith::core::identity::Identity;
//! use treesmith::signing::mock::{MockSigner, MockVerifier};
//! use treesmith::signing::{CommitSigner, SignatureVerifier};
//!
//! let signer = MockSigner::new();
//! let verifier = MockVerifier::new().with_key("KEY1", Identity::new("Signer", "s@x.com"));
//!
//! let signature = signer.sign("KEY1", "tree abc\n").unwrap();
//! assert!(verifier.verify(&signature, "tree abc\n").unwrap().is_good());
//! assert!(!verifier.verify(&signature, "tree def\n").unwrap().is_good());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use data_encoding::BASE64;

use super::{
    CommitSigner, SignError, SignatureCheck, SignatureVerifier, SigningContext, SigningDecision,
    SigningPolicy,
};
use crate::core::identity::Identity;
use crate::core::types::Oid;

const ARMOR_BEGIN: &str = "-----BEGIN PGP SIGNATURE-----";
const ARMOR_END: &str = "-----END PGP SIGNATURE-----";

/// 64-bit FNV-1a, enough to tell payloads apart in tests.
fn digest(payload: &str) -> u64 {
    payload.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn armor(key_id: &str, payload: &str) -> String {
    let body = format!("{}:{:016x}", key_id, digest(payload));
    format!("{ARMOR_BEGIN}\n\n{}\n{ARMOR_END}\n", BASE64.encode(body.as_bytes()))
}

fn dearmor(signature: &str) -> Option<(String, String)> {
    let body: String = signature
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != ARMOR_BEGIN && *line != ARMOR_END)
        .collect();
    let decoded = BASE64.decode(body.as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (key_id, digest) = decoded.rsplit_once(':')?;
    Some((key_id.to_string(), digest.to_string()))
}

/// A recorded signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub key_id: String,
    pub payload: String,
}

#[derive(Debug, Default)]
struct MockSignerInner {
    fail: bool,
    requests: Vec<SignRequest>,
}

/// Mock commit signer.
#[derive(Debug, Clone, Default)]
pub struct MockSigner {
    inner: Arc<Mutex<MockSignerInner>>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signer whose every request fails.
    pub fn failing() -> Self {
        let signer = Self::new();
        signer.inner.lock().unwrap().fail = true;
        signer
    }

    /// Everything this signer was asked to sign.
    pub fn requests(&self) -> Vec<SignRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

impl CommitSigner for MockSigner {
    fn sign(&self, key_id: &str, payload: &str) -> Result<String, SignError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(SignRequest {
            key_id: key_id.to_string(),
            payload: payload.to_string(),
        });

        if inner.fail {
            return Err(SignError::SignerFailed {
                key_id: key_id.to_string(),
                message: "mock signer configured to fail".into(),
            });
        }

        Ok(armor(key_id, payload))
    }
}

/// Mock signature verifier backed by an in-memory keyring.
#[derive(Debug, Clone, Default)]
pub struct MockVerifier {
    keys: Arc<Mutex<HashMap<String, Identity>>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a public key and the identity it belongs to.
    pub fn with_key(self, key_id: &str, owner: Identity) -> Self {
        self.keys
            .lock()
            .unwrap()
            .insert(key_id.to_string(), owner);
        self
    }
}

impl SignatureVerifier for MockVerifier {
    fn verify(&self, signature: &str, payload: &str) -> Result<SignatureCheck, SignError> {
        let Some((key_id, signed_digest)) = dearmor(signature) else {
            return Err(SignError::VerifierFailed {
                message: "not a mock signature".into(),
            });
        };

        let keys = self.keys.lock().unwrap();
        let Some(owner) = keys.get(&key_id) else {
            return Ok(SignatureCheck::NoPublicKey { key_id });
        };

        if signed_digest != format!("{:016x}", digest(payload)) {
            return Ok(SignatureCheck::Bad { key_id });
        }

        Ok(SignatureCheck::Good {
            key_id,
            signer: Some(owner.clone()),
        })
    }
}

/// A recorded policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyQuery {
    pub author: Identity,
    pub parents: Vec<Oid>,
}

#[derive(Debug)]
struct MockPolicyInner {
    decision: SigningDecision,
    queries: Vec<PolicyQuery>,
}

/// Mock signing policy that always returns the same decision.
#[derive(Debug, Clone)]
pub struct MockPolicy {
    inner: Arc<Mutex<MockPolicyInner>>,
}

impl MockPolicy {
    pub fn new(decision: SigningDecision) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockPolicyInner {
                decision,
                queries: Vec::new(),
            })),
        }
    }

    /// Every evaluation this policy answered.
    pub fn queries(&self) -> Vec<PolicyQuery> {
        self.inner.lock().unwrap().queries.clone()
    }
}

impl SigningPolicy for MockPolicy {
    fn evaluate(&self, ctx: &SigningContext<'_>) -> Result<SigningDecision, SignError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(PolicyQuery {
            author: ctx.author.identity(),
            parents: ctx.parents.to_vec(),
        });
        Ok(inner.decision.clone())
    }
}
