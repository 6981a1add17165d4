//! signing::gpg
//!
//! Signing and verification through the `gpg` binary.
//!
//! Both directions use gpg's machine-readable status protocol
//! (`--status-fd`). A signature counts as created only when gpg reports
//! `SIG_CREATED`; verification results come from `GOODSIG`, `BADSIG`,
//! `ERRSIG` and `NO_PUBKEY` lines.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{CommitSigner, SignError, SignatureCheck, SignatureVerifier};
use crate::core::identity::Identity;

const STATUS_PREFIX: &str = "[GNUPG:] ";

#[derive(Debug, Clone)]
pub struct GpgSigner {
    program: String,
}

impl GpgSigner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommitSigner for GpgSigner {
    fn sign(&self, key_id: &str, payload: &str) -> Result<String, SignError> {
        debug!(program = %self.program, key_id, "signing commit payload");

        let output = run(
            &self.program,
            &["--status-fd=2", "-bsau", key_id],
            payload.as_bytes(),
        )?;
        let status = String::from_utf8_lossy(&output.stderr);

        let created = status_lines(&status).any(|(tag, _)| tag == "SIG_CREATED");
        if !output.status.success() || !created {
            return Err(SignError::SignerFailed {
                key_id: key_id.to_string(),
                message: status.trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| SignError::SignerFailed {
            key_id: key_id.to_string(),
            message: "signature is not valid UTF-8".into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GpgVerifier {
    program: String,
}

impl GpgVerifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SignatureVerifier for GpgVerifier {
    fn verify(&self, signature: &str, payload: &str) -> Result<SignatureCheck, SignError> {
        let mut sig_file = tempfile::NamedTempFile::new().map_err(|e| SignError::VerifierFailed {
            message: format!("cannot create signature file: {e}"),
        })?;
        sig_file
            .write_all(signature.as_bytes())
            .and_then(|()| sig_file.flush())
            .map_err(|e| SignError::VerifierFailed {
                message: format!("cannot write signature file: {e}"),
            })?;

        let sig_path = sig_file.path().to_string_lossy().into_owned();
        let output = run(
            &self.program,
            &[
                "--status-fd=1",
                "--keyid-format=long",
                "--verify",
                &sig_path,
                "-",
            ],
            payload.as_bytes(),
        )?;

        let status = String::from_utf8_lossy(&output.stdout);
        parse_verify_status(&status).ok_or_else(|| SignError::VerifierFailed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn run(program: &str, args: &[&str], input: &[u8]) -> Result<std::process::Output, SignError> {
    let spawn_error = |source| SignError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).map_err(spawn_error)?;
    }

    child.wait_with_output().map_err(spawn_error)
}

/// Iterate `(tag, rest)` pairs of gpg status lines.
fn status_lines(status: &str) -> impl Iterator<Item = (&str, &str)> {
    status.lines().filter_map(|line| {
        let line = line.strip_prefix(STATUS_PREFIX)?;
        Some(line.split_once(' ').unwrap_or((line, "")))
    })
}

/// Interpret the status output of `gpg --verify`.
///
/// Returns `None` when gpg reported none of the recognized outcomes.
pub(crate) fn parse_verify_status(status: &str) -> Option<SignatureCheck> {
    let mut missing_key = None;

    for (tag, rest) in status_lines(status) {
        let (key_id, user) = rest.split_once(' ').unwrap_or((rest, ""));
        match tag {
            "GOODSIG" => {
                return Some(SignatureCheck::Good {
                    key_id: key_id.to_string(),
                    signer: parse_user_id(user),
                })
            }
            "BADSIG" => {
                return Some(SignatureCheck::Bad {
                    key_id: key_id.to_string(),
                })
            }
            "ERRSIG" | "NO_PUBKEY" => missing_key = Some(key_id.to_string()),
            _ => {}
        }
    }

    missing_key.map(|key_id| SignatureCheck::NoPublicKey { key_id })
}

/// Split an OpenPGP user id of the form `Name (comment) <email>`.
fn parse_user_id(user: &str) -> Option<Identity> {
    let (name, rest) = user.rsplit_once('<')?;
    let email = rest.strip_suffix('>')?;
    let name = match name.find(" (") {
        Some(idx) => &name[..idx],
        None => name,
    };
    Some(Identity::transient(name.trim(), email))
}
