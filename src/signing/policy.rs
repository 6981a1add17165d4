//! signing::policy
//!
//! Signing policy driven by configuration.

use tracing::debug;

use super::{
    commit_is_signed, SignError, SignatureVerifier, SigningContext, SigningDecision, SigningKey,
    SigningPolicy, SigningRule, UnsignedReason,
};
use crate::core::config::Config;
use crate::core::identity::Identity;
use crate::git::Git;

/// A [`SigningPolicy`] built from the `[signing]` configuration section.
///
/// Signing happens only when a key is available, a signer identity is
/// known, and every configured rule passes.
pub struct ConfiguredPolicy {
    key: SigningKey,
    signer_name: Option<String>,
    signer_email: Option<String>,
    rules: Vec<SigningRule>,
    verifier: Box<dyn SignatureVerifier>,
}

impl std::fmt::Debug for ConfiguredPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredPolicy")
            .field("key", &self.key)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl ConfiguredPolicy {
    pub fn new(
        key: SigningKey,
        rules: Vec<SigningRule>,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            key,
            signer_name: None,
            signer_email: None,
            rules,
            verifier,
        }
    }

    /// Build the policy from loaded configuration.
    ///
    /// `verifier` checks parent signatures for the `parentsigned` rule.
    pub fn from_config(config: &Config, verifier: Box<dyn SignatureVerifier>) -> Self {
        let mut policy = Self::new(config.signing_key(), config.signing_rules(), verifier);
        policy.signer_name = config.signing_name().map(str::to_string);
        policy.signer_email = config.signing_email().map(str::to_string);
        policy
    }

    /// Set the signer identity instead of reading it from Git config.
    pub fn with_signer(mut self, identity: Identity) -> Self {
        self.signer_name = Some(identity.name);
        self.signer_email = Some(identity.email);
        self
    }

    fn resolve_key(&self, git: &Git) -> Result<Option<String>, SignError> {
        match &self.key {
            SigningKey::None => Ok(None),
            SigningKey::Default => Ok(git
                .config_string("user.signingkey")?
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())),
            SigningKey::Explicit(key) => Ok(Some(key.clone())),
        }
    }

    fn resolve_signer(&self, git: &Git) -> Result<Option<Identity>, SignError> {
        let name = match &self.signer_name {
            Some(name) => Some(name.clone()),
            None => git.config_string("user.name")?,
        };
        let email = match &self.signer_email {
            Some(email) => Some(email.clone()),
            None => git.config_string("user.email")?,
        };

        match email.filter(|email| !email.is_empty()) {
            Some(email) => Ok(Some(Identity::transient(
                name.as_deref().unwrap_or(""),
                &email,
            ))),
            None => Ok(None),
        }
    }

    fn rule_passes(&self, rule: SigningRule, ctx: &SigningContext<'_>) -> Result<bool, SignError> {
        let account = ctx.author.account();
        match rule {
            SigningRule::Never => Ok(false),
            SigningRule::Always => Ok(true),
            SigningRule::PubKey => Ok(account.is_some_and(|a| !a.gpg_key_ids.is_empty())),
            SigningRule::TwoFa => Ok(account.is_some_and(|a| a.two_factor)),
            SigningRule::ParentSigned => {
                for parent in ctx.parents {
                    if !commit_is_signed(ctx.git, self.verifier.as_ref(), parent)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

impl SigningPolicy for ConfiguredPolicy {
    fn evaluate(&self, ctx: &SigningContext<'_>) -> Result<SigningDecision, SignError> {
        let Some(key_id) = self.resolve_key(ctx.git)? else {
            debug!("no signing key configured");
            return Ok(SigningDecision::Unsigned {
                reason: UnsignedReason::NoKey,
            });
        };

        let Some(signer) = self.resolve_signer(ctx.git)? else {
            debug!(key_id = %key_id, "signing key has no signer identity");
            return Ok(SigningDecision::Unsigned {
                reason: UnsignedReason::NoSignerIdentity,
            });
        };

        for rule in &self.rules {
            if !self.rule_passes(*rule, ctx)? {
                debug!(rule = %rule, "signing rule not satisfied");
                return Ok(SigningDecision::Unsigned {
                    reason: UnsignedReason::Rule(*rule),
                });
            }
        }

        debug!(key_id = %key_id, signer = %signer, "commit will be signed");
        Ok(SigningDecision::Sign { key_id, signer })
    }
}
