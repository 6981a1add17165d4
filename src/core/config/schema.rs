//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$TREESMITH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/treesmith/config.toml`
//! 3. `~/.treesmith/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<git_dir>/treesmith/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing (trust models and signing
//! rules must be known names, page sizes must be positive).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::signing::{SigningRule, TrustModel};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [account]
/// username = "user2"
/// full_name = "User Two"
/// email = "user2@example.com"
/// gpg_key_ids = ["3AA5C34371567BD2"]
/// two_factor = true
///
/// [signing]
/// key = "default"
/// crud_actions = ["pubkey", "twofa", "parentsigned"]
/// default_trust_model = "collaborator"
///
/// [api]
/// default_git_trees_per_page = 1000
///
/// [log]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// The acting account
    pub account: Option<AccountConfig>,

    /// Commit signing settings
    pub signing: Option<SigningConfig>,

    /// Response shaping for the object API
    pub api: Option<ApiConfig>,

    /// Diagnostic logging
    pub log: Option<LogConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(signing) = &self.signing {
            signing.validate()?;
        }
        if let Some(api) = &self.api {
            api.validate()?;
        }
        if let Some(log) = &self.log {
            log.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// trust_model = "committer"
/// api_url = "https://forge.example/api/v1/repos/owner/repo"
/// archived = false
/// mirror = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Trust model for commit signatures
    pub trust_model: Option<String>,

    /// Base URL used to build object links in responses
    pub api_url: Option<String>,

    /// Archived repositories refuse writes
    pub archived: Option<bool>,

    /// Mirrors refuse writes
    pub mirror: Option<bool>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.trust_model {
            model
                .parse::<TrustModel>()
                .map_err(ConfigError::InvalidValue)?;
        }

        if let Some(url) = &self.api_url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "api_url cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// The acting account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AccountConfig {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub gpg_key_ids: Option<Vec<String>>,
    pub two_factor: Option<bool>,
}

/// Commit signing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SigningConfig {
    /// `none`, `default` (Git's `user.signingkey`), or a key id
    pub key: Option<String>,

    /// Signer name (default: Git's `user.name`)
    pub name: Option<String>,

    /// Signer email (default: Git's `user.email`)
    pub email: Option<String>,

    /// Rules that must all pass before signing
    pub crud_actions: Option<Vec<String>>,

    /// Model used by repositories whose trust model is `default`
    pub default_trust_model: Option<String>,

    /// Program used for signing and verification (default: `gpg`)
    pub program: Option<String>,
}

impl SigningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rules) = &self.crud_actions {
            for rule in rules {
                rule.parse::<SigningRule>()
                    .map_err(ConfigError::InvalidValue)?;
            }
        }

        if let Some(model) = &self.default_trust_model {
            model
                .parse::<TrustModel>()
                .map_err(ConfigError::InvalidValue)?;
        }

        if let Some(program) = &self.program {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "signing program cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Object API response configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Page size for tree listings, also the largest page a caller may request
    pub default_git_trees_per_page: Option<usize>,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_git_trees_per_page == Some(0) {
            return Err(ConfigError::InvalidValue(
                "default_git_trees_per_page must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default level when `TREESMITH_LOG` is unset
    pub level: Option<String>,
}

impl LogConfig {
    pub const VALID_LEVELS: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "error", "off"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if !Self::VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log level '{}', must be one of: {}",
                    level,
                    Self::VALID_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
