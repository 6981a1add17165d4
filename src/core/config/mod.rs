//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! treesmith has two configuration scopes:
//! - **Global**: the acting account, signing, API shaping, logging
//! - **Repo**: trust model, object URLs, read-only flags
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TREESMITH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/treesmith/config.toml`
//! 3. `~/.treesmith/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use treesmith::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Trust model: {}", config.trust_model());
//! println!("Page size: {}", config.default_git_trees_per_page());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::Account;
use crate::core::paths::RepoPaths;
use crate::signing::{SigningKey, SigningRule, TrustModel};

/// Default page size for tree listings.
pub const DEFAULT_GIT_TREES_PER_PAGE: usize = 1000;

/// Default signing program.
pub const DEFAULT_GPG_PROGRAM: &str = "gpg";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply defaults and precedence. Repo config overrides global
/// config where both scopes have a say.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Build a config from already-parsed scopes.
    pub fn new(global: GlobalConfig, repo: Option<RepoConfig>) -> Self {
        Self {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads the repository config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(paths: Option<&RepoPaths>) -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path) = match paths {
            Some(paths) => {
                let path = paths.repo_config_path();
                if path.exists() {
                    (Some(Self::read_config::<RepoConfig>(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("TREESMITH_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("treesmith/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".treesmith/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The acting account, if one is configured with a username.
    pub fn account(&self) -> Option<Account> {
        let account = self.global.account.as_ref()?;
        let username = account.username.clone().filter(|u| !u.is_empty())?;
        Some(Account {
            username,
            full_name: account.full_name.clone().unwrap_or_default(),
            email: account.email.clone().unwrap_or_default(),
            gpg_key_ids: account.gpg_key_ids.clone().unwrap_or_default(),
            two_factor: account.two_factor.unwrap_or(false),
        })
    }

    fn signing(&self) -> Option<&schema::SigningConfig> {
        self.global.signing.as_ref()
    }

    /// Signing key selection.
    ///
    /// Defaults to `default` (Git's `user.signingkey`).
    pub fn signing_key(&self) -> SigningKey {
        self.signing()
            .and_then(|s| s.key.as_deref())
            .map(SigningKey::parse)
            .unwrap_or(SigningKey::Default)
    }

    /// Rules that must pass before a commit is signed.
    ///
    /// Defaults to `pubkey`, `twofa`, `parentsigned`. Unknown names are
    /// rejected at load time.
    pub fn signing_rules(&self) -> Vec<SigningRule> {
        match self.signing().and_then(|s| s.crud_actions.as_ref()) {
            Some(rules) => rules.iter().filter_map(|r| r.parse().ok()).collect(),
            None => SigningRule::DEFAULTS.to_vec(),
        }
    }

    pub fn signing_name(&self) -> Option<&str> {
        self.signing().and_then(|s| s.name.as_deref())
    }

    pub fn signing_email(&self) -> Option<&str> {
        self.signing().and_then(|s| s.email.as_deref())
    }

    /// Program used for signing and verification.
    ///
    /// Defaults to `gpg`.
    pub fn gpg_program(&self) -> &str {
        self.signing()
            .and_then(|s| s.program.as_deref())
            .unwrap_or(DEFAULT_GPG_PROGRAM)
    }

    /// The model used by repositories whose trust model is `default`.
    ///
    /// Defaults to `collaborator`.
    pub fn default_trust_model(&self) -> TrustModel {
        self.signing()
            .and_then(|s| s.default_trust_model.as_deref())
            .and_then(|m| m.parse().ok())
            .unwrap_or(TrustModel::Collaborator)
    }

    /// The repository trust model with `default` resolved.
    pub fn trust_model(&self) -> TrustModel {
        self.repo
            .as_ref()
            .and_then(|r| r.trust_model.as_deref())
            .and_then(|m| m.parse::<TrustModel>().ok())
            .unwrap_or_default()
            .resolve(self.default_trust_model())
    }

    /// Page size for tree listings.
    ///
    /// Defaults to 1000.
    pub fn default_git_trees_per_page(&self) -> usize {
        self.global
            .api
            .as_ref()
            .and_then(|a| a.default_git_trees_per_page)
            .unwrap_or(DEFAULT_GIT_TREES_PER_PAGE)
    }

    /// Base URL for object links, without a trailing slash.
    pub fn api_url(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.api_url.as_deref())
            .map(|url| url.trim_end_matches('/'))
    }

    /// Whether the repository refuses writes (archived or mirror).
    pub fn is_read_only(&self) -> bool {
        self.repo.as_ref().is_some_and(|r| {
            r.archived.unwrap_or(false) || r.mirror.unwrap_or(false)
        })
    }

    /// Default log level when `TREESMITH_LOG` is unset.
    pub fn log_level(&self) -> Option<&str> {
        self.global.log.as_ref().and_then(|l| l.level.as_deref())
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::schema::{AccountConfig, ApiConfig, SigningConfig};
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> RepoPaths {
        RepoPaths::new(temp.path().to_path_buf(), temp.path().to_path_buf())
    }

    mod defaults {
        use super::*;

        #[test]
        fn accessors_fall_back() {
            let config = Config::default();

            assert_eq!(config.signing_key(), SigningKey::Default);
            assert_eq!(config.signing_rules(), SigningRule::DEFAULTS.to_vec());
            assert_eq!(config.gpg_program(), "gpg");
            assert_eq!(config.trust_model(), TrustModel::Collaborator);
            assert_eq!(config.default_git_trees_per_page(), 1000);
            assert!(config.api_url().is_none());
            assert!(!config.is_read_only());
            assert!(config.account().is_none());
        }
    }

    mod precedence {
        use super::*;

        #[test]
        fn repo_trust_model_overrides_default() {
            let config = Config::new(
                GlobalConfig::default(),
                Some(RepoConfig {
                    trust_model: Some("committer".into()),
                    ..Default::default()
                }),
            );
            assert_eq!(config.trust_model(), TrustModel::Committer);
        }

        #[test]
        fn default_trust_model_uses_global_fallback() {
            let config = Config::new(
                GlobalConfig {
                    signing: Some(SigningConfig {
                        default_trust_model: Some("collaboratorcommitter".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Some(RepoConfig {
                    trust_model: Some("default".into()),
                    ..Default::default()
                }),
            );
            assert_eq!(config.trust_model(), TrustModel::CollaboratorCommitter);
        }

        #[test]
        fn mirror_is_read_only() {
            let config = Config::new(
                GlobalConfig::default(),
                Some(RepoConfig {
                    mirror: Some(true),
                    ..Default::default()
                }),
            );
            assert!(config.is_read_only());
        }

        #[test]
        fn api_url_trailing_slash_trimmed() {
            let config = Config::new(
                GlobalConfig::default(),
                Some(RepoConfig {
                    api_url: Some("https://forge.example/api/v1/repos/o/r/".into()),
                    ..Default::default()
                }),
            );
            assert_eq!(
                config.api_url(),
                Some("https://forge.example/api/v1/repos/o/r")
            );
        }
    }

    mod accounts {
        use super::*;

        #[test]
        fn account_requires_username() {
            let config = Config::new(
                GlobalConfig {
                    account: Some(AccountConfig {
                        email: Some("x@example.com".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                None,
            );
            assert!(config.account().is_none());
        }

        #[test]
        fn account_fields_carried() {
            let config = Config::new(
                GlobalConfig {
                    account: Some(AccountConfig {
                        username: Some("user2".into()),
                        email: Some("user2@example.com".into()),
                        gpg_key_ids: Some(vec!["KEY".into()]),
                        two_factor: Some(true),
                        ..Default::default()
                    }),
                    api: Some(ApiConfig {
                        default_git_trees_per_page: Some(50),
                    }),
                    ..Default::default()
                },
                None,
            );

            let account = config.account().unwrap();
            assert_eq!(account.username, "user2");
            assert_eq!(account.git_name(), "user2");
            assert!(account.two_factor);
            assert_eq!(config.default_git_trees_per_page(), 50);
        }
    }

    mod files {
        use super::*;

        #[test]
        fn load_repo_config() {
            let temp = TempDir::new().unwrap();
            let paths = paths(&temp);
            fs::create_dir_all(paths.repo_tool_dir()).unwrap();
            fs::write(
                paths.repo_config_path(),
                "trust_model = \"committer\"\narchived = true\n",
            )
            .unwrap();

            let config = Config::load(Some(&paths)).unwrap();
            assert_eq!(config.trust_model(), TrustModel::Committer);
            assert!(config.is_read_only());
            assert_eq!(
                config.repo_config_loaded_from(),
                Some(paths.repo_config_path().as_path())
            );
        }

        #[test]
        fn invalid_repo_config_rejected() {
            let temp = TempDir::new().unwrap();
            let paths = paths(&temp);
            fs::create_dir_all(paths.repo_tool_dir()).unwrap();
            fs::write(paths.repo_config_path(), "trust_model = \"everyone\"").unwrap();

            assert!(matches!(
                Config::load(Some(&paths)),
                Err(ConfigError::InvalidValue(_))
            ));
        }

        #[test]
        fn unknown_fields_rejected() {
            let temp = TempDir::new().unwrap();
            let paths = paths(&temp);
            fs::create_dir_all(paths.repo_tool_dir()).unwrap();
            fs::write(paths.repo_config_path(), "trunk = \"main\"").unwrap();

            assert!(matches!(
                Config::load(Some(&paths)),
                Err(ConfigError::ParseError { .. })
            ));
        }
    }
}
