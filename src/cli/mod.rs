//! cli
//!
//! Command-line interface layer for treesmith.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Open the repository, load configuration, and set up logging
//! - Delegate to command handlers
//! - Map failures to exit codes
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: server-side failure (store, signer, filesystem)
//! - `2`: caller error (bad input, malformed JSON, missing objects, read-only
//!   repository)

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::paths::RepoPaths;
use crate::git::Git;
use crate::plumbing::{CommitError, ErrorKind, TreeError};
use commands::Context;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "TREESMITH_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    let git = Git::open(&ctx.cwd())
        .with_context(|| format!("cannot open repository at {}", ctx.cwd().display()))?;
    let config = Config::load(Some(&RepoPaths::from_repo_info(&git.info())))
        .context("failed to load configuration")?;

    init_tracing(ctx.debug, config.log_level());

    commands::dispatch(cli.command, &ctx, &git, &config)
}

/// Install the global tracing subscriber.
///
/// `TREESMITH_LOG` wins, then `--debug`, then `log.level` from config.
/// Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing(debug: bool, config_level: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = if debug {
            "debug"
        } else {
            config_level.unwrap_or("warn")
        };
        EnvFilter::new(level)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Exit code for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = err
        .downcast_ref::<TreeError>()
        .map(TreeError::kind)
        .or_else(|| err.downcast_ref::<CommitError>().map(CommitError::kind))
        .or_else(|| {
            err.downcast_ref::<serde_json::Error>()
                .map(|_| ErrorKind::Caller)
        });

    match kind {
        Some(ErrorKind::Caller | ErrorKind::Forbidden) => 2,
        Some(ErrorKind::Server) | None => 1,
    }
}
