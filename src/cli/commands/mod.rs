//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Reads and validates command-specific input
//! 2. Calls into [`crate::plumbing`] to perform the operation
//! 3. Prints the JSON response (or just the object id with `--quiet`)
//!
//! Domain errors are passed up unchanged inside `anyhow::Error` so that
//! [`crate::cli::exit_code`] can classify them.

mod commit_tree;
mod ls_tree;
mod write_tree;

pub use commit_tree::commit_tree;
pub use ls_tree::ls_tree;
pub use write_tree::write_tree;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::git::Git;
use crate::ui::output::Verbosity;

/// Execution context from global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub cwd: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// The directory to operate in.
    pub fn cwd(&self) -> PathBuf {
        self.cwd.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context, git: &Git, config: &Config) -> Result<()> {
    match command {
        Command::WriteTree { base_tree, input } => {
            write_tree::write_tree(ctx, git, config, base_tree, input.as_deref())
        }
        Command::CommitTree {
            tree,
            parents,
            message,
            author_name,
            author_email,
            committer_name,
            committer_email,
            author_date,
            committer_date,
            signoff,
            update_ref,
        } => commit_tree::commit_tree(
            ctx,
            git,
            config,
            commit_tree::CommitTreeArgs {
                tree,
                parents,
                message,
                author: commit_tree::hint(author_name, author_email),
                committer: commit_tree::hint(committer_name, committer_email),
                author_date,
                committer_date,
                signoff,
                update_ref,
            },
        ),
        Command::LsTree {
            sha,
            recursive,
            page,
            per_page,
        } => ls_tree::ls_tree(ctx, git, config, &sha, recursive, page, per_page),
    }
}
