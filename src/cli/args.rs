//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Print only object ids

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// treesmith - build Git trees and signed commits from sparse edits
#[derive(Parser, Debug)]
#[command(name = "tsm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tsm was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print only the resulting object id
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Parse an RFC 3339 timestamp, keeping its offset.
fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value).map_err(|e| format!("invalid RFC 3339 date '{value}': {e}"))
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a tree from a base tree and a list of edits
    #[command(
        name = "write-tree",
        long_about = "Write a tree from a base tree and a list of edits.\n\n\
            Reads a JSON request from --input or stdin. Each entry names a file and \
            gives either the sha of an existing object, base64 content to store, or \
            neither to delete the name from the base tree.",
        after_help = "\
EXAMPLES:
    # Add one file to an empty tree
    echo '{\"tree\":[{\"name\":\"hello\",\"mode\":\"100644\",\"content\":\"aGkK\"}]}' | tsm write-tree

    # Replace a file in an existing tree
    tsm write-tree --base-tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904 --input edits.json"
    )]
    WriteTree {
        /// Tree (or commit) the edits apply to; overrides base_tree in the request
        #[arg(long, value_name = "SHA")]
        base_tree: Option<String>,

        /// Read the request from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Create a commit object for a tree
    #[command(
        name = "commit-tree",
        after_help = "\
EXAMPLES:
    # Commit on top of HEAD
    tsm commit-tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904 -m 'Empty tree'

    # Commit as someone else, signed off, and move the branch
    tsm commit-tree $TREE -p $PARENT -m 'Import' \\
        --author-name Bot --author-email bot@example.com \\
        --signoff --update-ref refs/heads/main"
    )]
    CommitTree {
        /// The tree to commit
        #[arg(value_name = "TREE")]
        tree: String,

        /// Parent commit id (repeatable; defaults to HEAD)
        #[arg(short = 'p', long = "parent", value_name = "SHA")]
        parents: Vec<String>,

        /// Commit message
        #[arg(short, long)]
        message: String,

        #[arg(long)]
        author_name: Option<String>,

        #[arg(long)]
        author_email: Option<String>,

        #[arg(long)]
        committer_name: Option<String>,

        #[arg(long)]
        committer_email: Option<String>,

        /// Author date (RFC 3339)
        #[arg(long, value_parser = parse_date)]
        author_date: Option<DateTime<FixedOffset>>,

        /// Committer date (RFC 3339)
        #[arg(long, value_parser = parse_date)]
        committer_date: Option<DateTime<FixedOffset>>,

        /// Add a Signed-off-by trailer for the committer
        #[arg(long)]
        signoff: bool,

        /// Move this ref to the new commit
        #[arg(long, value_name = "REF")]
        update_ref: Option<String>,
    },

    /// List the entries of a tree
    #[command(name = "ls-tree")]
    LsTree {
        /// Tree, commit, or branch to list
        #[arg(value_name = "SHA")]
        sha: String,

        /// Include entries of subtrees
        #[arg(short, long)]
        recursive: bool,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        /// Entries per page (0 for the configured default)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        per_page: i64,
    },
}
