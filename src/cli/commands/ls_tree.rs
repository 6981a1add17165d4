//! ls-tree command - List a tree's entries

use anyhow::Result;

use super::Context;
use crate::core::config::Config;
use crate::git::Git;
use crate::plumbing::{self, ListTreeOptions};
use crate::ui::output::{self, Verbosity};

/// List one page of a tree.
///
/// With `--quiet` only entry paths are printed, one per line.
pub fn ls_tree(
    ctx: &Context,
    git: &Git,
    config: &Config,
    sha: &str,
    recursive: bool,
    page: i64,
    per_page: i64,
) -> Result<()> {
    let options = ListTreeOptions {
        recursive,
        page,
        per_page,
    };
    let response = plumbing::get_tree(git, config, sha, &options)?;

    if ctx.verbosity() == Verbosity::Quiet {
        let paths: Vec<&str> = response.entries.iter().map(|e| e.path.as_str()).collect();
        println!("{}", output::format_list(&paths, ""));
        return Ok(());
    }

    output::json(&response)
}
