//! write-tree command - Write a tree from a JSON edit request

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::config::Config;
use crate::git::Git;
use crate::plumbing::{self, WriteTreeRequest};
use crate::ui::output;

/// Read a write-tree request and print the new tree.
///
/// # Arguments
///
/// * `base_tree` - Overrides `base_tree` from the request
/// * `input` - Request file; stdin when `None`
pub fn write_tree(
    ctx: &Context,
    git: &Git,
    config: &Config,
    base_tree: Option<String>,
    input: Option<&Path>,
) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read request from stdin")?;
            raw
        }
    };

    let mut request: WriteTreeRequest =
        serde_json::from_str(&raw).context("request is not a valid write-tree JSON document")?;
    if base_tree.is_some() {
        request.base_tree = base_tree;
    }

    let response = plumbing::write_tree(git, config, &request)?;

    let verbosity = ctx.verbosity();
    output::debug(format!("{} entries in request", request.tree.len()), verbosity);
    output::result(&response, &response.sha, verbosity)
}
