//! commit-tree command - Create a commit object, optionally moving a ref

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, FixedOffset};

use super::Context;
use crate::core::config::Config;
use crate::core::identity::{Account, IdentityHint};
use crate::core::types::RefName;
use crate::git::Git;
use crate::plumbing::commit::CommitDates;
use crate::plumbing::{CommitBuilder, CreateCommitRequest};
use crate::signing::gpg::{GpgSigner, GpgVerifier};
use crate::signing::ConfiguredPolicy;
use crate::ui::output;

/// Parsed commit-tree arguments.
#[derive(Debug, Clone)]
pub struct CommitTreeArgs {
    pub tree: String,
    pub parents: Vec<String>,
    pub message: String,
    pub author: Option<IdentityHint>,
    pub committer: Option<IdentityHint>,
    pub author_date: Option<DateTime<FixedOffset>>,
    pub committer_date: Option<DateTime<FixedOffset>>,
    pub signoff: bool,
    pub update_ref: Option<String>,
}

/// Build an identity hint when either part was given.
pub fn hint(name: Option<String>, email: Option<String>) -> Option<IdentityHint> {
    if name.is_none() && email.is_none() {
        return None;
    }
    Some(IdentityHint::new(
        name.unwrap_or_default(),
        email.unwrap_or_default(),
    ))
}

/// The acting account: `[account]` from config, else Git's user identity.
fn actor(git: &Git, config: &Config) -> Result<Account> {
    if let Some(account) = config.account() {
        return Ok(account);
    }

    let name = git.config_string("user.name")?.unwrap_or_default();
    let email = git.config_string("user.email")?.unwrap_or_default();
    if name.is_empty() && email.is_empty() {
        bail!("no acting account: set [account] in the treesmith config or user.name/user.email in git");
    }

    Ok(Account {
        username: if name.is_empty() {
            email.split('@').next().unwrap_or_default().to_string()
        } else {
            name
        },
        email,
        ..Default::default()
    })
}

/// Create a commit and print it.
pub fn commit_tree(ctx: &Context, git: &Git, config: &Config, args: CommitTreeArgs) -> Result<()> {
    let actor = actor(git, config)?;

    let verifier = GpgVerifier::new(config.gpg_program());
    let signer = GpgSigner::new(config.gpg_program());
    let policy = ConfiguredPolicy::from_config(config, Box::new(verifier.clone()));
    let builder = CommitBuilder::new(git, config, &policy, &signer, &verifier);

    let request = CreateCommitRequest {
        tree: args.tree,
        parents: args.parents,
        message: args.message,
        author: args.author,
        committer: args.committer,
        dates: CommitDates {
            author: args.author_date,
            committer: args.committer_date,
        },
        signoff: args.signoff,
    };

    let response = match args.update_ref {
        Some(refname) => {
            let refname = RefName::new(refname.as_str())
                .with_context(|| format!("'{refname}' is not a full ref name"))?;
            builder.commit_and_advance(&actor, &request, &refname)?
        }
        None => builder.create(&actor, &request)?,
    };

    output::result(&response, &response.sha, ctx.verbosity())
}
