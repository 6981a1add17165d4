//! core::identity
//!
//! Author and committer identity resolution.
//!
//! A commit has two identity slots. Each slot either aliases the acting
//! account or holds a transient identity taken from the request, following
//! a fixed precedence (see [`resolve_signatories`]).

use serde::{Deserialize, Serialize};

/// The account performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// Login name, used as the display name when `full_name` is empty
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// Ids of the GPG keys registered to this account
    pub gpg_key_ids: Vec<String>,
    /// Whether two-factor authentication is enabled
    pub two_factor: bool,
}

impl Account {
    /// The name written into commits made as this account.
    pub fn git_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }

    /// The identity written into commits made as this account.
    pub fn identity(&self) -> Identity {
        Identity {
            name: self.git_name().to_string(),
            email: self.email.clone(),
        }
    }

    fn owns_email(&self, email: &str) -> bool {
        !self.email.is_empty() && self.email.eq_ignore_ascii_case(email)
    }
}

/// A name and email pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Build an identity that is not tied to any account.
    ///
    /// Commit headers cannot carry an empty name, so an empty name falls
    /// back to the local part of the email.
    pub fn transient(name: &str, email: &str) -> Self {
        let name = if name.trim().is_empty() {
            email.split('@').next().unwrap_or(email)
        } else {
            name
        };
        Self::new(name, email)
    }

    /// Whether two identities differ by name or email.
    pub fn differs_from(&self, other: &Identity) -> bool {
        self.name != other.name || self.email != other.email
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Request-supplied identity information for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityHint {
    pub name: String,
    pub email: String,
}

impl IdentityHint {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A resolved author or committer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signatory {
    /// The slot is the acting account (possibly with an overridden name).
    Actor(Account),
    /// The slot is an identity with no account behind it.
    External(Identity),
}

impl Signatory {
    pub fn identity(&self) -> Identity {
        match self {
            Signatory::Actor(account) => account.identity(),
            Signatory::External(identity) => identity.clone(),
        }
    }

    /// The account behind this slot, if it is the actor.
    pub fn account(&self) -> Option<&Account> {
        match self {
            Signatory::Actor(account) => Some(account),
            Signatory::External(_) => None,
        }
    }
}

fn resolve_slot(hint: Option<&IdentityHint>, actor: &Account) -> Option<Signatory> {
    let hint = hint?;

    if actor.owns_email(&hint.email) {
        let mut account = actor.clone();
        if !hint.name.is_empty() {
            account.full_name = hint.name.clone();
        }
        return Some(Signatory::Actor(account));
    }

    if !hint.email.is_empty() {
        return Some(Signatory::External(Identity::transient(
            &hint.name,
            &hint.email,
        )));
    }

    None
}

/// Resolve the author and committer slots of a commit.
///
/// Precedence, per slot:
/// 1. A hint whose email matches the actor's (case-insensitively) is the
///    actor, with a non-empty hint name replacing the actor's full name.
/// 2. Otherwise a hint with a non-empty email is a transient identity.
///
/// An unresolved author takes the committer's resolution, or the actor
/// when that is unresolved too. An unresolved committer mirrors the author.
pub fn resolve_signatories(
    author: Option<&IdentityHint>,
    committer: Option<&IdentityHint>,
    actor: &Account,
) -> (Signatory, Signatory) {
    let committer = resolve_slot(committer, actor);
    let author = resolve_slot(author, actor)
        .or_else(|| committer.clone())
        .unwrap_or_else(|| Signatory::Actor(actor.clone()));
    let committer = committer.unwrap_or_else(|| author.clone());

    (author, committer)
}
