//! treesmith - Git tree and commit plumbing for forges
//!
//! treesmith builds Git tree and commit objects inside an existing
//! repository the way a forge's Git-objects API does: a base tree is merged
//! with sparse edits and written as a new tree, and commits are built with
//! identities resolved from the request, signed according to repository
//! policy, and verified after writing.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (`tsm`)
//! - [`plumbing`] - Write-tree, get-tree and create-commit operations
//! - [`signing`] - Trust models, signing policy, signer and verifier seams
//! - [`core`] - Strong types, identities, configuration, locking
//! - [`git`] - Single interface to the object store
//! - [`ui`] - User-facing output
//!
//! # Guarantees
//!
//! 1. A rejected request never writes objects or moves refs
//! 2. A commit that must be signed is never written unsigned
//! 3. Ref updates are compare-and-swap under the repository lock

pub mod cli;
pub mod core;
pub mod git;
pub mod plumbing;
pub mod signing;
pub mod ui;
