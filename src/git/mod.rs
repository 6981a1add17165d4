//! git
//!
//! Single interface to the Git object store.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All object and ref reads and
//! writes flow through this interface. No other module should import `git2`.
//! The repository itself is the object store; nothing shells out to the git
//! CLI.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening (bare or non-bare)
//! - Object operations (write blob, write tree, serialize and write commits)
//! - Object queries (type, tree entries, tree walks, commit info, signatures)
//! - Ref operations (HEAD, CAS update)
//!
//! # Invariants
//!
//! - Object writes are content addressed, so repeating them is harmless
//! - All ref updates use CAS (compare-and-swap) semantics
//! - All operations return strong types (Oid, EntryName, EntryMode)

mod interface;

pub use interface::{
    CommitDraft, CommitInfo, CommitSignature, Git, GitError, PersonStamp, RepoInfo, TreeEntry,
    TreeWalkEntry,
};
