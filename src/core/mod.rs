//! core
//!
//! Core domain types, configuration, and operations for treesmith.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, EntryName, EntryMode
//! - [`identity`] - Accounts, identities, and author/committer resolution
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Repository locking
//! - [`paths`] - Storage locations inside the git directory
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Schemas are strict and self-describing

pub mod config;
pub mod identity;
pub mod ops;
pub mod paths;
pub mod types;
