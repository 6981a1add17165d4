//! core::ops
//!
//! Repository-level operations that need mutual exclusion.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive repository lock

pub mod lock;

pub use lock::{LockError, RepoLock};
