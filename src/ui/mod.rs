//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All printing goes through this module so that quiet and debug modes are
//! honored consistently. Diagnostic logging is separate and goes through
//! `tracing`.

pub mod output;
