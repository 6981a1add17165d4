//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout as pretty JSON. With `--quiet` only the object id
//! is printed, which keeps shell pipelines simple. Diagnostics go to
//! stderr.

use std::fmt::Display;

use anyhow::{Context as _, Result};
use serde::Serialize;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - object ids only
    Quiet,
    /// Normal mode - full JSON responses
    Normal,
    /// Debug mode - JSON plus diagnostics on stderr
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a value as pretty JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{}", rendered);
    Ok(())
}

/// Print a response, or only its id in quiet mode.
pub fn result<T: Serialize>(value: &T, id: &str, verbosity: Verbosity) -> Result<()> {
    if verbosity == Verbosity::Quiet {
        println!("{}", id);
        Ok(())
    } else {
        json(value)
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn list_formatting() {
        assert_eq!(format_list(&["a", "b"], "- "), "- a\n- b");
        assert_eq!(format_list::<&str>(&[], "- "), "");
    }
}
