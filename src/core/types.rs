//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Validated Git reference name
//! - [`EntryName`] - Validated single-component tree entry name
//! - [`EntryMode`] - One of the five tree entry modes Git understands
//! - [`ObjectKind`] - Type of an object in the store
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a branch name can never be passed where a
//! content hash is required.
//!
//! # Examples
//!
//! ```
//! use treesmith::core::types::{EntryMode, EntryName, Oid};
//!
//! let oid = Oid::new("891cd65628f1c7caa1bd2c382cc7e27c38e6d34d").unwrap();
//! let name = EntryName::new("file1").unwrap();
//! let mode = EntryMode::parse("100644").unwrap();
//!
//! assert!(Oid::new("main").is_err());
//! assert!(EntryName::new("sl/ash").is_err());
//! assert!(EntryMode::parse("0100644").is_err());
//! # let _ = (oid, name, mode);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid entry name: {0}")]
    InvalidEntryName(String),

    #[error("invalid entry mode: {0}")]
    InvalidEntryMode(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency. Abbreviated ids and
/// symbolic names (`HEAD`, branch names) are rejected.
///
/// # Example
///
/// ```
/// use treesmith::core::types::Oid;
///
/// // Create from hex string (normalized to lowercase)
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name.
///
/// Reference names must conform to Git's refname rules (see `git check-ref-format`)
/// and live under `refs/`.
///
/// # Example
///
/// ```
/// use treesmith::core::types::RefName;
///
/// let refname = RefName::new("refs/heads/main").unwrap();
/// assert_eq!(refname.strip_prefix("refs/heads/"), Some("main"));
/// assert!(RefName::new("main").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(
                "ref name must start with 'refs/'".into(),
            ));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the repository metadata directory, never allowed as a tree entry.
pub const RESERVED_ENTRY_NAME: &str = ".git";

/// A validated tree entry name.
///
/// A tree entry names exactly one path component:
/// - Cannot be empty, `.` or `..`
/// - Cannot contain `/` or NUL
/// - Cannot be `.git` (in any letter case)
///
/// # Example
///
/// ```
/// use treesmith::core::types::EntryName;
///
/// assert!(EntryName::new("README.md").is_ok());
/// assert!(EntryName::new("").is_err());
/// assert!(EntryName::new(".GIT").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryName(String);

impl EntryName {
    /// Create a new validated entry name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEntryName` if the name is not a single safe
    /// path component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidEntryName(
                "entry name cannot be empty".into(),
            ));
        }
        if name.contains('/') {
            return Err(TypeError::InvalidEntryName(format!(
                "entry name cannot contain '/': {name}"
            )));
        }
        if name.contains('\0') {
            return Err(TypeError::InvalidEntryName(
                "entry name cannot contain NUL".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidEntryName(format!(
                "entry name cannot be '{name}'"
            )));
        }
        if name.eq_ignore_ascii_case(RESERVED_ENTRY_NAME) {
            return Err(TypeError::InvalidEntryName(format!(
                "entry name '{name}' is reserved"
            )));
        }
        Ok(())
    }

    /// Get the entry name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntryName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EntryName> for String {
    fn from(name: EntryName) -> Self {
        name.0
    }
}

impl std::fmt::Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Ord is derived from the inner string, so map lookups by `&str` agree.
impl std::borrow::Borrow<str> for EntryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The kind of an object in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// The name Git uses for this object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File mode of a tree entry.
///
/// Only the five modes Git writes are representable. Parsing is exact, so
/// `"0100644"` or `"40000"` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Regular file (`100644`).
    Blob,
    /// Executable file (`100755`).
    Executable,
    /// Symbolic link (`120000`).
    Symlink,
    /// Submodule commit / gitlink (`160000`).
    Submodule,
    /// Subdirectory (`040000`).
    Tree,
}

impl EntryMode {
    /// Parse one of the five recognized mode strings.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEntryMode` for anything else.
    pub fn parse(mode: &str) -> Result<Self, TypeError> {
        match mode {
            "100644" => Ok(EntryMode::Blob),
            "100755" => Ok(EntryMode::Executable),
            "120000" => Ok(EntryMode::Symlink),
            "160000" => Ok(EntryMode::Submodule),
            "040000" => Ok(EntryMode::Tree),
            other => Err(TypeError::InvalidEntryMode(format!(
                "'{other}' is not one of 100644, 100755, 120000, 160000, 040000"
            ))),
        }
    }

    /// Map a raw filemode (as stored in a tree object) back to a mode.
    pub fn from_filemode(filemode: i32) -> Option<Self> {
        match filemode {
            0o100644 => Some(EntryMode::Blob),
            0o100755 => Some(EntryMode::Executable),
            0o120000 => Some(EntryMode::Symlink),
            0o160000 => Some(EntryMode::Submodule),
            0o040000 => Some(EntryMode::Tree),
            _ => None,
        }
    }

    /// The raw filemode written into tree objects.
    pub fn filemode(&self) -> i32 {
        match self {
            EntryMode::Blob => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Submodule => 0o160000,
            EntryMode::Tree => 0o040000,
        }
    }

    /// The six-digit octal form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Blob => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Submodule => "160000",
            EntryMode::Tree => "040000",
        }
    }

    /// The object type an entry with this mode must point at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            EntryMode::Blob | EntryMode::Executable | EntryMode::Symlink => ObjectKind::Blob,
            EntryMode::Submodule => ObjectKind::Commit,
            EntryMode::Tree => ObjectKind::Tree,
        }
    }

    /// Whether literal content may be supplied for this mode.
    pub fn accepts_content(&self) -> bool {
        self.object_kind() == ObjectKind::Blob
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
