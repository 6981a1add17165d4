//! Architecture lint tests.
//!
//! These tests enforce module boundaries by scanning source files.
//!
//! # Rules
//!
//! 1. Only `src/git/` may talk to `git2`. Everything else goes through
//!    [`treesmith::git::Git`].
//! 2. Plumbing operations never print. Output belongs to `src/ui/` and the
//!    command handlers.
//! 3. Command handlers never construct trees or commits by hand; they call
//!    into `plumbing`.

use std::fs;
use std::path::{Path, PathBuf};

/// Collect every `.rs` file under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap_or_else(|_| panic!("cannot read {}", dir.display()))
        {
            let path = entry.expect("failed to read entry").path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "rs") {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

/// Source text with `#[cfg(test)]` modules removed.
///
/// Test modules sit at the end of each file in this crate.
fn non_test_source(path: &Path) -> String {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(idx) => content[..idx].to_string(),
        None => content,
    }
}

fn display(path: &Path) -> String {
    path.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(path)
        .display()
        .to_string()
}

fn src(sub: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(sub)
}

#[test]
fn git2_confined_to_git_module() {
    let git_dir = src("git");
    let mut violations = Vec::new();

    for path in rust_files(&src("")) {
        if path.starts_with(&git_dir) {
            continue;
        }

        let content = fs::read_to_string(&path).expect("failed to read source");
        if content.contains("git2::") || content.contains("use git2") {
            violations.push(format!("{}: references git2 directly", display(&path)));
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn plumbing_does_not_print() {
    let mut violations = Vec::new();

    for path in rust_files(&src("plumbing")) {
        let content = non_test_source(&path);
        for needle in ["println!", "eprintln!", "print!(", "eprint!("] {
            if content.contains(needle) {
                violations.push(format!("{}: uses {}", display(&path), needle));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn commands_do_not_write_objects_directly() {
    let mut violations = Vec::new();

    for path in rust_files(&src("cli/commands")) {
        let content = non_test_source(&path);
        for needle in [
            ".write_tree(&",
            ".write_commit(",
            ".write_signed_commit(",
            ".update_ref_cas(",
        ] {
            if content.contains(needle) {
                violations.push(format!("{}: calls {}", display(&path), needle.trim_matches('(')));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn lint_sees_source_tree() {
    let files = rust_files(&src(""));
    assert!(files.iter().any(|p| p.ends_with("git/interface.rs")));
    assert!(files.iter().any(|p| p.ends_with("plumbing/tree.rs")));
}
