//! plumbing::listing
//!
//! The get-tree operation: list a tree's entries, one page at a time.

use serde::{Deserialize, Serialize};

use super::object_url;
use super::tree::{store_error, TreeError};
use crate::core::config::Config;
use crate::core::types::ObjectKind;
use crate::git::{Git, GitError};

/// Listing parameters. Non-positive values select the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTreeOptions {
    /// Include entries of subtrees, with slash-separated paths
    pub recursive: bool,
    pub page: i64,
    pub per_page: i64,
}

/// One listed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitEntry {
    pub path: String,
    /// Six-digit octal mode
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Blob size in bytes, 0 for trees and submodules
    pub size: u64,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One page of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTreeResponse {
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "tree")]
    pub entries: Vec<GitEntry>,
    /// More entries exist than fit on one page
    pub truncated: bool,
    pub page: usize,
    pub total_count: usize,
}

/// Clamp the requested page and page size.
///
/// A page size outside `1..=max` becomes `max`, and a page below 1 becomes 1.
fn page_bounds(options: &ListTreeOptions, max: usize) -> (usize, usize) {
    let per_page = usize::try_from(options.per_page)
        .ok()
        .filter(|n| (1..=max).contains(n))
        .unwrap_or(max);
    let page = usize::try_from(options.page)
        .ok()
        .filter(|n| *n >= 1)
        .unwrap_or(1);
    (page, per_page)
}

/// List the tree `sha` resolves to.
///
/// `sha` may name a tree, a commit, or a branch.
///
/// # Errors
///
/// - [`TreeError::ShaNotFound`] if `sha` does not resolve to a tree
#[tracing::instrument(skip(git, config), fields(repo = %git.git_dir().display()))]
pub fn get_tree(
    git: &Git,
    config: &Config,
    sha: &str,
    options: &ListTreeOptions,
) -> Result<GitTreeResponse, TreeError> {
    let tree = match git.resolve_treeish(sha) {
        Ok(tree) => tree,
        Err(GitError::ObjectNotFound { .. }) => {
            return Err(TreeError::ShaNotFound {
                sha: sha.to_string(),
            })
        }
        Err(e) => return Err(store_error(git, e)),
    };

    let walked = git
        .walk_tree(&tree, options.recursive)
        .map_err(|e| store_error(git, e))?;

    let (page, per_page) = page_bounds(options, config.default_git_trees_per_page());
    let total_count = walked.len();
    let start = per_page.saturating_mul(page - 1);

    let entries = walked
        .into_iter()
        .skip(start)
        .take(per_page)
        .map(|entry| GitEntry {
            url: object_url(config, entry.kind, &entry.oid),
            path: entry.path,
            mode: entry.mode.as_str().to_string(),
            kind: entry.kind.as_str().to_string(),
            size: entry.size,
            sha: entry.oid.to_string(),
        })
        .collect();

    Ok(GitTreeResponse {
        url: object_url(config, ObjectKind::Tree, &tree),
        sha: tree.to_string(),
        entries,
        truncated: total_count > per_page,
        page,
        total_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, RepoConfig};
    use crate::core::types::{EntryMode, EntryName, Oid};
    use crate::git::TreeEntry;
    use tempfile::TempDir;

    mod bounds {
        use super::*;

        fn bounds(page: i64, per_page: i64) -> (usize, usize) {
            page_bounds(
                &ListTreeOptions {
                    recursive: false,
                    page,
                    per_page,
                },
                1000,
            )
        }

        #[test]
        fn defaults() {
            assert_eq!(bounds(0, 0), (1, 1000));
            assert_eq!(bounds(-3, -1), (1, 1000));
        }

        #[test]
        fn oversized_page_uses_default() {
            assert_eq!(bounds(2, 5000), (2, 1000));
        }

        #[test]
        fn explicit_values_kept() {
            assert_eq!(bounds(3, 10), (3, 10));
        }
    }

    fn fixture() -> (TempDir, Git, Oid) {
        let dir = TempDir::new().unwrap();
        let git = Git::init(dir.path(), true).unwrap();
        let blob = git.write_blob(b"test contents\n").unwrap();

        let file = |name: &str| TreeEntry {
            name: EntryName::new(name).unwrap(),
            mode: EntryMode::Blob,
            oid: blob.clone(),
        };
        let sub = git.write_tree(&[file("inner")]).unwrap();
        let root = git
            .write_tree(&[
                file("a"),
                file("b"),
                TreeEntry {
                    name: EntryName::new("dir").unwrap(),
                    mode: EntryMode::Tree,
                    oid: sub,
                },
            ])
            .unwrap();

        (dir, git, root)
    }

    #[test]
    fn lists_direct_entries() {
        let (_dir, git, root) = fixture();
        let response = get_tree(&git, &Config::default(), root.as_str(), &Default::default()).unwrap();

        assert_eq!(response.sha, root.to_string());
        assert_eq!(response.total_count, 3);
        assert!(!response.truncated);
        let paths: Vec<_> = response.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a", "b", "dir"]);
        assert_eq!(response.entries[0].size, 14);
        assert_eq!(response.entries[2].kind, "tree");
        assert_eq!(response.entries[2].mode, "040000");
        assert_eq!(response.entries[2].size, 0);
    }

    #[test]
    fn recursive_paths() {
        let (_dir, git, root) = fixture();
        let options = ListTreeOptions {
            recursive: true,
            ..Default::default()
        };
        let response = get_tree(&git, &Config::default(), root.as_str(), &options).unwrap();

        let paths: Vec<_> = response.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a", "b", "dir", "dir/inner"]);
    }

    #[test]
    fn pagination_and_truncation() {
        let (_dir, git, root) = fixture();
        let options = ListTreeOptions {
            recursive: false,
            page: 2,
            per_page: 2,
        };
        let response = get_tree(&git, &Config::default(), root.as_str(), &options).unwrap();

        assert!(response.truncated);
        assert_eq!(response.page, 2);
        assert_eq!(response.total_count, 3);
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].path, "dir");
    }

    #[test]
    fn page_past_end_is_empty() {
        let (_dir, git, root) = fixture();
        let options = ListTreeOptions {
            recursive: false,
            page: 9,
            per_page: 2,
        };
        let response = get_tree(&git, &Config::default(), root.as_str(), &options).unwrap();
        assert!(response.entries.is_empty());
        assert_eq!(response.total_count, 3);
    }

    #[test]
    fn urls_from_api_url() {
        let (_dir, git, root) = fixture();
        let config = Config::new(
            GlobalConfig::default(),
            Some(RepoConfig {
                api_url: Some("https://forge.example/api/v1/repos/o/r".into()),
                ..Default::default()
            }),
        );
        let response = get_tree(&git, &config, root.as_str(), &Default::default()).unwrap();

        assert_eq!(
            response.url,
            Some(format!("https://forge.example/api/v1/repos/o/r/git/trees/{root}"))
        );
        assert!(response.entries[0]
            .url
            .as_deref()
            .unwrap()
            .contains("/git/blobs/"));
    }

    #[test]
    fn unknown_sha() {
        let (_dir, git, _root) = fixture();
        let err = get_tree(
            &git,
            &Config::default(),
            "3333333333333333333333333333333333333333",
            &Default::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::ShaNotFound { .. }));
    }
}
