//! End-to-end tests of the `tsm` binary.
//!
//! Each test runs against its own repository with an isolated home
//! directory and config file, so neither the user's Git identity nor their
//! treesmith config leaks in.

use assert_cmd::Command;
use chrono::{FixedOffset, TimeZone};
use predicates::prelude::*;
use tempfile::TempDir;

use treesmith::core::types::Oid;
use treesmith::git::{CommitDraft, Git, PersonStamp};

const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
const FILE1_ONLY: &str = "72e65790d93b0e20a0488b56de1833e6210991e2";

const CONFIG: &str = r#"
[account]
username = "user2"
full_name = "User Two"
email = "user2@example.com"

[signing]
key = "none"
"#;

struct TestEnv {
    home: TempDir,
    repo: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let home = TempDir::new().expect("failed to create home dir");
        let repo = TempDir::new().expect("failed to create repo dir");
        std::fs::write(home.path().join("config.toml"), CONFIG).unwrap();
        Git::init(repo.path(), false).expect("failed to init repo");
        Self { home, repo }
    }

    fn git(&self) -> Git {
        Git::open(self.repo.path()).unwrap()
    }

    fn tsm(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("tsm").expect("binary not built");
        cmd.current_dir(self.repo.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env("TREESMITH_CONFIG", self.home.path().join("config.toml"))
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env_remove("TREESMITH_LOG")
            .args(args);
        cmd
    }

    fn root_commit(&self) -> Oid {
        let git = self.git();
        let stamp = PersonStamp {
            name: "Root".into(),
            email: "root@example.com".into(),
            when: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .unwrap(),
        };
        git.write_commit(&CommitDraft {
            tree: git.write_tree(&[]).unwrap(),
            parents: vec![],
            author: stamp.clone(),
            committer: stamp,
            message: "root\n".into(),
        })
        .unwrap()
    }
}

fn request(entries: &str) -> String {
    format!(r#"{{"tree":[{entries}]}}"#)
}

const FILE1: &str = r#"{"name":"file1","mode":"100644","content":"dGVzdCBjb250ZW50cwo="}"#;

mod write_tree {
    use super::*;

    #[test]
    fn reads_stdin_and_prints_json() {
        let env = TestEnv::new();
        env.tsm(&["write-tree"])
            .write_stdin(request(FILE1))
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(r#""sha": "{FILE1_ONLY}""#)));
    }

    #[test]
    fn quiet_prints_only_sha() {
        let env = TestEnv::new();
        env.tsm(&["-q", "write-tree"])
            .write_stdin(request(""))
            .assert()
            .success()
            .stdout(format!("{EMPTY_TREE}\n"));
    }

    #[test]
    fn input_file_and_base_override() {
        let env = TestEnv::new();
        env.tsm(&["-q", "write-tree"])
            .write_stdin(request(FILE1))
            .assert()
            .success();

        let edits = env.home.path().join("edits.json");
        std::fs::write(&edits, request(r#"{"name":"file1","mode":"100644"}"#)).unwrap();
        env.tsm(&["-q", "write-tree", "--base-tree", FILE1_ONLY, "--input"])
            .arg(&edits)
            .assert()
            .success()
            .stdout(format!("{EMPTY_TREE}\n"));
    }

    #[test]
    fn reserved_name_is_a_caller_error() {
        let env = TestEnv::new();
        env.tsm(&["write-tree"])
            .write_stdin(request(r#"{"name":".git","mode":"100644","content":"eAo="}"#))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn malformed_json_is_a_caller_error() {
        let env = TestEnv::new();
        env.tsm(&["write-tree"])
            .write_stdin("{not json")
            .assert()
            .code(2);
    }

    #[test]
    fn archived_repository_is_refused() {
        let env = TestEnv::new();
        let tool_dir = env.repo.path().join(".git/treesmith");
        std::fs::create_dir_all(&tool_dir).unwrap();
        std::fs::write(tool_dir.join("config.toml"), "archived = true\n").unwrap();

        env.tsm(&["write-tree"])
            .write_stdin(request(""))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("read-only"));
    }
}

mod commit_tree {
    use super::*;

    #[test]
    fn branch_name_parent_is_a_caller_error() {
        let env = TestEnv::new();
        env.tsm(&["commit-tree", EMPTY_TREE, "-p", "main", "-m", "msg"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid parent 'main'"));
    }

    #[test]
    fn unborn_head_without_parents() {
        let env = TestEnv::new();
        env.git().write_tree(&[]).unwrap();
        env.tsm(&["commit-tree", EMPTY_TREE, "-m", "msg"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("HEAD has no commits"));
    }

    #[test]
    fn commits_and_updates_ref() {
        let env = TestEnv::new();
        let root = env.root_commit();

        let output = env
            .tsm(&[
                "-q",
                "commit-tree",
                EMPTY_TREE,
                "-p",
                root.as_str(),
                "-m",
                "import",
                "--author-name",
                "Bot",
                "--author-email",
                "bot@example.com",
                "--signoff",
                "--update-ref",
                "refs/heads/import",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let sha = String::from_utf8(output).unwrap();
        let oid = Oid::new(sha.trim()).unwrap();

        let git = env.git();
        assert_eq!(git.try_resolve_ref("refs/heads/import").unwrap(), Some(oid.clone()));

        let info = git.commit_info(&oid).unwrap();
        assert_eq!(info.parents, vec![root]);
        assert_eq!(info.author.email, "bot@example.com");
        assert_eq!(info.committer.name, "Bot");
        assert_eq!(info.committer.email, "bot@example.com");
        assert_eq!(
            info.message,
            "import\n\nSigned-off-by: Bot <bot@example.com>\n"
        );
    }

    #[test]
    fn json_response_reports_unsigned() {
        let env = TestEnv::new();
        let root = env.root_commit();

        env.tsm(&["commit-tree", EMPTY_TREE, "-p", root.as_str(), "-m", "msg"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""reason": "not_signed_commit""#));
    }

    #[test]
    fn short_ref_name_rejected() {
        let env = TestEnv::new();
        let root = env.root_commit();

        env.tsm(&[
            "commit-tree",
            EMPTY_TREE,
            "-p",
            root.as_str(),
            "-m",
            "msg",
            "--update-ref",
            "main",
        ])
        .assert()
        .failure();
    }
}

mod ls_tree {
    use super::*;

    /// Write `file1` plus `dir/file1` and return the tree id.
    fn tree_sha(env: &TestEnv) -> String {
        let entries = format!(
            r#"{FILE1},{{"name":"dir","mode":"040000","sha":"{FILE1_ONLY}"}}"#
        );
        let out = env
            .tsm(&["-q", "write-tree"])
            .write_stdin(request(&entries))
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).unwrap().trim().to_string()
    }

    #[test]
    fn quiet_lists_paths() {
        let env = TestEnv::new();
        env.tsm(&["write-tree"]).write_stdin(request(FILE1)).assert().success();
        let sha = tree_sha(&env);

        env.tsm(&["-q", "ls-tree", "-r", &sha])
            .assert()
            .success()
            .stdout("dir\ndir/file1\nfile1\n");
    }

    #[test]
    fn json_listing_pages() {
        let env = TestEnv::new();
        env.tsm(&["write-tree"]).write_stdin(request(FILE1)).assert().success();
        let sha = tree_sha(&env);

        env.tsm(&["ls-tree", &sha, "--per-page", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""truncated": true"#))
            .stdout(predicate::str::contains(r#""total_count": 2"#));
    }

    #[test]
    fn unknown_sha() {
        let env = TestEnv::new();
        env.tsm(&["ls-tree", "0123456789012345678901234567890123456789"])
            .assert()
            .code(2);
    }
}

#[test]
fn outside_a_repository_fails() {
    let env = TestEnv::new();
    let elsewhere = TempDir::new().unwrap();
    env.tsm(&["--cwd"])
        .arg(elsewhere.path())
        .args(["write-tree"])
        .write_stdin(request(""))
        .assert()
        .code(1);
}
