// tests/common/mod.rs

//! Shared fixtures for integration tests: a workspace of real sibling git
//! repositories created under a temp directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git with a throwaway identity, panicking on failure.
pub fn git(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(root)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        root.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn rev_parse(root: &Path, rev: &str) -> String {
    git(root, &["rev-parse", rev]).trim().to_string()
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub fn read_file(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}

pub fn commit_all(root: &Path, message: &str) {
    git(root, &["add", "-A"]);
    git(root, &["commit", "-q", "-m", message]);
}

/// A workspace directory holding sibling repositories, plus a separate data
/// root for sessions.
pub struct Fixture {
    pub workspace: TempDir,
    pub data_root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            workspace: tempfile::tempdir().unwrap(),
            data_root: tempfile::tempdir().unwrap(),
        }
    }

    /// Initialize a repository with one seed file and an initial commit.
    pub fn init_repo(&self, name: &str) -> PathBuf {
        let root = self.workspace.path().join(name);
        std::fs::create_dir_all(&root).unwrap();
        git(&root, &["init", "-q", "-b", "main"]);
        git(&root, &["config", "user.name", "test"]);
        git(&root, &["config", "user.email", "test@example.com"]);
        write_file(&root, "README.md", "seed\n");
        commit_all(&root, "initial commit");
        root
    }

    /// Clone an existing repository into a sibling working copy, so targets
    /// share history with the source the way structurally similar sibling
    /// projects do.
    pub fn clone_repo(&self, from: &Path, name: &str) -> PathBuf {
        let root = self.workspace.path().join(name);
        let output = Command::new("git")
            .args(["clone", "-q", from.to_str().unwrap(), root.to_str().unwrap()])
            .output()
            .expect("failed to spawn git clone");
        assert!(
            output.status.success(),
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        git(&root, &["config", "user.name", "test"]);
        git(&root, &["config", "user.email", "test@example.com"]);
        root
    }
}
