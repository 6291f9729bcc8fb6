// src/git.rs

//! Thin capability layer over the `git` command-line tool.
//!
//! Everything the engine needs from version control goes through this
//! module: change enumeration, patch export, trial application, mutating
//! application with three-way tolerance, and the abort/unwind operations
//! used to leave a repository exactly as it was found.
//!
//! Functions that feed patch pipelines return raw bytes (`Vec<u8>`), never
//! lossy strings, so binary diffs survive the round trip.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

/// Which part of the working tree a diff covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    /// Changes not yet staged (`git diff`)
    Unstaged,
    /// Changes already staged (`git diff --cached`)
    Staged,
    /// Both, i.e. everything since the last commit (`git diff HEAD`)
    Both,
}

/// Outcome of a mutating or trial application step.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub success: bool,
    /// Combined stderr from git, kept for the log and the run report.
    pub detail: String,
}

/// Verify the git binary is reachable before any repository work starts.
pub fn ensure_available() -> Result<()> {
    which::which("git").map_err(|_| Error::GitNotFound)?;
    Ok(())
}

fn run(root: &Path, args: &[&str]) -> Result<Output> {
    debug!("git {} (in {})", args.join(" "), root.display());
    Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| Error::CommandFailed {
            tool: "git".to_string(),
            detail: format!("failed to spawn: {}", e),
        })
}

/// Run git and require a zero exit status, returning stdout as text.
fn run_checked(root: &Path, args: &[&str]) -> Result<String> {
    let output = run(root, args)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            tool: "git".to_string(),
            detail: format!(
                "git {}: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run git with a patch fed through stdin. The write happens on its own
/// thread so a large patch cannot deadlock against a filling output pipe.
fn run_with_stdin(root: &Path, args: &[&str], input: &[u8]) -> Result<Output> {
    debug!("git {} < {} bytes (in {})", args.join(" "), input.len(), root.display());
    let mut child = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::CommandFailed {
            tool: "git".to_string(),
            detail: format!("failed to spawn: {}", e),
        })?;

    let writer = child.stdin.take().map(|mut stdin| {
        let bytes = input.to_vec();
        std::thread::spawn(move || {
            // A closed pipe just means git stopped reading early.
            let _ = stdin.write_all(&bytes);
        })
    });

    let output = child.wait_with_output().map_err(Error::IoError)?;
    if let Some(handle) = writer {
        let _ = handle.join();
    }
    Ok(output)
}

/// Is this directory the top of (or inside) a git work tree?
pub fn is_work_tree(root: &Path) -> bool {
    run(root, &["rev-parse", "--is-inside-work-tree"])
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Current HEAD commit hash.
pub fn head_commit(root: &Path) -> Result<String> {
    Ok(run_checked(root, &["rev-parse", "HEAD"])?.trim().to_string())
}

/// Does `id` resolve to a commit in this repository?
pub fn commit_exists(root: &Path, id: &str) -> bool {
    let spec = format!("{}^{{commit}}", id);
    run(root, &["cat-file", "-e", &spec])
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn name_only_args(scope: DiffScope) -> Vec<&'static str> {
    match scope {
        DiffScope::Unstaged => vec!["diff", "--name-only"],
        DiffScope::Staged => vec!["diff", "--name-only", "--cached"],
        DiffScope::Both => vec!["diff", "--name-only", "HEAD"],
    }
}

/// Paths changed in the working tree since the last commit, by scope.
pub fn changed_paths(root: &Path, scope: DiffScope) -> Result<Vec<String>> {
    let stdout = run_checked(root, &name_only_args(scope))?;
    Ok(lines(&stdout))
}

/// Paths touched by a single commit. `--root` keeps this working when the
/// commit has no parent.
pub fn changed_paths_in_commit(root: &Path, id: &str) -> Result<Vec<String>> {
    let stdout = run_checked(
        root,
        &["diff-tree", "--no-commit-id", "--name-only", "-r", "--root", id],
    )?;
    Ok(lines(&stdout))
}

/// Paths that differ between two commits.
pub fn changed_paths_in_range(root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let stdout = run_checked(root, &["diff", "--name-only", from, to])?;
    Ok(lines(&stdout))
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Export the working-tree changes as a binary-safe patch with generous
/// context, re-applicable in a sibling repository.
pub fn export_working_diff(root: &Path, scope: DiffScope) -> Result<Vec<u8>> {
    let mut args: Vec<&str> = vec!["diff", "--binary", "-U10"];
    match scope {
        DiffScope::Unstaged => {}
        DiffScope::Staged => args.push("--cached"),
        DiffScope::Both => args.push("HEAD"),
    }
    let output = run(root, &args)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            tool: "git".to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Export one commit or a commit range as a mailbox-format patch
/// (`git format-patch --stdout`), suitable for replay with `git am`.
pub fn export_commit_patch(root: &Path, from: Option<&str>, to: &str) -> Result<Vec<u8>> {
    // `-1 <commit>` covers single commits with or without a parent; a
    // `<to>^..` spec would reject the root commit.
    let range;
    let args: Vec<&str> = match from {
        Some(from) => {
            range = format!("{}..{}", from, to);
            vec!["format-patch", "--stdout", "--binary", &range]
        }
        None => vec!["format-patch", "--stdout", "--binary", "-1", to],
    };
    let output = run(root, &args)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            tool: "git".to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Does this path currently differ from its last-committed state
/// (modified, staged, or untracked)?
pub fn path_is_divergent(root: &Path, relative_path: &str) -> Result<bool> {
    let stdout = run_checked(root, &["status", "--porcelain", "--", relative_path])?;
    Ok(!stdout.trim().is_empty())
}

/// Snapshot of everything not yet committed, as a binary-safe patch.
/// Empty output means the tree matches HEAD.
pub fn diff_head_binary(root: &Path) -> Result<Vec<u8>> {
    let output = run(root, &["diff", "HEAD", "--binary"])?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            tool: "git".to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Non-mutating trial application. Success means the patch would apply
/// cleanly to the current tree.
pub fn apply_check(root: &Path, patch: &[u8]) -> Result<ApplyOutcome> {
    let output = run_with_stdin(root, &["apply", "--check", "--whitespace=nowarn"], patch)?;
    Ok(outcome(output))
}

/// Apply a working-tree patch with three-way fallback. On partial failure
/// git leaves conflict markers in place; we report failure and keep them
/// visible for the operator.
pub fn apply_patch(root: &Path, patch: &[u8]) -> Result<ApplyOutcome> {
    let output = run_with_stdin(root, &["apply", "--3way", "--whitespace=nowarn"], patch)?;
    Ok(outcome(output))
}

/// Replay a mailbox patch (`git am --3way`). Any failure is unwound with
/// `git am --abort` so the tree returns to its pre-attempt state.
pub fn apply_mailbox(root: &Path, mailbox: &[u8]) -> Result<ApplyOutcome> {
    let output = run_with_stdin(root, &["am", "--3way", "--keep-cr"], mailbox)?;
    let result = outcome(output);
    if !result.success {
        warn!("git am failed in {}, aborting: {}", root.display(), result.detail);
        abort_mailbox(root);
    }
    Ok(result)
}

/// Reverse-apply a previously applied patch. Tries a direct reverse first,
/// then falls back to three-way for trees that have drifted.
pub fn reverse_apply(root: &Path, patch: &[u8]) -> Result<ApplyOutcome> {
    let output = run_with_stdin(root, &["apply", "-R", "--whitespace=nowarn"], patch)?;
    let direct = outcome(output);
    if direct.success {
        return Ok(direct);
    }
    let output = run_with_stdin(root, &["apply", "-R", "--3way", "--whitespace=nowarn"], patch)?;
    Ok(outcome(output))
}

/// Hard-reset the work tree and HEAD to a specific commit.
pub fn reset_hard(root: &Path, commit: &str) -> Result<ApplyOutcome> {
    let output = run(root, &["reset", "--hard", commit])?;
    Ok(outcome(output))
}

/// Best-effort unwind of an in-progress `git am`.
pub fn abort_mailbox(root: &Path) {
    if let Ok(output) = run(root, &["am", "--abort"])
        && !output.status.success()
    {
        debug!(
            "git am --abort in {}: {}",
            root.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
}

fn outcome(output: Output) -> ApplyOutcome {
    let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if detail.is_empty() {
        detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
    }
    ApplyOutcome {
        success: output.status.success(),
        detail,
    }
}
