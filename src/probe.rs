// src/probe.rs

//! Non-mutating compatibility checks ("dry run") against target repositories.
//!
//! Whole-file mode checks each file for local divergence from its last
//! commit; patch mode runs a trial application. Neither touches the target:
//! probing an unmutated target twice yields identical results.

use crate::error::Result;
use crate::extract::{PatchBlob, PatchKind};
use crate::git;
use crate::repo::Repository;
use tracing::debug;

/// Per-file verdict in whole-file mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCompat {
    pub path: String,
    pub compatible: bool,
    pub reason: String,
}

/// Per-target verdict, with per-file detail in whole-file mode.
#[derive(Debug, Clone)]
pub struct CompatibilityReport {
    pub repo: String,
    pub compatible: bool,
    pub reason: String,
    pub files: Vec<FileCompat>,
}

impl CompatibilityReport {
    /// Conflict reason for one file, if the probe flagged it.
    pub fn conflict_for(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path && !f.compatible)
            .map(|f| f.reason.as_str())
    }
}

/// Whole-file probe: a file conflicts when the target copy already differs
/// from its last-committed version, since an apply would clobber local edits.
pub fn probe_files(target: &Repository, paths: &[String]) -> Result<CompatibilityReport> {
    target.validate()?;

    let mut files = Vec::with_capacity(paths.len());
    let mut conflicts = 0usize;
    for path in paths {
        let exists = target.path_of(path).exists();
        let divergent = exists && git::path_is_divergent(&target.root, path)?;
        let (compatible, reason) = if divergent {
            conflicts += 1;
            (false, "locally modified since last commit".to_string())
        } else if !exists {
            (true, "new file".to_string())
        } else {
            (true, "clean".to_string())
        };
        files.push(FileCompat {
            path: path.clone(),
            compatible,
            reason,
        });
    }

    debug!("probe {}: {}/{} files conflict", target.name, conflicts, paths.len());
    Ok(CompatibilityReport {
        repo: target.name.clone(),
        compatible: conflicts == 0,
        reason: if conflicts == 0 {
            "all files clean".to_string()
        } else {
            format!("{} file(s) locally modified", conflicts)
        },
        files,
    })
}

/// Patch probe: trial application with `git apply --check`. The check never
/// mutates, but if a future git version leaves trial residue behind the
/// unwind below puts the tree back regardless.
pub fn probe_patch(target: &Repository, blob: &PatchBlob) -> Result<CompatibilityReport> {
    target.validate()?;

    let outcome = git::apply_check(&target.root, &blob.bytes)?;
    if !outcome.success && blob.kind == PatchKind::Mailbox {
        git::abort_mailbox(&target.root);
    }

    Ok(CompatibilityReport {
        repo: target.name.clone(),
        compatible: outcome.success,
        reason: if outcome.success {
            "patch applies cleanly".to_string()
        } else {
            format!("patch does not apply: {}", outcome.detail)
        },
        files: Vec::new(),
    })
}
