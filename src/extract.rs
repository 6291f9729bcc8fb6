// src/extract.rs

//! Change-set extraction from the source repository.
//!
//! A change set is either a set of relative file paths (whole-file strategy)
//! or one opaque patch blob (patch strategy). Both are immutable once
//! extracted; downstream components only read them.

use crate::error::{Error, Result};
use crate::git::{self, DiffScope};
use crate::repo::Repository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the change set is selected from the source repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractMode {
    /// Working-tree changes since the last commit.
    WorkingTree(DiffScope),
    /// Changes introduced by one commit.
    Commit(String),
    /// Changes between two commits.
    Range { from: String, to: String },
    /// Operator-picked subset of the working-tree change list
    /// (indices into the enumeration shown by `list_candidates`).
    Manual(Vec<usize>),
}

/// Distinguishes how a patch blob must be applied downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchKind {
    /// Plain diff of a working tree; applied with `git apply --3way`.
    WorkingTree,
    /// Mailbox produced by `git format-patch`; replayed with `git am --3way`.
    Mailbox,
}

/// A single exportable patch covering the whole change set.
#[derive(Debug, Clone)]
pub struct PatchBlob {
    pub kind: PatchKind,
    pub bytes: Vec<u8>,
    /// Human-readable description of where the patch came from.
    pub description: String,
}

/// Enumerate the working-tree candidates shown to the operator for manual
/// selection.
pub fn list_candidates(source: &Repository, scope: DiffScope) -> Result<Vec<String>> {
    source.validate()?;
    Ok(dedupe(git::changed_paths(&source.root, scope)?))
}

/// Pick paths by displayed index. Out-of-bounds indices are an operator
/// input error, not a silent drop.
pub fn select_by_indices(candidates: &[String], indices: &[usize]) -> Result<Vec<String>> {
    let mut picked = Vec::new();
    for &i in indices {
        let path = candidates
            .get(i)
            .ok_or_else(|| Error::InvalidSelection(format!("index {} out of range", i + 1)))?;
        picked.push(path.clone());
    }
    Ok(dedupe(picked))
}

/// Extract a de-duplicated, sorted set of changed relative paths.
pub fn extract_files(source: &Repository, mode: &ExtractMode) -> Result<Vec<String>> {
    source.validate()?;
    let paths = match mode {
        ExtractMode::WorkingTree(scope) => git::changed_paths(&source.root, *scope)?,
        ExtractMode::Commit(id) => {
            validate_commit(source, id)?;
            git::changed_paths_in_commit(&source.root, id)?
        }
        ExtractMode::Range { from, to } => {
            validate_commit(source, from)?;
            validate_commit(source, to)?;
            git::changed_paths_in_range(&source.root, from, to)?
        }
        ExtractMode::Manual(indices) => {
            let candidates = list_candidates(source, DiffScope::Both)?;
            select_by_indices(&candidates, indices)?
        }
    };

    let paths = dedupe(paths);
    if paths.is_empty() {
        return Err(Error::EmptyChangeSet);
    }
    Ok(paths)
}

/// Extract the same logical change as one re-applicable patch blob.
pub fn extract_patch(source: &Repository, mode: &ExtractMode) -> Result<PatchBlob> {
    source.validate()?;
    let blob = match mode {
        ExtractMode::WorkingTree(scope) => PatchBlob {
            kind: PatchKind::WorkingTree,
            bytes: git::export_working_diff(&source.root, *scope)?,
            description: format!("working tree of {}", source.name),
        },
        ExtractMode::Commit(id) => {
            validate_commit(source, id)?;
            PatchBlob {
                kind: PatchKind::Mailbox,
                bytes: git::export_commit_patch(&source.root, None, id)?,
                description: format!("commit {} of {}", id, source.name),
            }
        }
        ExtractMode::Range { from, to } => {
            validate_commit(source, from)?;
            validate_commit(source, to)?;
            PatchBlob {
                kind: PatchKind::Mailbox,
                bytes: git::export_commit_patch(&source.root, Some(from), to)?,
                description: format!("range {}..{} of {}", from, to, source.name),
            }
        }
        ExtractMode::Manual(_) => {
            return Err(Error::InvalidSelection(
                "manual file selection is a whole-file mode".to_string(),
            ));
        }
    };

    if blob.bytes.is_empty() {
        return Err(Error::EmptyChangeSet);
    }
    Ok(blob)
}

fn validate_commit(source: &Repository, id: &str) -> Result<()> {
    if git::commit_exists(&source.root, id) {
        Ok(())
    } else {
        Err(Error::InvalidSelection(format!(
            "'{}' is not a commit in {}",
            id, source.name
        )))
    }
}

fn dedupe(paths: Vec<String>) -> Vec<String> {
    paths.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
