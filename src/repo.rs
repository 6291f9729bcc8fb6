// src/repo.rs

//! Repository discovery and validation.
//!
//! Repositories are the immediate children of a workspace directory that
//! contain a `.git` entry. Source/target roles are assigned per operation,
//! never stored here.

use crate::error::{Error, Result};
use crate::git;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A named, locally rooted git working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Directory basename, used for display and backup records.
    pub name: String,
    /// Absolute root path of the working copy.
    pub root: PathBuf,
}

impl Repository {
    pub fn new(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    /// Re-check that this is still a valid git work tree. A repository can
    /// become invalid between discovery and use, so every mutating step
    /// calls this again first.
    pub fn validate(&self) -> Result<()> {
        if git::is_work_tree(&self.root) {
            Ok(())
        } else {
            Err(Error::NotAWorkTree(self.root.clone()))
        }
    }

    /// Absolute path of a repository-relative file.
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Find git repositories directly under `workspace`, sorted by name.
pub fn discover(workspace: &Path) -> Result<Vec<Repository>> {
    let mut repos = Vec::new();
    for entry in WalkDir::new(workspace)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() && entry.path().join(".git").exists() {
            debug!("discovered repository: {}", entry.path().display());
            repos.push(Repository::new(entry.path().to_path_buf()));
        }
    }

    if repos.is_empty() {
        return Err(Error::NoRepositories(workspace.to_path_buf()));
    }
    Ok(repos)
}
