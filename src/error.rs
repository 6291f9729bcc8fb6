// src/error.rs

//! Central error type for the ripple library.
//!
//! Per-item failures during an apply or revert run are *not* represented
//! here; they are converted to an `ItemStatus` at the item boundary and
//! collected into the run report. Only discovery-level and selection-level
//! errors propagate out of the library and turn into a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("git binary not found on PATH")]
    GitNotFound,

    #[error("{tool} failed: {detail}")]
    CommandFailed { tool: String, detail: String },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("no qualifying changes found")]
    EmptyChangeSet,

    #[error("no git repositories found under {}", .0.display())]
    NoRepositories(PathBuf),

    #[error("no target repositories remain after exclusion")]
    NoTargets,

    #[error("{} is not a git work tree", .0.display())]
    NotAWorkTree(PathBuf),

    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("backup failed: {0}")]
    BackupFailed(String),

    #[error("operation aborted by operator")]
    Aborted,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    ManifestError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
