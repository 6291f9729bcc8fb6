// src/lib.rs

//! Ripple
//!
//! Propagates file-level and patch-level changes from one local git working
//! copy to structurally similar sibling working copies, while keeping every
//! propagation run revertible as a unit.
//!
//! # Architecture
//!
//! - Change sets: extracted once, immutable, filtered by glob policy
//! - Dry runs: per-target compatibility probes that never mutate
//! - Sessions: one directory of backups per apply run, with a structured
//!   JSON manifest, consumed wholesale by the revert engine
//! - Gates: every operator confirmation goes through a policy trait, so
//!   automation substitutes a preset decision table

pub mod apply;
pub mod config;
mod error;
pub mod extract;
pub mod gate;
pub mod git;
pub mod policy;
pub mod probe;
pub mod progress;
pub mod repo;
pub mod report;
pub mod revert;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use extract::{ExtractMode, PatchBlob, PatchKind};
pub use gate::{Decision, Gate, GatePolicy, InteractiveGate, PresetGate};
pub use git::DiffScope;
pub use policy::{ContentKind, PolicySet};
pub use probe::{CompatibilityReport, FileCompat};
pub use report::{ItemResult, ItemStatus, RunReport};
pub use repo::Repository;
pub use session::{BackupRecord, Session, SessionManifest, SessionStore, SessionSummary};
