// src/apply.rs

//! The apply engine: the only component allowed to mutate a target
//! repository during a propagation run.
//!
//! Two strategies:
//!
//! - **Whole-file**: copy source bytes over the destination, after walking
//!   the gate chain (missing source, missing directory, binary skip,
//!   conflict override, critical-path confirmation) and snapshotting the
//!   pre-existing destination into the session.
//! - **Patch**: record a whole-repository pre-state backup, then apply the
//!   blob with three-way tolerance. Working-tree diffs leave conflict
//!   markers visible on partial failure; mailbox patches abort cleanly back
//!   to the pre-attempt state.
//!
//! Every error below the item boundary becomes an `ItemStatus`; only an
//! operator abort propagates out as `Error::Aborted`.

use crate::error::{Error, Result};
use crate::extract::{PatchBlob, PatchKind};
use crate::gate::{Decision, Gate, GatePolicy};
use crate::git;
use crate::policy::{self, ContentKind, PolicySet};
use crate::probe::CompatibilityReport;
use crate::report::{ItemResult, ItemStatus};
use crate::repo::Repository;
use crate::session::Session;
use std::fs;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Skip all binary files wholesale (whole-file mode only).
    pub skip_binaries: bool,
}

/// Apply one file to one target repository.
#[allow(clippy::too_many_arguments)]
pub fn apply_file(
    session: &mut Session,
    source: &Repository,
    target: &Repository,
    relative_path: &str,
    conflict: Option<&str>,
    policies: &PolicySet,
    options: ApplyOptions,
    gates: &dyn GatePolicy,
) -> Result<ItemResult> {
    let failed = |detail: String| {
        Ok(ItemResult::new(&target.name, relative_path, ItemStatus::Failed, detail))
    };
    let skipped = |detail: String| {
        Ok(ItemResult::new(&target.name, relative_path, ItemStatus::Skipped, detail))
    };

    if let Err(e) = target.validate() {
        return failed(e.to_string());
    }

    let source_path = source.path_of(relative_path);
    if !source_path.is_file() {
        return failed("source file missing".to_string());
    }

    let destination = target.path_of(relative_path);
    if let Some(parent) = destination.parent()
        && !parent.exists()
    {
        match gates.confirm(Gate::CreateDirectory, &parent.display().to_string())? {
            Decision::Proceed => {
                if let Err(e) = fs::create_dir_all(parent) {
                    return failed(format!("cannot create {}: {}", parent.display(), e));
                }
            }
            Decision::Skip => return failed("destination directory missing".to_string()),
            Decision::Abort => return Err(Error::Aborted),
        }
    }

    let source_bytes = match fs::read(&source_path) {
        Ok(bytes) => bytes,
        Err(e) => return failed(format!("cannot read source: {}", e)),
    };

    if options.skip_binaries && policy::classify(&source_bytes) == ContentKind::Binary {
        return skipped("binary file".to_string());
    }

    if let Some(reason) = conflict {
        let context = format!("{}:{}", target.name, relative_path);
        match gates.confirm(Gate::OverwriteConflict, &context)? {
            Decision::Proceed => {}
            Decision::Skip => return skipped(reason.to_string()),
            Decision::Abort => return Err(Error::Aborted),
        }
    }

    if policies.is_critical(relative_path) {
        let context = format!("{}:{}", target.name, relative_path);
        match gates.confirm(Gate::CriticalPath, &context)? {
            Decision::Proceed => {}
            Decision::Skip => return skipped("critical path declined".to_string()),
            Decision::Abort => return Err(Error::Aborted),
        }
    }

    // Backup strictly before the overwrite. A previously absent destination
    // needs no pre-state capture; its backup is its own absence.
    if destination.is_file()
        && let Err(e) = session.record_file_backup(target, relative_path)
    {
        warn!("{}", e);
        return failed(e.to_string());
    }

    if let Err(e) = fs::write(&destination, &source_bytes) {
        return failed(format!("copy failed: {}", e));
    }

    match fs::read(&destination) {
        Ok(written) if written == source_bytes => {
            info!("applied {} -> {}:{}", source.name, target.name, relative_path);
            Ok(ItemResult::new(
                &target.name,
                relative_path,
                ItemStatus::Applied,
                String::new(),
            ))
        }
        Ok(_) => failed("destination differs from source after copy".to_string()),
        Err(e) => failed(format!("cannot verify destination: {}", e)),
    }
}

/// Apply a patch blob to one target repository, as a single atomic unit.
pub fn apply_patch(
    session: &mut Session,
    target: &Repository,
    blob: &PatchBlob,
    compat: &CompatibilityReport,
    gates: &dyn GatePolicy,
) -> Result<ItemResult> {
    const ITEM: &str = "patch";
    let failed =
        |detail: String| Ok(ItemResult::new(&target.name, ITEM, ItemStatus::Failed, detail));

    if let Err(e) = target.validate() {
        return failed(e.to_string());
    }

    if !compat.compatible {
        match gates.confirm(Gate::IncompatibleTarget, &target.name)? {
            Decision::Proceed => {}
            Decision::Skip => {
                return Ok(ItemResult::new(
                    &target.name,
                    ITEM,
                    ItemStatus::Skipped,
                    compat.reason.clone(),
                ));
            }
            Decision::Abort => return Err(Error::Aborted),
        }
    }

    // Whole-repository pre-state backup, before touching anything. At most
    // one per target per session; a repeat apply reuses the first record so
    // revert unwinds to the true pre-session state. A failed backup fails
    // the target closed. Only the mailbox kind needs the uncommitted
    // divergence captured (its revert resets HEAD and must re-establish it).
    if !session.has_repo_backup(&target.name) {
        let head_before = match git::head_commit(&target.root) {
            Ok(head) => head,
            Err(e) => return failed(format!("cannot record pre-state: {}", e)),
        };
        let prestate = match blob.kind {
            PatchKind::Mailbox => match git::diff_head_binary(&target.root) {
                Ok(bytes) => Some(bytes),
                Err(e) => return failed(format!("cannot record pre-state: {}", e)),
            },
            PatchKind::WorkingTree => None,
        };
        if let Err(e) =
            session.record_repo_backup(target, blob.kind, &head_before, prestate.as_deref(), &blob.bytes)
        {
            warn!("{}", e);
            return failed(e.to_string());
        }
    }

    let outcome = match blob.kind {
        PatchKind::WorkingTree => git::apply_patch(&target.root, &blob.bytes),
        PatchKind::Mailbox => git::apply_mailbox(&target.root, &blob.bytes),
    };

    match outcome {
        Ok(result) if result.success => {
            info!("applied {} to {}", blob.description, target.name);
            Ok(ItemResult::new(&target.name, ITEM, ItemStatus::Applied, blob.description.clone()))
        }
        Ok(result) => {
            warn!("patch failed on {}: {}", target.name, result.detail);
            failed(result.detail)
        }
        Err(e) => failed(e.to_string()),
    }
}
