// src/revert.rs

//! The revert engine: restore every backup recorded in a session.
//!
//! Records are walked in reverse recording order, though independent targets
//! carry no ordering dependency. Items are independent: one failed restore
//! never blocks attempting the rest of the session, and re-running revert on
//! an already-reverted item is safe.

use crate::error::{Error, Result};
use crate::extract::PatchKind;
use crate::gate::{Decision, Gate, GatePolicy};
use crate::git;
use crate::report::{ItemResult, ItemStatus, RunReport};
use crate::repo::Repository;
use crate::session::{BackupRecord, SessionStore};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Revert an entire session. Returns one result per recorded backup.
pub fn revert_session(
    store: &SessionStore,
    session_id: &str,
    gates: &dyn GatePolicy,
) -> Result<RunReport> {
    let manifest = store.load(session_id)?;
    let session_dir = store.session_dir(session_id);
    info!("reverting session {} ({} records)", session_id, manifest.records.len());

    let mut report = RunReport::new();
    for record in manifest.records.iter().rev() {
        let result = match record {
            BackupRecord::File {
                repo_name,
                repo_root,
                relative_path,
                backup_file,
            } => restore_file(
                &session_dir,
                repo_name,
                repo_root,
                relative_path,
                backup_file,
                gates,
            )?,
            BackupRecord::RepoPatch {
                repo_name,
                repo_root,
                kind,
                head_before,
                prestate_file,
                change_file,
            } => restore_repo(
                &session_dir,
                repo_name,
                repo_root,
                *kind,
                head_before,
                prestate_file.as_deref(),
                change_file,
            ),
        };
        report.push(result);
    }
    Ok(report)
}

fn restore_file(
    session_dir: &Path,
    repo_name: &str,
    repo_root: &Path,
    relative_path: &str,
    backup_file: &str,
    gates: &dyn GatePolicy,
) -> Result<ItemResult> {
    let failed =
        |detail: String| Ok(ItemResult::new(repo_name, relative_path, ItemStatus::Failed, detail));

    let backup = match fs::read(session_dir.join(backup_file)) {
        Ok(bytes) => bytes,
        Err(e) => return failed(format!("cannot read backup: {}", e)),
    };

    let live = repo_root.join(relative_path);
    if let Some(parent) = live.parent()
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

    match fs::write(&live, &backup) {
        Ok(()) => {
            info!("restored {}:{}", repo_name, relative_path);
            Ok(ItemResult::new(repo_name, relative_path, ItemStatus::Restored, String::new()))
        }
        Err(e) => failed(format!("restore failed: {}", e)),
    }
}

fn restore_repo(
    session_dir: &Path,
    repo_name: &str,
    repo_root: &Path,
    kind: PatchKind,
    head_before: &str,
    prestate_file: Option<&str>,
    change_file: &str,
) -> ItemResult {
    const ITEM: &str = "repository patch";
    let failed = |detail: String| ItemResult::new(repo_name, ITEM, ItemStatus::Failed, detail);

    let repo = Repository::new(repo_root.to_path_buf());
    if let Err(e) = repo.validate() {
        return failed(e.to_string());
    }

    match kind {
        PatchKind::Mailbox => {
            // The apply replayed commits, so restoring means moving HEAD back
            // and re-establishing whatever uncommitted divergence existed.
            match git::reset_hard(repo_root, head_before) {
                Ok(outcome) if outcome.success => {}
                Ok(outcome) => return failed(format!("reset failed: {}", outcome.detail)),
                Err(e) => return failed(e.to_string()),
            }
            if let Some(file) = prestate_file {
                let prestate = match fs::read(session_dir.join(file)) {
                    Ok(bytes) => bytes,
                    Err(e) => return failed(format!("cannot read pre-state backup: {}", e)),
                };
                if !prestate.is_empty() {
                    match git::apply_patch(repo_root, &prestate) {
                        Ok(outcome) if outcome.success => {}
                        Ok(outcome) => {
                            warn!("pre-state restore failed on {}: {}", repo_name, outcome.detail);
                            return failed(format!("pre-state restore failed: {}", outcome.detail));
                        }
                        Err(e) => return failed(e.to_string()),
                    }
                }
            }
        }
        PatchKind::WorkingTree => {
            let change = match fs::read(session_dir.join(change_file)) {
                Ok(bytes) => bytes,
                Err(e) => return failed(format!("cannot read change backup: {}", e)),
            };
            if change.is_empty() {
                return ItemResult::new(
                    repo_name,
                    ITEM,
                    ItemStatus::Reverted,
                    "nothing to undo".to_string(),
                );
            }
            match git::reverse_apply(repo_root, &change) {
                Ok(outcome) if outcome.success => {}
                Ok(outcome) => {
                    warn!("reverse apply failed on {}: {}", repo_name, outcome.detail);
                    return failed(format!("reverse apply failed: {}", outcome.detail));
                }
                Err(e) => return failed(e.to_string()),
            }
        }
    }

    info!("reverted repository patch on {}", repo_name);
    ItemResult::new(repo_name, ITEM, ItemStatus::Reverted, String::new())
}
