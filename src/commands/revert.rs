// src/commands/revert.rs

//! Interactive session-revert flow.

use super::{confirm, prompt_index};
use anyhow::Result;
use ripple::{revert, Error, GatePolicy, InteractiveGate, ItemStatus, PresetGate, SessionStore};
use std::path::Path;

pub fn cmd_revert(data_root: &Path, session: Option<String>, yes: bool) -> Result<()> {
    let store = SessionStore::new(data_root);

    let session_id = match session {
        Some(id) => id,
        None => {
            let sessions = store.list()?;
            if sessions.is_empty() {
                println!("No recorded sessions.");
                return Ok(());
            }
            println!("Sessions:");
            for (i, summary) in sessions.iter().enumerate() {
                println!(
                    "  [{}] {}  ({} backup(s), created {})",
                    i + 1,
                    summary.id,
                    summary.record_count,
                    summary.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                );
            }
            let index = prompt_index("Session to revert", sessions.len())?;
            sessions[index].id.clone()
        }
    };

    let manifest = store.load(&session_id)?;
    if manifest.records.is_empty() {
        println!("Session {} recorded no backups; nothing to revert.", session_id);
        return Ok(());
    }

    if !yes
        && !confirm(&format!(
            "Revert session {} ({} backup(s))?",
            session_id,
            manifest.records.len()
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let gates: Box<dyn GatePolicy> = if yes {
        Box::new(PresetGate::allow_all())
    } else {
        Box::new(InteractiveGate)
    };

    match revert::revert_session(&store, &session_id, gates.as_ref()) {
        Ok(report) => {
            println!("\n{}", report.render());
            println!(
                "restored: {}  reverted: {}  failed: {}",
                report.count(ItemStatus::Restored),
                report.count(ItemStatus::Reverted),
                report.count(ItemStatus::Failed),
            );
            Ok(())
        }
        Err(Error::Aborted) => {
            println!("Aborted by operator.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
