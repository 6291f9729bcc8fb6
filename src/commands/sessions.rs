// src/commands/sessions.rs

//! List recorded sessions.

use anyhow::Result;
use ripple::SessionStore;
use std::path::Path;

pub fn cmd_sessions(data_root: &Path) -> Result<()> {
    let store = SessionStore::new(data_root);
    let sessions = store.list()?;

    if sessions.is_empty() {
        println!("No recorded sessions.");
        return Ok(());
    }

    println!("{:<22}  {:<22}  BACKUPS", "SESSION", "CREATED");
    for summary in sessions {
        println!(
            "{:<22}  {:<22}  {}",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.record_count,
        );
    }
    Ok(())
}
