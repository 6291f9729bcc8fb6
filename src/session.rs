// src/session.rs

//! Session management: the unit of whole-run reversibility.
//!
//! Every apply run opens one session. Each backup taken during the run is
//! written into the session directory and appended to a JSON manifest of
//! structured records, so recovering the target repository and original
//! path never depends on decoding an artifact filename.
//!
//! The manifest is rewritten atomically (temp file + rename) after every
//! record, so a run that dies mid-way still leaves a revertible session.
//! Sessions are immutable once the run completes and are never auto-deleted.

use crate::error::{Error, Result};
use crate::extract::PatchKind;
use crate::repo::Repository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const MANIFEST_FILE: &str = "manifest.json";

/// One captured pre-mutation snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BackupRecord {
    /// Byte-for-byte copy of a target file taken immediately before overwrite.
    File {
        repo_name: String,
        repo_root: PathBuf,
        relative_path: String,
        backup_file: String,
    },
    /// Whole-repository pre-state for patch mode: the HEAD the target was
    /// on, its uncommitted divergence (mailbox kind only, where the revert
    /// resets HEAD and must re-establish it), and the change blob that was
    /// applied. Recorded exactly once per target repository per session.
    RepoPatch {
        repo_name: String,
        repo_root: PathBuf,
        kind: PatchKind,
        head_before: String,
        prestate_file: Option<String>,
        change_file: String,
    },
}

impl BackupRecord {
    pub fn repo_name(&self) -> &str {
        match self {
            BackupRecord::File { repo_name, .. } => repo_name,
            BackupRecord::RepoPatch { repo_name, .. } => repo_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<BackupRecord>,
}

/// A session open for writing during an apply run.
pub struct Session {
    dir: PathBuf,
    manifest: SessionManifest,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records(&self) -> &[BackupRecord] {
        &self.manifest.records
    }

    /// Snapshot one target file before it is overwritten. Must succeed
    /// before the corresponding copy; any failure here fails the item closed.
    pub fn record_file_backup(&mut self, repo: &Repository, relative_path: &str) -> Result<()> {
        let live = repo.path_of(relative_path);
        let backup_file = format!("file-{:04}.bak", self.manifest.records.len());
        let backup_path = self.dir.join(&backup_file);

        fs::copy(&live, &backup_path).map_err(|e| {
            Error::BackupFailed(format!("cannot snapshot {}: {}", live.display(), e))
        })?;

        self.manifest.records.push(BackupRecord::File {
            repo_name: repo.name.clone(),
            repo_root: repo.root.clone(),
            relative_path: relative_path.to_string(),
            backup_file,
        });
        self.write_manifest()?;
        debug!("backed up {}:{}", repo.name, relative_path);
        Ok(())
    }

    /// Record the whole-repository pre-state for patch mode. The caller
    /// gathers `head_before` and `prestate` from the target before calling.
    /// At most one such record may exist per target repository per session.
    pub fn record_repo_backup(
        &mut self,
        repo: &Repository,
        kind: PatchKind,
        head_before: &str,
        prestate: Option<&[u8]>,
        change: &[u8],
    ) -> Result<()> {
        if self.has_repo_backup(&repo.name) {
            return Err(Error::BackupFailed(format!(
                "repository {} already has a pre-state backup in session {}",
                repo.name, self.manifest.id
            )));
        }

        let write = |name: String, bytes: &[u8]| -> Result<String> {
            fs::write(self.dir.join(&name), bytes)
                .map_err(|e| Error::BackupFailed(format!("cannot write {}: {}", name, e)))?;
            Ok(name)
        };
        let prestate_file = prestate
            .map(|bytes| write(format!("repo-{}.prestate.patch", repo.name), bytes))
            .transpose()?;
        let change_file = write(format!("repo-{}.change.patch", repo.name), change)?;

        self.manifest.records.push(BackupRecord::RepoPatch {
            repo_name: repo.name.clone(),
            repo_root: repo.root.clone(),
            kind,
            head_before: head_before.to_string(),
            prestate_file,
            change_file,
        });
        self.write_manifest()?;
        debug!("backed up repository pre-state for {}", repo.name);
        Ok(())
    }

    /// Has a whole-repository backup already been recorded for this target?
    pub fn has_repo_backup(&self, repo_name: &str) -> bool {
        self.manifest.records.iter().any(|r| {
            matches!(r, BackupRecord::RepoPatch { repo_name: n, .. } if n == repo_name)
        })
    }

    fn write_manifest(&self) -> Result<()> {
        let rendered = serde_json::to_vec_pretty(&self.manifest)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::BackupFailed(format!("cannot stage manifest: {}", e)))?;
        tmp.write_all(&rendered)
            .map_err(|e| Error::BackupFailed(format!("cannot write manifest: {}", e)))?;
        tmp.persist(self.dir.join(MANIFEST_FILE))
            .map_err(|e| Error::BackupFailed(format!("cannot persist manifest: {}", e)))?;
        Ok(())
    }
}

/// Summary line for `listSessions`.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
}

/// Accessor for the sessions directory under the data root.
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_root: &Path) -> Self {
        Self {
            sessions_dir: crate::config::sessions_dir(data_root),
        }
    }

    /// Open a fresh session with a timestamp-derived identifier. Identifiers
    /// are made unique with a numeric suffix when two runs share a second.
    pub fn open_session(&self) -> Result<Session> {
        fs::create_dir_all(&self.sessions_dir)?;

        let created_at = Utc::now();
        let base = created_at.format("%Y%m%d-%H%M%S").to_string();
        let mut id = base.clone();
        let mut counter = 1u32;
        while self.sessions_dir.join(&id).exists() {
            counter += 1;
            id = format!("{}-{}", base, counter);
        }

        let dir = self.sessions_dir.join(&id);
        fs::create_dir(&dir)?;

        let session = Session {
            dir,
            manifest: SessionManifest {
                id: id.clone(),
                created_at,
                records: Vec::new(),
            },
        };
        session.write_manifest()?;
        info!("opened session {}", id);
        Ok(session)
    }

    /// Enumerate recorded sessions in creation order. Timestamp-derived ids
    /// sort lexicographically in creation order.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        if !self.sessions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            if entry.path().join(MANIFEST_FILE).exists() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for name in names {
            let manifest = self.load(&name)?;
            summaries.push(SessionSummary {
                id: manifest.id,
                created_at: manifest.created_at,
                record_count: manifest.records.len(),
            });
        }
        Ok(summaries)
    }

    /// Load the manifest of one session.
    pub fn load(&self, id: &str) -> Result<SessionManifest> {
        let path = self.sessions_dir.join(id).join(MANIFEST_FILE);
        if !path.exists() {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn session_dir(&self, id: &str) -> PathBuf {
        self.sessions_dir.join(id)
    }
}
