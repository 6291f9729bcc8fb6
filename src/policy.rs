// src/policy.rs

//! Path filtering, critical-path detection, and binary classification.

use crate::config::Config;
use crate::error::{Error, Result};
use glob::Pattern;
use tracing::debug;

/// How far into a file we look for non-text bytes. Matches git's own
/// binary-detection horizon.
const CLASSIFY_WINDOW: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Compiled exclude and critical glob sets.
#[derive(Debug, Clone)]
pub struct PolicySet {
    excludes: Vec<Pattern>,
    criticals: Vec<Pattern>,
}

impl PolicySet {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            excludes: compile(&config.exclude)?,
            criticals: compile(&config.critical)?,
        })
    }

    /// Drop every path matching any exclude glob. Excluded paths never
    /// appear in a candidate list, regardless of extraction mode.
    pub fn filter(&self, paths: Vec<String>) -> Vec<String> {
        paths
            .into_iter()
            .filter(|p| {
                let excluded = self.is_excluded(p);
                if excluded {
                    debug!("excluded by policy: {}", p);
                }
                !excluded
            })
            .collect()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|g| g.matches(path))
    }

    /// Does this path require an explicit per-file confirmation before
    /// mutation?
    pub fn is_critical(&self, path: &str) -> bool {
        self.criticals.iter().any(|g| g.matches(path))
    }
}

fn compile(globs: &[String]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| {
            Pattern::new(g).map_err(|e| Error::ConfigError(format!("invalid glob '{}': {}", g, e)))
        })
        .collect()
}

/// Classify file content as text or binary. A NUL byte anywhere in the
/// leading window means binary; empty files are text.
pub fn classify(bytes: &[u8]) -> ContentKind {
    let window = &bytes[..bytes.len().min(CLASSIFY_WINDOW)];
    if window.contains(&0) {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}
