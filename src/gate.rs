// src/gate.rs

//! Confirmation gates, separated from engine logic.
//!
//! Every point where the pipeline needs a human decision goes through the
//! `GatePolicy` trait: the interactive adapter asks on stdin, the preset
//! adapter answers from a table keyed by gate kind (used for `--yes` runs
//! and in tests). Engines never read stdin themselves.

use crate::error::Result;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

/// Recognized outcomes of a confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
    Abort,
}

/// The kinds of questions the pipeline can ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Target file is locally modified; overwrite anyway?
    OverwriteConflict,
    /// Path matches the critical glob set; mutate it?
    CriticalPath,
    /// Destination directory is missing; create it?
    CreateDirectory,
    /// Incompatible target in patch mode; apply anyway?
    IncompatibleTarget,
}

pub trait GatePolicy {
    fn confirm(&self, gate: Gate, context: &str) -> Result<Decision>;
}

/// Asks on stdin with a y/n/a prompt. Blocks until answered; this tool is
/// interactively operated and has no confirmation timeout.
pub struct InteractiveGate;

impl InteractiveGate {
    fn question(gate: Gate, context: &str) -> String {
        match gate {
            Gate::OverwriteConflict => {
                format!("{} has local changes. Overwrite anyway?", context)
            }
            Gate::CriticalPath => format!("{} is a critical path. Apply to it?", context),
            Gate::CreateDirectory => format!("Directory {} is missing. Create it?", context),
            Gate::IncompatibleTarget => {
                format!("{} failed the dry run. Apply anyway?", context)
            }
        }
    }
}

impl GatePolicy for InteractiveGate {
    fn confirm(&self, gate: Gate, context: &str) -> Result<Decision> {
        let mut stdout = io::stdout();
        loop {
            write!(stdout, "{} [y/n/a(bort)]: ", Self::question(gate, context))?;
            stdout.flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Proceed),
                "n" | "no" | "" => return Ok(Decision::Skip),
                "a" | "abort" | "q" => return Ok(Decision::Abort),
                _ => {
                    writeln!(stdout, "Unknown option. Please try again.")?;
                }
            }
        }
    }
}

/// Answers from a pre-declared table; unlisted gates get the default.
pub struct PresetGate {
    answers: HashMap<Gate, Decision>,
    default: Decision,
}

impl PresetGate {
    pub fn new(default: Decision) -> Self {
        Self {
            answers: HashMap::new(),
            default,
        }
    }

    /// Proceed at every gate (the `--yes` policy).
    pub fn allow_all() -> Self {
        Self::new(Decision::Proceed)
    }

    /// Skip at every gate.
    pub fn deny_all() -> Self {
        Self::new(Decision::Skip)
    }

    pub fn with(mut self, gate: Gate, decision: Decision) -> Self {
        self.answers.insert(gate, decision);
        self
    }
}

impl GatePolicy for PresetGate {
    fn confirm(&self, gate: Gate, _context: &str) -> Result<Decision> {
        Ok(self.answers.get(&gate).copied().unwrap_or(self.default))
    }
}
