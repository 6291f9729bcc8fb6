// src/cli.rs
//! CLI definitions for ripple.
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ripple")]
#[command(version)]
#[command(about = "Propagate change sets across sibling git repositories, with session-based revert", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Copy changed files whole, with per-file backups
    File,
    /// Export one patch and apply it per target with three-way tolerance
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Unstaged,
    Staged,
    Both,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Propagate a change set from one repository to its siblings
    Propagate {
        /// Directory whose immediate children are the repositories
        #[arg(short, long, default_value = ".")]
        workspace: String,

        /// Propagation strategy
        #[arg(long, value_enum, default_value = "file")]
        strategy: Strategy,

        /// Source repository name (prompted when omitted)
        #[arg(long)]
        source: Option<String>,

        /// Comma-separated target names, or "all" (prompted when omitted)
        #[arg(long)]
        targets: Option<String>,

        /// Extract the changes introduced by one commit
        #[arg(long, conflicts_with_all = ["range", "scope", "pick"])]
        commit: Option<String>,

        /// Extract the changes between two commits, as FROM..TO
        #[arg(long, conflicts_with_all = ["commit", "scope", "pick"])]
        range: Option<String>,

        /// Extract working-tree changes with this scope
        #[arg(long, value_enum, conflicts_with_all = ["commit", "range", "pick"])]
        scope: Option<ScopeArg>,

        /// Pick individual files from the working-tree change list
        #[arg(long, conflicts_with_all = ["commit", "range", "scope"])]
        pick: bool,

        /// Skip binary files wholesale (whole-file strategy)
        #[arg(long)]
        skip_binaries: bool,

        /// Answer yes at every confirmation gate
        #[arg(short, long)]
        yes: bool,
    },

    /// Revert every backup recorded by one past session
    Revert {
        /// Session identifier (prompted from a list when omitted)
        session: Option<String>,

        /// Answer yes at every confirmation gate
        #[arg(short, long)]
        yes: bool,
    },

    /// List recorded sessions
    Sessions,
}
