// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use commands::propagate::PropagateOpts;
use fs2::FileExt;
use ripple::config;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_root = config::data_root();
    fs::create_dir_all(&data_root)
        .with_context(|| format!("cannot create data root {}", data_root.display()))?;
    init_tracing(&data_root)?;

    match cli.command {
        Commands::Propagate {
            workspace,
            strategy,
            source,
            targets,
            commit,
            range,
            scope,
            pick,
            skip_binaries,
            yes,
        } => {
            let _lock = acquire_run_lock(&data_root)?;
            commands::propagate::cmd_propagate(
                &data_root,
                PropagateOpts {
                    workspace,
                    strategy,
                    source,
                    targets,
                    commit,
                    range,
                    scope,
                    pick,
                    skip_binaries,
                    yes,
                },
            )
        }
        Commands::Revert { session, yes } => {
            let _lock = acquire_run_lock(&data_root)?;
            commands::revert::cmd_revert(&data_root, session, yes)
        }
        Commands::Sessions => commands::sessions::cmd_sessions(&data_root),
    }
}

/// Console logging honors RUST_LOG (default warn); the append-only instance
/// log under the data root keeps full diagnostic detail for post-hoc
/// troubleshooting.
fn init_tracing(data_root: &Path) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config::log_path(data_root))
        .with_context(|| "cannot open log file")?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        );
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(EnvFilter::new("ripple=debug"));

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}

/// One mutating run per data root at a time.
fn acquire_run_lock(data_root: &Path) -> Result<File> {
    let lock = File::create(config::lock_path(data_root))?;
    lock.try_lock_exclusive()
        .context("another ripple run is already in progress")?;
    Ok(lock)
}
