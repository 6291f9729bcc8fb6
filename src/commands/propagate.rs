// src/commands/propagate.rs

//! Interactive propagation flow: extract, filter, probe, confirm, apply.

use super::{confirm, prompt_index, prompt_indices, prompt_line};
use crate::cli::{ScopeArg, Strategy};
use anyhow::Result;
use ripple::progress::{ProgressTracker, SpinnerProgress};
use ripple::{
    apply, extract, git, probe, repo, CompatibilityReport, Config, DiffScope, Error, ExtractMode,
    GatePolicy, InteractiveGate, ItemResult, PolicySet, PresetGate, Repository, RunReport,
    SessionStore,
};
use std::path::Path;
use tracing::info;

pub struct PropagateOpts {
    pub workspace: String,
    pub strategy: Strategy,
    pub source: Option<String>,
    pub targets: Option<String>,
    pub commit: Option<String>,
    pub range: Option<String>,
    pub scope: Option<ScopeArg>,
    pub pick: bool,
    pub skip_binaries: bool,
    pub yes: bool,
}

pub fn cmd_propagate(data_root: &Path, opts: PropagateOpts) -> Result<()> {
    git::ensure_available()?;

    let config = Config::load_or_init(data_root)?;
    let policies = PolicySet::from_config(&config)?;

    let repos = repo::discover(Path::new(&opts.workspace))?;
    let source = select_source(&repos, opts.source.as_deref())?;
    println!("Source: {}", source.name);

    let mode = select_mode(&source, &opts)?;
    let targets = select_targets(&repos, &source, opts.targets.as_deref())?;

    let gates: Box<dyn GatePolicy> = if opts.yes {
        Box::new(PresetGate::allow_all())
    } else {
        Box::new(InteractiveGate)
    };

    let store = SessionStore::new(data_root);
    let report = match opts.strategy {
        Strategy::File => propagate_files(
            &store,
            &source,
            &targets,
            &mode,
            &policies,
            opts.skip_binaries || config.skip_binaries,
            gates.as_ref(),
        )?,
        Strategy::Patch => propagate_patch(&store, &source, &targets, &mode, gates.as_ref())?,
    };

    if let Some(report) = report {
        println!("\n{}", report.render());
        println!(
            "applied: {}  skipped: {}  failed: {}",
            report.count(ripple::ItemStatus::Applied),
            report.count(ripple::ItemStatus::Skipped),
            report.count(ripple::ItemStatus::Failed),
        );
    }
    Ok(())
}

fn select_source(repos: &[Repository], by_name: Option<&str>) -> Result<Repository> {
    if let Some(name) = by_name {
        return repos
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| Error::InvalidSelection(format!("no repository named '{}'", name)).into());
    }

    println!("Repositories:");
    for (i, repo) in repos.iter().enumerate() {
        println!("  [{}] {}", i + 1, repo.name);
    }
    let index = prompt_index("Source repository", repos.len())?;
    Ok(repos[index].clone())
}

fn select_mode(source: &Repository, opts: &PropagateOpts) -> Result<ExtractMode> {
    if let Some(id) = &opts.commit {
        return Ok(ExtractMode::Commit(id.clone()));
    }
    if let Some(range) = &opts.range {
        return Ok(parse_range(range)?);
    }
    if let Some(scope) = opts.scope {
        return Ok(ExtractMode::WorkingTree(scope_of(scope)));
    }
    if opts.pick {
        return pick_files(source);
    }

    println!("Extraction mode:");
    println!("  [1] working-tree changes since last commit");
    println!("  [2] changes introduced by one commit");
    println!("  [3] changes between two commits");
    println!("  [4] pick individual files from the working tree");
    match prompt_index("Mode", 4)? {
        0 => {
            let answer = prompt_line("Scope [unstaged/staged/both] (default both)")?;
            let scope = match answer.to_lowercase().as_str() {
                "unstaged" | "u" => DiffScope::Unstaged,
                "staged" | "s" => DiffScope::Staged,
                "both" | "b" | "" => DiffScope::Both,
                other => {
                    return Err(
                        Error::InvalidSelection(format!("unknown scope '{}'", other)).into()
                    );
                }
            };
            Ok(ExtractMode::WorkingTree(scope))
        }
        1 => {
            let id = prompt_line("Commit id")?;
            Ok(ExtractMode::Commit(id))
        }
        2 => {
            let range = prompt_line("Range (FROM..TO)")?;
            Ok(parse_range(&range)?)
        }
        _ => pick_files(source),
    }
}

fn pick_files(source: &Repository) -> Result<ExtractMode> {
    let candidates = extract::list_candidates(source, DiffScope::Both)?;
    if candidates.is_empty() {
        return Err(Error::EmptyChangeSet.into());
    }
    println!("Changed files:");
    for (i, path) in candidates.iter().enumerate() {
        println!("  [{}] {}", i + 1, path);
    }
    let indices = prompt_indices("Files to propagate (comma-separated, or 'all')", candidates.len())?;
    Ok(ExtractMode::Manual(indices))
}

fn parse_range(range: &str) -> ripple::Result<ExtractMode> {
    match range.split_once("..") {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok(ExtractMode::Range {
            from: from.to_string(),
            to: to.trim_start_matches('.').to_string(),
        }),
        _ => Err(Error::InvalidSelection(format!(
            "'{}' is not a FROM..TO range",
            range
        ))),
    }
}

fn scope_of(arg: ScopeArg) -> DiffScope {
    match arg {
        ScopeArg::Unstaged => DiffScope::Unstaged,
        ScopeArg::Staged => DiffScope::Staged,
        ScopeArg::Both => DiffScope::Both,
    }
}

fn select_targets(
    repos: &[Repository],
    source: &Repository,
    by_names: Option<&str>,
) -> Result<Vec<Repository>> {
    let candidates: Vec<Repository> =
        repos.iter().filter(|r| r.root != source.root).cloned().collect();
    if candidates.is_empty() {
        return Err(Error::NoTargets.into());
    }

    let targets = if let Some(names) = by_names {
        if names.eq_ignore_ascii_case("all") {
            candidates
        } else {
            let mut picked: Vec<Repository> = Vec::new();
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let found = candidates.iter().find(|r| r.name == name).cloned().ok_or_else(
                    || Error::InvalidSelection(format!("no target named '{}'", name)),
                )?;
                // A name listed twice is still one target.
                if !picked.iter().any(|r| r.root == found.root) {
                    picked.push(found);
                }
            }
            picked
        }
    } else {
        println!("Targets:");
        for (i, repo) in candidates.iter().enumerate() {
            println!("  [{}] {}", i + 1, repo.name);
        }
        let indices = prompt_indices("Target repositories (comma-separated, or 'all')", candidates.len())?;
        indices.into_iter().map(|i| candidates[i].clone()).collect()
    };

    if targets.is_empty() {
        return Err(Error::NoTargets.into());
    }
    Ok(targets)
}

fn propagate_files(
    store: &SessionStore,
    source: &Repository,
    targets: &[Repository],
    mode: &ExtractMode,
    policies: &PolicySet,
    skip_binaries: bool,
    gates: &dyn GatePolicy,
) -> Result<Option<RunReport>> {
    let paths = policies.filter(extract::extract_files(source, mode)?);
    if paths.is_empty() {
        return Err(Error::EmptyChangeSet.into());
    }

    println!("\nFiles to propagate:");
    for path in &paths {
        println!("  {}", path);
    }
    if !confirm(&format!("Propagate {} file(s) to {} target(s)?", paths.len(), targets.len()))? {
        println!("Cancelled.");
        return Ok(None);
    }

    // Dry run across all targets before anything mutates.
    let spinner = SpinnerProgress::new("probing targets");
    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        spinner.set_message(&format!("probing {}", target.name));
        reports.push(probe::probe_files(target, &paths)?);
    }
    spinner.finish();
    show_probe_results(&reports);

    if !confirm("Proceed with apply?")? {
        println!("Cancelled.");
        return Ok(None);
    }

    let mut session = store.open_session()?;
    println!("Session: {}", session.id());

    let mut report = RunReport::new();
    let options = apply::ApplyOptions { skip_binaries };
    'targets: for (target, compat) in targets.iter().zip(&reports) {
        for path in &paths {
            match apply::apply_file(
                &mut session,
                source,
                target,
                path,
                compat.conflict_for(path),
                policies,
                options,
                gates,
            ) {
                Ok(result) => {
                    show_item(&result);
                    report.push(result);
                }
                Err(Error::Aborted) => {
                    println!("Aborted by operator; already-applied items stay applied.");
                    break 'targets;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!("session {} complete", session.id());
    Ok(Some(report))
}

fn propagate_patch(
    store: &SessionStore,
    source: &Repository,
    targets: &[Repository],
    mode: &ExtractMode,
    gates: &dyn GatePolicy,
) -> Result<Option<RunReport>> {
    let blob = extract::extract_patch(source, mode)?;
    println!("\nPatch: {} ({} bytes)", blob.description, blob.bytes.len());
    if !confirm(&format!("Propagate this patch to {} target(s)?", targets.len()))? {
        println!("Cancelled.");
        return Ok(None);
    }

    let spinner = SpinnerProgress::new("probing targets");
    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        spinner.set_message(&format!("probing {}", target.name));
        reports.push(probe::probe_patch(target, &blob)?);
    }
    spinner.finish();
    show_probe_results(&reports);

    if !confirm("Proceed with apply?")? {
        println!("Cancelled.");
        return Ok(None);
    }

    let mut session = store.open_session()?;
    println!("Session: {}", session.id());

    let mut report = RunReport::new();
    for (target, compat) in targets.iter().zip(&reports) {
        match apply::apply_patch(&mut session, target, &blob, compat, gates) {
            Ok(result) => {
                show_item(&result);
                report.push(result);
            }
            Err(Error::Aborted) => {
                println!("Aborted by operator; already-applied targets stay applied.");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("session {} complete", session.id());
    Ok(Some(report))
}

fn show_probe_results(reports: &[CompatibilityReport]) {
    println!("\nDry run:");
    for report in reports {
        let verdict = if report.compatible { "ok" } else { "CONFLICT" };
        println!("  {:<10} {} ({})", verdict, report.repo, report.reason);
        for file in report.files.iter().filter(|f| !f.compatible) {
            println!("             - {}: {}", file.path, file.reason);
        }
    }
}

fn show_item(result: &ItemResult) {
    if result.detail.is_empty() {
        println!("  [{}] {}:{}", result.status, result.repo, result.item);
    } else {
        println!(
            "  [{}] {}:{} ({})",
            result.status, result.repo, result.item, result.detail
        );
    }
}
