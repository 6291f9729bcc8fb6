// tests/revert_test.rs

//! Whole-session revert tests: every applied item must return to its
//! pre-apply state, byte-identical for files and tree-identical for patches.

mod common;

use common::{commit_all, git, read_file, rev_parse, write_file, Fixture};
use ripple::apply;
use ripple::{
    extract, probe, revert, Config, ExtractMode, DiffScope, ItemStatus, PolicySet, PresetGate,
    Repository, SessionStore,
};

fn policies() -> PolicySet {
    PolicySet::from_config(&Config::default()).unwrap()
}

#[test]
fn scenario_d_file_session_revert_restores_both_targets() {
    let fixture = Fixture::new();
    let source_root = fixture.init_repo("source");
    write_file(&source_root, "shared.txt", "original\n");
    commit_all(&source_root, "add shared");

    let target1_root = fixture.clone_repo(&source_root, "target1");
    let target2_root = fixture.clone_repo(&source_root, "target2");
    let bystander_root = fixture.clone_repo(&source_root, "bystander");

    let source = Repository::new(source_root.clone());
    let targets = [
        Repository::new(target1_root.clone()),
        Repository::new(target2_root.clone()),
    ];

    write_file(&source_root, "shared.txt", "propagated\n");

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    for target in &targets {
        let result = apply::apply_file(
            &mut session,
            &source,
            target,
            "shared.txt",
            None,
            &policies(),
            apply::ApplyOptions { skip_binaries: true },
            &PresetGate::allow_all(),
        )
        .unwrap();
        assert_eq!(result.status, ItemStatus::Applied);
    }
    let session_id = session.id().to_string();
    assert_eq!(read_file(&target1_root, "shared.txt"), "propagated\n");
    assert_eq!(read_file(&target2_root, "shared.txt"), "propagated\n");

    let report = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    assert_eq!(report.count(ItemStatus::Restored), 2);
    assert_eq!(report.count(ItemStatus::Failed), 0);

    assert_eq!(read_file(&target1_root, "shared.txt"), "original\n");
    assert_eq!(read_file(&target2_root, "shared.txt"), "original\n");
    // An uninvolved sibling is untouched.
    assert_eq!(read_file(&bystander_root, "shared.txt"), "original\n");
}

#[test]
fn working_tree_patch_applies_and_reverts_tree_identical() {
    let fixture = Fixture::new();
    let source_root = fixture.init_repo("source");
    write_file(&source_root, "service.txt", "alpha\nbeta\ngamma\n");
    commit_all(&source_root, "add service");

    let target_root = fixture.clone_repo(&source_root, "target");
    let source = Repository::new(source_root.clone());
    let target = Repository::new(target_root.clone());

    // Uncommitted change in the source working tree.
    write_file(&source_root, "service.txt", "alpha\nbeta fixed\ngamma\n");

    let blob = extract::extract_patch(&source, &ExtractMode::WorkingTree(DiffScope::Both)).unwrap();
    let compat = probe::probe_patch(&target, &blob).unwrap();
    assert!(compat.compatible, "{}", compat.reason);

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    let result =
        apply::apply_patch(&mut session, &target, &blob, &compat, &PresetGate::allow_all())
            .unwrap();
    assert_eq!(result.status, ItemStatus::Applied);
    assert_eq!(read_file(&target_root, "service.txt"), "alpha\nbeta fixed\ngamma\n");

    let session_id = session.id().to_string();
    let report = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    assert_eq!(report.count(ItemStatus::Reverted), 1);

    assert_eq!(read_file(&target_root, "service.txt"), "alpha\nbeta\ngamma\n");
    // Tree-identical: nothing left uncommitted.
    assert_eq!(git(&target_root, &["status", "--porcelain"]).trim(), "");
}

#[test]
fn scenario_c_range_patch_mixed_outcome_and_revert() {
    let fixture = Fixture::new();
    let origin_root = fixture.init_repo("origin");
    write_file(&origin_root, "a.txt", "one\ntwo\nthree\n");
    write_file(&origin_root, "b.txt", "left\nright\n");
    commit_all(&origin_root, "seed a and b");
    let base = rev_parse(&origin_root, "HEAD");

    let source_root = fixture.clone_repo(&origin_root, "source");
    let x_root = fixture.clone_repo(&origin_root, "x");
    let y_root = fixture.clone_repo(&origin_root, "y");

    // Two commits in the source: one per file, so the exported mailbox
    // contains a two-patch series.
    write_file(&source_root, "a.txt", "uno\ntwo\nthree\n");
    commit_all(&source_root, "translate a");
    write_file(&source_root, "b.txt", "left\nright fixed\n");
    commit_all(&source_root, "fix b");
    let head = rev_parse(&source_root, "HEAD");

    // Y has committed a conflicting edit to the same region of a.txt.
    write_file(&y_root, "a.txt", "ein\ntwo\nthree\n");
    commit_all(&y_root, "conflicting local change");

    let source = Repository::new(source_root);
    let x = Repository::new(x_root.clone());
    let y = Repository::new(y_root.clone());

    let blob = extract::extract_patch(
        &source,
        &ExtractMode::Range { from: base.clone(), to: head },
    )
    .unwrap();

    let x_compat = probe::probe_patch(&x, &blob).unwrap();
    let y_compat = probe::probe_patch(&y, &blob).unwrap();
    assert!(x_compat.compatible, "{}", x_compat.reason);
    assert!(!y_compat.compatible);

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    let gates = PresetGate::allow_all();

    let x_result = apply::apply_patch(&mut session, &x, &blob, &x_compat, &gates).unwrap();
    assert_eq!(x_result.status, ItemStatus::Applied);
    assert_eq!(read_file(&x_root, "a.txt"), "uno\ntwo\nthree\n");
    assert_eq!(read_file(&x_root, "b.txt"), "left\nright fixed\n");

    // Overriding the dry run on Y still fails, and the failed replay is
    // unwound: no tree mutation survives.
    let y_result = apply::apply_patch(&mut session, &y, &blob, &y_compat, &gates).unwrap();
    assert_eq!(y_result.status, ItemStatus::Failed);
    assert_eq!(read_file(&y_root, "a.txt"), "ein\ntwo\nthree\n");
    assert_eq!(git(&y_root, &["status", "--porcelain"]).trim(), "");

    // Both attempts recorded a pre-state backup before touching anything.
    let manifest = store.load(session.id()).unwrap();
    assert_eq!(manifest.records.len(), 2);

    let session_id = session.id().to_string();
    let report = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    assert_eq!(report.count(ItemStatus::Failed), 0);

    // X is back on its pre-apply commit with a clean tree.
    assert_eq!(rev_parse(&x_root, "HEAD"), base);
    assert_eq!(read_file(&x_root, "a.txt"), "one\ntwo\nthree\n");
    assert_eq!(read_file(&x_root, "b.txt"), "left\nright\n");
    assert_eq!(git(&x_root, &["status", "--porcelain"]).trim(), "");
}

#[test]
fn mailbox_revert_restores_uncommitted_divergence() {
    let fixture = Fixture::new();
    let origin_root = fixture.init_repo("origin");
    write_file(&origin_root, "a.txt", "one\ntwo\n");
    write_file(&origin_root, "notes.txt", "keep me\n");
    commit_all(&origin_root, "seed");

    let source_root = fixture.clone_repo(&origin_root, "source");
    let target_root = fixture.clone_repo(&origin_root, "target");

    write_file(&source_root, "a.txt", "one\ntwo\nthree\n");
    commit_all(&source_root, "extend a");
    let head = rev_parse(&source_root, "HEAD");
    let base = rev_parse(&origin_root, "HEAD");

    // Uncommitted local divergence in the target that the revert must
    // re-establish after resetting the replayed commits away.
    write_file(&target_root, "notes.txt", "keep me\nlocal addition\n");

    let source = Repository::new(source_root);
    let target = Repository::new(target_root.clone());

    let blob = extract::extract_patch(
        &source,
        &ExtractMode::Range { from: base.clone(), to: head },
    )
    .unwrap();
    let compat = probe::probe_patch(&target, &blob).unwrap();
    assert!(compat.compatible, "{}", compat.reason);

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    let result =
        apply::apply_patch(&mut session, &target, &blob, &compat, &PresetGate::allow_all())
            .unwrap();
    assert_eq!(result.status, ItemStatus::Applied);

    let session_id = session.id().to_string();
    let report = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    assert_eq!(report.count(ItemStatus::Reverted), 1);

    assert_eq!(rev_parse(&target_root, "HEAD"), base);
    assert_eq!(read_file(&target_root, "a.txt"), "one\ntwo\n");
    assert_eq!(read_file(&target_root, "notes.txt"), "keep me\nlocal addition\n");
}

#[test]
fn repeat_apply_to_one_target_keeps_the_first_pre_state() {
    let fixture = Fixture::new();
    let origin_root = fixture.init_repo("origin");
    write_file(&origin_root, "a.txt", "one\ntwo\n");
    write_file(&origin_root, "notes.txt", "keep me\n");
    commit_all(&origin_root, "seed");
    let base = rev_parse(&origin_root, "HEAD");

    let source_root = fixture.clone_repo(&origin_root, "source");
    let target_root = fixture.clone_repo(&origin_root, "target");

    write_file(&source_root, "a.txt", "one\ntwo\nthree\n");
    commit_all(&source_root, "extend a");
    let head = rev_parse(&source_root, "HEAD");

    write_file(&target_root, "notes.txt", "keep me\nlocal addition\n");

    let source = Repository::new(source_root);
    let target = Repository::new(target_root.clone());
    let blob = extract::extract_patch(
        &source,
        &ExtractMode::Range { from: base.clone(), to: head },
    )
    .unwrap();
    let compat = probe::probe_patch(&target, &blob).unwrap();

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    let gates = PresetGate::allow_all();

    let first = apply::apply_patch(&mut session, &target, &blob, &compat, &gates).unwrap();
    assert_eq!(first.status, ItemStatus::Applied);

    // Applying the same blob to the same target again must not clobber the
    // recorded pre-state; the session keeps exactly one record per target.
    let _ = apply::apply_patch(&mut session, &target, &blob, &compat, &gates).unwrap();
    let manifest = store.load(session.id()).unwrap();
    assert_eq!(manifest.records.len(), 1);
    match &manifest.records[0] {
        ripple::BackupRecord::RepoPatch { head_before, prestate_file, .. } => {
            assert_eq!(head_before, &base);
            let file = prestate_file.as_ref().unwrap();
            let prestate =
                String::from_utf8(std::fs::read(session.dir().join(file)).unwrap()).unwrap();
            assert!(prestate.contains("local addition"));
        }
        other => panic!("unexpected record: {:?}", other),
    }

    // Revert unwinds to the true pre-session state.
    let session_id = session.id().to_string();
    let report = revert::revert_session(&store, &session_id, &gates).unwrap();
    assert_eq!(report.count(ItemStatus::Failed), 0);
    assert_eq!(rev_parse(&target_root, "HEAD"), base);
    assert_eq!(read_file(&target_root, "a.txt"), "one\ntwo\n");
    assert_eq!(read_file(&target_root, "notes.txt"), "keep me\nlocal addition\n");
}

#[test]
fn reverting_an_unknown_session_is_an_error() {
    let fixture = Fixture::new();
    let store = SessionStore::new(fixture.data_root.path());
    assert!(revert::revert_session(&store, "19700101-000000", &PresetGate::allow_all()).is_err());
}

#[test]
fn revert_is_safe_to_rerun() {
    let fixture = Fixture::new();
    let source_root = fixture.init_repo("source");
    write_file(&source_root, "f.txt", "old\n");
    commit_all(&source_root, "add f");

    let target_root = fixture.clone_repo(&source_root, "target");
    let source = Repository::new(source_root.clone());
    let target = Repository::new(target_root.clone());
    write_file(&source_root, "f.txt", "new\n");

    let store = SessionStore::new(fixture.data_root.path());
    let mut session = store.open_session().unwrap();
    apply::apply_file(
        &mut session,
        &source,
        &target,
        "f.txt",
        None,
        &policies(),
        apply::ApplyOptions { skip_binaries: true },
        &PresetGate::allow_all(),
    )
    .unwrap();
    let session_id = session.id().to_string();

    let first = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    let second = revert::revert_session(&store, &session_id, &PresetGate::allow_all()).unwrap();
    assert_eq!(first.count(ItemStatus::Restored), 1);
    assert_eq!(second.count(ItemStatus::Restored), 1);
    assert_eq!(read_file(&target_root, "f.txt"), "old\n");
}
