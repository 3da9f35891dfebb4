//! End-to-end reconciliation against real on-disk repositories

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use mirror_core::{SyncTarget, Syncer};
use mirror_git::{AuthSpec, GitTransport, TrackedRef};
use mirror_test_utils::RemoteRepo;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn syncer_for(remote: &RemoteRepo, workdir: &Path, tracked: &str) -> Syncer {
    let target = SyncTarget {
        repo_url: remote.url(),
        path: workdir.join("checkout"),
        tracked_ref: TrackedRef::parse(tracked),
        ca_bundle: None,
        poll_interval: Duration::from_secs(900),
        auth: AuthSpec::default(),
    };
    let transport = GitTransport::new(target.git_target());
    Syncer::new(target, Box::new(transport))
}

#[test]
fn first_sync_clones_and_later_syncs_do_not() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    let syncer = syncer_for(&remote, dir.path(), "main");

    syncer.reconcile(false).unwrap();
    let first = syncer.status();
    assert!(first.cloned);
    assert_eq!(first.latest_commit.as_deref(), Some(remote.head_hash().as_str()));
    assert!(first.last_updated.is_some());
    assert!(checkout.join("README.md").exists());

    // an untracked marker survives a non-cloning reconcile
    fs::write(checkout.join(".marker"), "still here\n").unwrap();
    thread::sleep(Duration::from_millis(5));
    syncer.reconcile(false).unwrap();
    let second = syncer.status();
    assert!(!second.cloned);
    assert_eq!(second.latest_commit, first.latest_commit);
    assert_eq!(second.last_updated, first.last_updated);
    assert!(second.last_checked > first.last_checked);
    assert!(checkout.join(".marker").exists(), "working copy was re-created");
}

#[test]
fn remote_advances_are_pulled() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    let syncer = syncer_for(&remote, dir.path(), "main");

    syncer.reconcile(false).unwrap();
    let before = syncer.status();

    thread::sleep(Duration::from_millis(5));
    let advanced = remote.commit_file("data.txt", "v2\n");
    syncer.reconcile(false).unwrap();

    let after = syncer.status();
    assert_eq!(after.latest_commit.as_deref(), Some(advanced.as_str()));
    assert!(after.last_updated > before.last_updated);
    assert_eq!(fs::read_to_string(checkout.join("data.txt")).unwrap(), "v2\n");
}

#[test]
fn steady_state_is_idempotent() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let syncer = syncer_for(&remote, dir.path(), "main");

    syncer.reconcile(false).unwrap();
    let settled = syncer.status();

    let mut last_checked = settled.last_checked;
    for _ in 0..3 {
        thread::sleep(Duration::from_millis(5));
        syncer.reconcile(false).unwrap();
        let status = syncer.status();
        assert_eq!(status.latest_commit, settled.latest_commit);
        assert_eq!(status.last_updated, settled.last_updated);
        assert!(status.last_checked > last_checked);
        last_checked = status.last_checked;
    }
}

#[test]
fn forced_sync_restores_a_dirty_working_copy_without_moving_status() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    let syncer = syncer_for(&remote, dir.path(), "main");

    syncer.reconcile(false).unwrap();
    let before = syncer.status();

    fs::write(checkout.join("README.md"), "local damage\n").unwrap();
    syncer.reconcile(true).unwrap();

    assert_eq!(
        fs::read_to_string(checkout.join("README.md")).unwrap(),
        "fixture remote\n"
    );
    let after = syncer.status();
    assert_eq!(after.latest_commit, before.latest_commit);
    assert_eq!(after.last_updated, before.last_updated);
}

#[test]
fn routine_sync_repairs_a_partially_applied_checkout() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    let syncer = syncer_for(&remote, dir.path(), "main");

    syncer.reconcile(false).unwrap();

    // a crash between recording the hash and finishing the checkout
    // leaves tracked files missing; the reaffirming reset restores them
    fs::remove_file(checkout.join("README.md")).unwrap();
    syncer.reconcile(false).unwrap();
    assert!(checkout.join("README.md").exists());
}

#[test]
fn switching_the_tracked_reference_checks_out_and_prunes() {
    let remote = RemoteRepo::new();
    remote.create_branch("release");
    remote.checkout_branch("release");
    let release_head = remote.commit_file("release.txt", "release work\n");
    remote.checkout_branch("main");

    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");

    let main_syncer = syncer_for(&remote, dir.path(), "main");
    main_syncer.reconcile(false).unwrap();
    assert!(!checkout.join("release.txt").exists());

    // the process restarts tracking the release branch over the same copy
    let release_syncer = syncer_for(&remote, dir.path(), "release");
    release_syncer.reconcile(false).unwrap();

    let status = release_syncer.status();
    assert_eq!(status.latest_commit.as_deref(), Some(release_head.as_str()));
    assert!(checkout.join("release.txt").exists());

    let repo = git2::Repository::open(&checkout).unwrap();
    let locals: Vec<String> = repo
        .branches(Some(git2::BranchType::Local))
        .unwrap()
        .map(|b| b.unwrap().0.name().unwrap().unwrap().to_string())
        .collect();
    assert_eq!(locals, vec!["release".to_string()], "stale branches must be pruned");

    // later syncs keep following the new reference
    thread::sleep(Duration::from_millis(5));
    remote.checkout_branch("release");
    let advanced = remote.commit_file("release.txt", "more release work\n");
    remote.checkout_branch("main");
    release_syncer.reconcile(false).unwrap();
    assert_eq!(
        release_syncer.status().latest_commit.as_deref(),
        Some(advanced.as_str())
    );
}

#[test]
fn a_tracked_tag_stays_pinned_while_branches_move() {
    let remote = RemoteRepo::new();
    remote.tag("v1.0.0");
    let tagged = remote.head_hash();
    remote.commit_file("data.txt", "after the tag\n");

    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");
    let syncer = syncer_for(&remote, dir.path(), "refs/tags/v1.0.0");

    syncer.reconcile(false).unwrap();
    assert_eq!(syncer.status().latest_commit.as_deref(), Some(tagged.as_str()));
    assert!(!checkout.join("data.txt").exists());

    remote.commit_file("data.txt", "still after the tag\n");
    syncer.reconcile(false).unwrap();
    assert_eq!(syncer.status().latest_commit.as_deref(), Some(tagged.as_str()));
    assert!(!checkout.join("data.txt").exists());
}
