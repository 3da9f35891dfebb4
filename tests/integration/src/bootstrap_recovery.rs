//! Startup nuke-and-retry policy tests

use std::fs;
use std::path::Path;
use std::time::Duration;

use mirror_core::{SyncTarget, Syncer, bootstrap};
use mirror_git::{AuthSpec, GitTransport, TrackedRef};
use mirror_test_utils::RemoteRepo;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn syncer_for(url: String, workdir: &Path) -> Syncer {
    let target = SyncTarget {
        repo_url: url,
        path: workdir.join("checkout"),
        tracked_ref: TrackedRef::branch("main"),
        ca_bundle: None,
        poll_interval: Duration::from_secs(900),
        auth: AuthSpec::default(),
    };
    let transport = GitTransport::new(target.git_target());
    Syncer::new(target, Box::new(transport))
}

#[test]
fn bootstrap_is_a_plain_sync_when_nothing_is_broken() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let syncer = syncer_for(remote.url(), dir.path());

    bootstrap(&syncer).unwrap();
    let status = syncer.status();
    assert!(status.cloned);
    assert_eq!(status.latest_commit.as_deref(), Some(remote.head_hash().as_str()));
}

#[test]
fn bootstrap_deletes_an_unusable_working_copy_and_reclones() {
    let remote = RemoteRepo::new();
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");

    // leftovers from a crashed earlier process: a directory that is not a
    // repository, with content that blocks a clean clone
    fs::create_dir_all(&checkout).unwrap();
    fs::write(checkout.join("debris.txt"), "partial extract\n").unwrap();
    fs::write(checkout.join(".git"), "gitdir: /nonexistent\n").unwrap();

    let syncer = syncer_for(remote.url(), dir.path());
    bootstrap(&syncer).unwrap();

    assert!(checkout.join("README.md").exists());
    assert!(!checkout.join("debris.txt").exists(), "debris must be wiped");
    assert!(syncer.status().cloned);
}

#[test]
fn bootstrap_surfaces_a_persistent_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-remote");
    let syncer = syncer_for(missing.to_str().unwrap().to_string(), dir.path());

    let err = bootstrap(&syncer).unwrap_err();
    assert!(
        err.to_string().starts_with("clone failed"),
        "unexpected error: {err}"
    );
}
