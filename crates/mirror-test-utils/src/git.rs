//! Local "remote" repository fixtures.
//!
//! A [`RemoteRepo`] is a real git repository in a temp directory, used as
//! the clone/fetch source in tests. Realism level: full git object store
//! with commit history, no network.

use std::fs;
use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{Commit, Repository, RepositoryInitOptions};
use tempfile::TempDir;

/// A throwaway upstream repository with a `main` branch and one commit.
///
/// # Panics
/// Every method panics on failure.
pub struct RemoteRepo {
    dir: TempDir,
    repo: Repository,
}

impl RemoteRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("fixture: create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("fixture: init repository");
        {
            let mut config = repo.config().expect("fixture: open config");
            config
                .set_str("user.name", "Fixture")
                .expect("fixture: set user.name");
            config
                .set_str("user.email", "fixture@example.com")
                .expect("fixture: set user.email");
        }
        let remote = Self { dir, repo };
        remote.commit_file("README.md", "fixture remote\n");
        remote
    }

    /// Clone/fetch URL for this remote (a plain filesystem path).
    pub fn url(&self) -> String {
        self.dir.path().to_str().expect("fixture: utf-8 path").to_string()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name`, stage it, and commit on the current
    /// branch. Returns the new commit hash.
    pub fn commit_file(&self, name: &str, contents: &str) -> String {
        let workdir = self.repo.workdir().expect("fixture: workdir");
        fs::write(workdir.join(name), contents).expect("fixture: write file");

        let mut index = self.repo.index().expect("fixture: open index");
        index.add_path(Path::new(name)).expect("fixture: stage file");
        index.write().expect("fixture: write index");
        let tree_id = index.write_tree().expect("fixture: write tree");
        let tree = self.repo.find_tree(tree_id).expect("fixture: find tree");

        let signature = self.repo.signature().expect("fixture: signature");
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .map(|oid| self.repo.find_commit(oid).expect("fixture: find parent"));
        let parents: Vec<&Commit> = parent.iter().collect();

        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                &format!("update {name}"),
                &tree,
                &parents,
            )
            .expect("fixture: commit")
            .to_string()
    }

    /// Create a branch at the current HEAD commit.
    pub fn create_branch(&self, name: &str) {
        let commit = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .expect("fixture: head commit");
        self.repo
            .branch(name, &commit, false)
            .expect("fixture: create branch");
    }

    /// Switch the fixture's checkout so later commits land on `name`.
    pub fn checkout_branch(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .expect("fixture: set head");
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))
            .expect("fixture: checkout");
    }

    /// Lightweight tag at the current HEAD commit.
    pub fn tag(&self, name: &str) {
        let head = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .expect("fixture: head commit");
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .expect("fixture: tag");
    }

    pub fn head_hash(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .expect("fixture: head hash")
            .to_string()
    }
}

impl Default for RemoteRepo {
    fn default() -> Self {
        Self::new()
    }
}
