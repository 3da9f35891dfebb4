//! Transport adapter over git2
//!
//! The [`Transport`] / [`RepoHandle`] trait pair is the seam between the
//! reconciliation engine and the VCS library: the engine sequences verbs,
//! this module owns how each verb is performed. Auth is resolved freshly
//! for every network operation (see [`crate::auth`]).

use std::cell::Cell;
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AutotagOption, BranchType, Cred, ErrorCode, FetchOptions, FetchPrune, Oid, RemoteCallbacks,
    Repository,
    cert::Cert,
};

use crate::auth::{self, AuthMethod, AuthSpec, HostKeyPolicy};
use crate::error::{Error, FetchOutcome, PullOutcome, Result};
use crate::refs::TrackedRef;
use crate::urls;

/// Everything the git2 backend needs to know about one sync target.
#[derive(Debug, Clone)]
pub struct GitTarget {
    pub url: String,
    pub path: PathBuf,
    pub tracked_ref: TrackedRef,
    pub auth: AuthSpec,
}

/// Opens or creates local working copies for one target.
pub trait Transport: Send + Sync {
    /// Open the existing working copy. [`Error::NotFound`] when none exists.
    fn open(&self) -> Result<Box<dyn RepoHandle>>;

    /// Clone the remote at the tracked reference.
    fn clone_repo(&self) -> Result<Box<dyn RepoHandle>>;
}

/// Verbs on an opened working copy.
pub trait RepoHandle {
    /// Full name of the currently checked-out reference, or `HEAD` when
    /// detached.
    fn head_ref(&self) -> Result<String>;

    /// Fetch all remote branch heads and tags, pruning stale
    /// remote-tracking refs.
    fn fetch(&self) -> Result<FetchOutcome>;

    /// Commit hash the remote currently has for a short ref name.
    fn resolve_remote_ref(&self, short_name: &str) -> Result<String>;

    /// Forced checkout of a reference from its last-fetched remote
    /// position, discarding local modifications.
    fn checkout(&self, refname: &str) -> Result<()>;

    /// Delete every local branch except `keep`; returns the pruned names.
    fn prune_local_branches(&self, keep: &str) -> Result<Vec<String>>;

    /// Force-align the checkout to the tracked reference's remote
    /// position. `UpToDate` still rewrites the working tree, so a
    /// partially applied previous checkout is repaired.
    fn pull(&self) -> Result<PullOutcome>;

    /// `git reset --hard` to an exact commit.
    fn hard_reset(&self, commit: &str) -> Result<()>;
}

/// git2-backed transport.
pub struct GitTransport {
    target: GitTarget,
}

impl GitTransport {
    pub fn new(target: GitTarget) -> Self {
        Self { target }
    }
}

impl Transport for GitTransport {
    fn open(&self) -> Result<Box<dyn RepoHandle>> {
        let repo = Repository::open(&self.target.path).map_err(|err| {
            if err.code() == ErrorCode::NotFound {
                Error::NotFound {
                    path: self.target.path.clone(),
                }
            } else {
                Error::Transport(err)
            }
        })?;
        Ok(Box::new(GitRepo {
            repo,
            target: self.target.clone(),
        }))
    }

    fn clone_repo(&self) -> Result<Box<dyn RepoHandle>> {
        let method = auth::resolve(&self.target.auth, &urls::parse(&self.target.url))?;
        let mut options = FetchOptions::new();
        options.remote_callbacks(remote_callbacks(&method, self.target.auth.insecure_tls));
        options.download_tags(AutotagOption::All);

        let mut builder = RepoBuilder::new();
        builder.fetch_options(options);
        if self.target.tracked_ref.is_branch() {
            // single-branch clone: the remote is created with a refspec
            // narrowed to the tracked branch
            let full = self.target.tracked_ref.full_name().to_string();
            let short = self.target.tracked_ref.short_name().to_string();
            builder.branch(&short);
            builder.remote_create(move |repo, name, url| {
                let refspec = format!("+{full}:refs/remotes/origin/{short}");
                repo.remote_with_fetch(name, url, &refspec)
            });
        }
        let repo = builder.clone(&self.target.url, &self.target.path)?;

        let handle = GitRepo {
            repo,
            target: self.target.clone(),
        };
        if !self.target.tracked_ref.is_branch() {
            // tags and raw refs are not clone targets; align after the fact
            handle.fetch()?;
            handle.checkout(self.target.tracked_ref.full_name())?;
        }
        Ok(Box::new(handle))
    }
}

struct GitRepo {
    repo: Repository,
    target: GitTarget,
}

impl GitRepo {
    fn remote_oid(&self, tracked: &TrackedRef) -> Result<Oid> {
        let short = tracked.short_name();
        let candidates = [
            format!("refs/remotes/origin/{short}"),
            format!("refs/tags/{short}"),
        ];
        for name in &candidates {
            match self.repo.find_reference(name) {
                Ok(reference) => return Ok(reference.peel_to_commit()?.id()),
                Err(err) if err.code() == ErrorCode::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::RefNotFound {
            refname: candidates[0].clone(),
        })
    }

    fn force_checkout(&self) -> Result<()> {
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }

    /// Move the checkout to `tracked`'s remote position. Shared by
    /// `checkout` (reference switches) and `pull` (routine updates).
    fn align(&self, tracked: &TrackedRef) -> Result<PullOutcome> {
        let oid = self.remote_oid(tracked)?;

        if tracked.is_branch() {
            let current = self
                .repo
                .find_reference(tracked.full_name())
                .ok()
                .and_then(|r| r.target());
            if current == Some(oid) && self.head_ref()? == tracked.full_name() {
                self.force_checkout()?;
                return Ok(PullOutcome::UpToDate);
            }

            let log_message = format!("mirror: update {} to {}", tracked.short_name(), oid);
            match self.repo.find_reference(tracked.full_name()) {
                Ok(mut reference) => {
                    reference.set_target(oid, &log_message)?;
                }
                Err(err) if err.code() == ErrorCode::NotFound => {
                    self.repo
                        .reference(tracked.full_name(), oid, true, &log_message)?;
                }
                Err(err) => return Err(err.into()),
            }
            self.repo.set_head(tracked.full_name())?;
            self.force_checkout()?;
            return Ok(PullOutcome::Updated);
        }

        // tags and raw refs check out detached
        let head = self.repo.head().ok().and_then(|h| h.target());
        if head == Some(oid) {
            self.force_checkout()?;
            return Ok(PullOutcome::UpToDate);
        }
        self.repo.set_head_detached(oid)?;
        self.force_checkout()?;
        Ok(PullOutcome::Updated)
    }
}

impl RepoHandle for GitRepo {
    fn head_ref(&self) -> Result<String> {
        let head = self.repo.find_reference("HEAD")?;
        Ok(match head.symbolic_target() {
            Some(target) => target.to_string(),
            None => "HEAD".to_string(),
        })
    }

    fn fetch(&self) -> Result<FetchOutcome> {
        let method = auth::resolve(&self.target.auth, &urls::parse(&self.target.url))?;
        let tips_moved = Cell::new(false);

        let mut callbacks = remote_callbacks(&method, self.target.auth.insecure_tls);
        callbacks.update_tips(|refname, old, new| {
            if old != new {
                tracing::trace!(refname, %old, %new, "remote-tracking ref moved");
                tips_moved.set(true);
            }
            true
        });

        let mut options = FetchOptions::new();
        options
            .remote_callbacks(callbacks)
            .prune(FetchPrune::On)
            .download_tags(AutotagOption::All);

        let mut remote = self.repo.find_remote("origin")?;
        remote.fetch(
            &["+refs/heads/*:refs/remotes/origin/*"],
            Some(&mut options),
            None,
        )?;

        Ok(if tips_moved.get() {
            FetchOutcome::Updated
        } else {
            FetchOutcome::UpToDate
        })
    }

    fn resolve_remote_ref(&self, short_name: &str) -> Result<String> {
        self.remote_oid(&TrackedRef::branch(short_name))
            .map(|oid| oid.to_string())
    }

    fn checkout(&self, refname: &str) -> Result<()> {
        self.align(&TrackedRef::parse(refname)).map(|_| ())
    }

    fn prune_local_branches(&self, keep: &str) -> Result<Vec<String>> {
        let mut pruned = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (mut branch, _) = entry?;
            let name = match branch.name()? {
                Some(name) if name != keep => name.to_string(),
                _ => continue,
            };
            branch.delete()?;
            pruned.push(name);
        }
        Ok(pruned)
    }

    fn pull(&self) -> Result<PullOutcome> {
        self.align(&self.target.tracked_ref)
    }

    fn hard_reset(&self, commit: &str) -> Result<()> {
        let oid = Oid::from_str(commit)?;
        let object = self.repo.find_object(oid, None)?;
        self.repo.reset(&object, git2::ResetType::Hard, None)?;
        Ok(())
    }
}

/// Install a CA bundle for all subsequent HTTPS operations.
///
/// libgit2 only supports process-global certificate locations, so this is
/// called once at startup rather than per operation.
pub fn install_ca_bundle(path: &Path) -> Result<()> {
    std::fs::metadata(path).map_err(|source| Error::CredentialRead {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "using ca bundle");
    unsafe { git2::opts::set_ssl_cert_file(path.to_path_buf()) }?;
    Ok(())
}

fn remote_callbacks(method: &AuthMethod, insecure_tls: bool) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |_url, username_from_url, _allowed| match method {
        AuthMethod::SshKey {
            username,
            private_key,
            ..
        } => {
            let username = username
                .as_deref()
                .or(username_from_url)
                .unwrap_or("git");
            Cred::ssh_key_from_memory(username, None, private_key, None)
        }
        AuthMethod::SshPassword { username, password, .. } => {
            let username = if username.is_empty() {
                username_from_url.unwrap_or("git")
            } else {
                username.as_str()
            };
            Cred::userpass_plaintext(username, password)
        }
        AuthMethod::Basic { username, password } => Cred::userpass_plaintext(username, password),
        AuthMethod::Anonymous => Cred::default(),
    });

    let host_key_policy = method.host_key_policy();
    callbacks.certificate_check(move |cert: &Cert<'_>, hostname: &str| {
        if insecure_tls {
            return Ok(git2::CertificateCheckStatus::CertificateOk);
        }
        if let Some(hostkey) = cert.as_hostkey() {
            return match host_key_policy {
                Some(HostKeyPolicy::KnownHosts(known)) => {
                    if known.verify(hostname, hostkey.hostkey()) {
                        Ok(git2::CertificateCheckStatus::CertificateOk)
                    } else {
                        Err(git2::Error::from_str(&format!(
                            "host key verification failed for {hostname}"
                        )))
                    }
                }
                // no known-hosts file configured; warned at resolution time
                Some(HostKeyPolicy::AcceptAll) | None => {
                    Ok(git2::CertificateCheckStatus::CertificateOk)
                }
            };
        }
        Ok(git2::CertificateCheckStatus::CertificatePassthrough)
    });

    callbacks
}
