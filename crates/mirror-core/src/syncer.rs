//! The reconciliation engine and its poll scheduler
//!
//! One [`Syncer`] per tracked repository. Reconciliation is fully
//! serialized: the engine holds a single lock for the entire attempt,
//! network operations included, and the status accessor shares that lock.
//! A slow fetch therefore blocks the next tick, concurrent forced syncs,
//! and status reads until it finishes; simplicity and a consistent
//! status record are deliberately preferred over responsiveness here.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use mirror_git::{FetchOutcome, PullOutcome, Transport};

use crate::error::{Result, SyncError};
use crate::status::SyncStatus;
use crate::target::SyncTarget;

pub struct Syncer {
    shared: Arc<Shared>,
    poll: Mutex<Option<PollTask>>,
}

/// The engine state the poll task shares with direct callers.
struct Shared {
    target: SyncTarget,
    inner: Mutex<Inner>,
}

/// Everything the reconciliation lock protects: the transport (and with
/// it the working copy) and the status record.
struct Inner {
    transport: Box<dyn Transport>,
    status: SyncStatus,
}

struct PollTask {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Syncer {
    pub fn new(target: SyncTarget, transport: Box<dyn Transport>) -> Self {
        Self {
            shared: Arc::new(Shared {
                target,
                inner: Mutex::new(Inner {
                    transport,
                    status: SyncStatus::default(),
                }),
            }),
            poll: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &SyncTarget {
        &self.shared.target
    }

    /// Snapshot of the status record. Blocks while a reconciliation is in
    /// flight.
    pub fn status(&self) -> SyncStatus {
        self.shared.status()
    }

    /// Run one reconciliation attempt.
    ///
    /// Only one attempt runs at a time; a concurrent caller blocks here
    /// until the prior one finishes. `force` pulls even when the remote
    /// commit matches the recorded one.
    pub fn reconcile(&self, force: bool) -> Result<()> {
        self.shared.reconcile(force)
    }

    /// Start the periodic poll loop. No-op while a loop is already
    /// running. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut poll = self.poll.lock().expect("poll task lock poisoned");
        if let Some(task) = poll.as_ref()
            && !task.task.is_finished()
        {
            return;
        }

        let (shutdown, mut signal) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let interval = self.shared.target.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately; the caller already
            // synced at startup, so swallow it
            ticker.tick().await;
            tracing::info!(repo = %shared.target.repo_url, "started polling");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let worker = Arc::clone(&shared);
                        match tokio::task::spawn_blocking(move || worker.reconcile(false)).await {
                            Ok(Ok(())) => {}
                            Ok(Err(err)) => {
                                tracing::error!(repo = %shared.target.repo_url, error = %err, "scheduled sync failed");
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "sync task aborted");
                            }
                        }
                    }
                    _ = signal.changed() => {
                        tracing::info!(repo = %shared.target.repo_url, "stopped polling");
                        break;
                    }
                }
            }
        });

        *poll = Some(PollTask { shutdown, task });
    }

    /// Stop the poll loop. The loop observes the signal between ticks; an
    /// in-flight reconciliation is never interrupted.
    pub fn stop(&self) {
        let mut poll = self.poll.lock().expect("poll task lock poisoned");
        if let Some(task) = poll.take() {
            let _ = task.shutdown.send(true);
        }
    }
}

impl Shared {
    fn status(&self) -> SyncStatus {
        self.lock_inner().status.clone()
    }

    fn reconcile(&self, force: bool) -> Result<()> {
        let mut inner = self.lock_inner();
        let Inner { transport, status } = &mut *inner;
        let tracked = &self.target.tracked_ref;

        // recorded unconditionally so "alive and attempting" is
        // observable even when every attempt fails
        status.last_checked = Some(Utc::now());

        tracing::debug!(path = %self.target.path.display(), "looking for local working copy");
        let (repo, cloned) = match transport.open() {
            Ok(repo) => (repo, false),
            Err(mirror_git::Error::NotFound { .. }) => {
                tracing::info!(repo = %self.target.repo_url, "working copy missing, cloning");
                let repo = transport.clone_repo().map_err(SyncError::Clone)?;
                tracing::info!("clone completed");
                (repo, true)
            }
            Err(err) => return Err(SyncError::Open(err)),
        };
        status.cloned = cloned;

        if !cloned {
            let head = repo.head_ref().map_err(SyncError::Switch)?;
            if head != tracked.full_name() {
                tracing::info!(from = %head, to = %tracked, "switching tracked reference");
                repo.fetch().map_err(SyncError::Switch)?;
                repo.checkout(tracked.full_name()).map_err(SyncError::Switch)?;
                let pruned = repo
                    .prune_local_branches(tracked.short_name())
                    .map_err(SyncError::Switch)?;
                if !pruned.is_empty() {
                    tracing::info!(branches = ?pruned, "pruned stale local branches");
                }
            }
        }

        match repo.fetch().map_err(SyncError::Fetch)? {
            FetchOutcome::Updated => tracing::debug!("fetched remote updates"),
            FetchOutcome::UpToDate => tracing::debug!("remote already up to date"),
        }

        let hash = repo
            .resolve_remote_ref(tracked.short_name())
            .map_err(SyncError::Resolve)?;

        if force || status.latest_commit.as_deref() != Some(hash.as_str()) {
            tracing::info!(commit = %hash, "updating working copy");
            let outcome = repo.pull().map_err(SyncError::Pull)?;
            status.latest_commit = Some(hash);
            if cloned || outcome == PullOutcome::Updated {
                status.last_updated = Some(Utc::now());
            }
        } else {
            // the commit is unchanged, but a previous attempt may have
            // died between recording the hash and finishing the checkout
            tracing::debug!(commit = %hash, "no changes, reaffirming working copy");
            repo.hard_reset(&hash).map_err(SyncError::Reset)?;
        }

        Ok(())
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("syncer state lock poisoned")
    }
}
