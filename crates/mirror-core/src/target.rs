//! Per-process sync configuration

use std::path::PathBuf;
use std::time::Duration;

use mirror_git::{AuthSpec, GitTarget, TrackedRef};

/// Immutable configuration for the one repository this process mirrors.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub repo_url: String,
    pub path: PathBuf,
    pub tracked_ref: TrackedRef,
    pub ca_bundle: Option<PathBuf>,
    pub poll_interval: Duration,
    pub auth: AuthSpec,
}

impl SyncTarget {
    /// The subset of this configuration the git transport needs.
    pub fn git_target(&self) -> GitTarget {
        GitTarget {
            url: self.repo_url.clone(),
            path: self.path.clone(),
            tracked_ref: self.tracked_ref.clone(),
            auth: self.auth.clone(),
        }
    }
}
