//! Error types for mirror-core

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// A failed reconciliation attempt, wrapped with the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to open working copy: {0}")]
    Open(mirror_git::Error),

    #[error("clone failed: {0}")]
    Clone(mirror_git::Error),

    #[error("failed to switch reference: {0}")]
    Switch(mirror_git::Error),

    #[error("fetch failed: {0}")]
    Fetch(mirror_git::Error),

    #[error("failed to resolve tracked reference: {0}")]
    Resolve(mirror_git::Error),

    #[error("pull failed: {0}")]
    Pull(mirror_git::Error),

    #[error("reset failed: {0}")]
    Reset(mirror_git::Error),

    /// Only produced by [`crate::bootstrap`] when deleting a working copy
    /// for the one startup re-clone.
    #[error("failed to delete working copy for re-clone: {0}")]
    Cleanup(std::io::Error),
}
