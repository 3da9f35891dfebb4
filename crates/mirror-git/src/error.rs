//! Error types for mirror-git

use std::path::PathBuf;

/// Result type for mirror-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No repository exists at the working copy path. Expected on first
    /// run; the engine answers it with a clone.
    #[error("repository not found at {path}")]
    NotFound { path: PathBuf },

    /// The tracked reference does not exist on the remote after a fetch.
    #[error("reference not found: {refname}")]
    RefNotFound { refname: String },

    /// A referenced key, password, or known-hosts file could not be read.
    #[error("failed to read credential file {path}: {source}")]
    CredentialRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The auth configuration cannot produce a usable method for the remote.
    #[error("invalid auth configuration: {message}")]
    AuthConfig { message: String },

    /// Network or protocol failure from the underlying git library.
    #[error("transport error: {0}")]
    Transport(#[from] git2::Error),

    /// Local I/O failure outside of git itself.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

/// Result of a fetch. Up-to-date is the steady state, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// At least one remote-tracking ref moved.
    Updated,
    /// Nothing changed on the remote.
    UpToDate,
}

/// Result of a pull. Up-to-date means the checked-out commit did not move;
/// the working tree is still forced back into shape either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The checkout moved to a new commit.
    Updated,
    /// The checkout was already at the target commit.
    UpToDate,
}
