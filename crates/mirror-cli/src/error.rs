//! CLI error type

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read webhook password file {path}: {source}")]
    WebhookPasswordFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Sync(#[from] mirror_core::SyncError),

    #[error(transparent)]
    Git(#[from] mirror_git::Error),

    #[error(transparent)]
    Server(#[from] mirror_server::ServerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
