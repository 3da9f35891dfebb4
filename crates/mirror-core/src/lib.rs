//! Core reconciliation engine for git-mirror
//!
//! This crate owns the sync state machine and nothing else: given a
//! [`SyncTarget`] and a transport, a [`Syncer`] decides per attempt whether
//! to clone, switch reference, pull, or reset, and keeps the shared
//! [`SyncStatus`] record consistent under one lock.
//!
//! The layering mirrors the rest of the workspace:
//!
//! ```text
//!        mirror-cli / mirror-server
//!                   |
//!              mirror-core
//!                   |
//!              mirror-git
//! ```

pub mod bootstrap;
pub mod error;
pub mod status;
pub mod syncer;
pub mod target;

pub use bootstrap::bootstrap;
pub use error::{Result, SyncError};
pub use status::SyncStatus;
pub use syncer::Syncer;
pub use target::SyncTarget;
