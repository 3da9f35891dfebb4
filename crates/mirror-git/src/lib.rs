//! Git transport layer for git-mirror
//!
//! Wraps the clone/fetch/checkout/pull/reset primitives behind a small
//! trait pair so the reconciliation engine depends on verbs, not on git2.

pub mod auth;
pub mod error;
pub mod refs;
pub mod transport;
pub mod urls;

pub use auth::{AuthMethod, AuthSpec, HostKeyPolicy};
pub use error::{Error, FetchOutcome, PullOutcome, Result};
pub use refs::TrackedRef;
pub use transport::{GitTarget, GitTransport, RepoHandle, Transport, install_ca_bundle};
pub use urls::{GitUrl, Scheme};
