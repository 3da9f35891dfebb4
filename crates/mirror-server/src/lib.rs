//! HTTP surface for git-mirror
//!
//! Three routes: a status document, a liveness probe, and a basic-auth
//! gated webhook that forces a sync out of band.

pub mod error;
pub mod middleware;
pub mod server;

pub use error::{Result, ServerError};
pub use server::{ServerConfig, WebhookConfig, build_router, serve};
