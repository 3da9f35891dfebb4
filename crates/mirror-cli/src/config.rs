//! Flag and environment configuration using clap derive
//!
//! Every flag has an environment fallback so the sidecar configures the
//! same way from a shell, a container spec, or a systemd unit.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use mirror_core::SyncTarget;
use mirror_git::{AuthSpec, TrackedRef};
use mirror_server::{ServerConfig, WebhookConfig};

use crate::error::{Error, Result};

/// Keep a local checkout of a git repository synchronized with a tracked
/// reference, with HTTP endpoints for status and on-demand resync.
#[derive(Parser, Debug)]
#[command(name = "git-mirror", version, about)]
pub struct Config {
    /// Git repository URL
    #[arg(long, env = "GIT_REPO")]
    pub repo: String,

    /// Local working copy path
    #[arg(long, env = "TARGET_PATH")]
    pub path: PathBuf,

    /// Branch to track; --ref takes precedence over this
    #[arg(long, env = "BRANCH", default_value = "main")]
    pub branch: String,

    /// Reference to track, in refs/heads/main or refs/tags/v1.0.0 format
    #[arg(long = "ref", env = "REF_NAME")]
    pub refname: Option<String>,

    /// CA certificate bundle file path
    #[arg(long, env = "CA_BUNDLE")]
    pub ca_bundle_file: Option<PathBuf>,

    /// Polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 900)]
    pub interval: u64,

    /// Git username or token
    #[arg(long, env = "GIT_USERNAME")]
    pub username: Option<String>,

    /// Git password or token
    #[arg(long, env = "GIT_PASSWORD")]
    pub password: Option<String>,

    /// Path to a file containing the git password or token
    #[arg(long, env = "GIT_PASSWORD_FILE")]
    pub password_file: Option<PathBuf>,

    /// Path to a file containing the git SSH private key
    #[arg(long, env = "GIT_SSHKEY_FILE")]
    pub ssh_key_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(
        long,
        env = "INSECURE_TLS",
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub insecure: bool,

    /// Path to a known-hosts file for SSH host key verification
    #[arg(long, env = "KNOWN_HOSTS_FILE")]
    pub known_hosts_file: Option<PathBuf>,

    /// Enable the webhook API
    #[arg(
        long,
        env = "WEBHOOK_ENABLED",
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub webhook_enabled: bool,

    /// Webhook basic auth user
    #[arg(long, env = "WEBHOOK_USERNAME")]
    pub webhook_username: Option<String>,

    /// Webhook basic auth password
    #[arg(long, env = "WEBHOOK_PASSWORD")]
    pub webhook_password: Option<String>,

    /// Path to a file containing the webhook basic auth password
    #[arg(long, env = "WEBHOOK_PASSWORD_FILE")]
    pub webhook_password_file: Option<PathBuf>,

    /// Listen address for the HTTP server
    #[arg(long, env = "SERVER_ADDRESS", default_value = "0.0.0.0:8080")]
    pub server_address: SocketAddr,
}

impl Config {
    /// The reference the working copy is kept aligned to. An explicit
    /// --ref wins over --branch.
    pub fn tracked_ref(&self) -> TrackedRef {
        match self.refname.as_deref() {
            Some(name) if !name.is_empty() => TrackedRef::parse(name),
            _ => TrackedRef::branch(&self.branch),
        }
    }

    pub fn sync_target(&self) -> SyncTarget {
        SyncTarget {
            repo_url: self.repo.clone(),
            path: self.path.clone(),
            tracked_ref: self.tracked_ref(),
            ca_bundle: self.ca_bundle_file.clone(),
            poll_interval: Duration::from_secs(self.interval),
            auth: AuthSpec {
                username: self.username.clone(),
                password: self.password.clone(),
                password_file: self.password_file.clone(),
                ssh_key_file: self.ssh_key_file.clone(),
                known_hosts_file: self.known_hosts_file.clone(),
                insecure_tls: self.insecure,
            },
        }
    }

    /// Server listener and webhook gating. The webhook password file,
    /// when set, wins over the literal value and is read verbatim, the
    /// same as the git credential files.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let password = match &self.webhook_password_file {
            Some(path) => {
                fs::read_to_string(path).map_err(|source| Error::WebhookPasswordFile {
                    path: path.clone(),
                    source,
                })?
            }
            None => self.webhook_password.clone().unwrap_or_default(),
        };
        Ok(ServerConfig {
            addr: self.server_address,
            webhook: WebhookConfig {
                enabled: self.webhook_enabled,
                username: self.webhook_username.clone().unwrap_or_default(),
                password,
            },
        })
    }
}
