//! git-mirror: keep a working copy aligned with a remote reference
//!
//! One long-running process per repository: an initial sync at startup,
//! a periodic poll loop, and an HTTP server for status and webhooks.

mod config;
mod error;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mirror_core::{Syncer, bootstrap};
use mirror_git::GitTransport;
use mirror_server::{build_router, serve};

use config::Config;
use error::Result;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::parse();
    init_tracing();

    if let Some(ca_bundle) = &config.ca_bundle_file {
        mirror_git::install_ca_bundle(ca_bundle)?;
    }

    let server_config = config.server_config()?;
    let target = config.sync_target();
    let transport = GitTransport::new(target.git_target());
    let syncer = Arc::new(Syncer::new(target, Box::new(transport)));

    // the first sync is the only one allowed to delete data: a failure
    // nukes the working copy and retries once, a second failure is fatal
    tracing::info!(repo = %config.repo, "performing initial sync");
    bootstrap(&syncer)?;
    tracing::info!("initial sync completed");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        syncer.start();

        let router = build_router(Arc::clone(&syncer), &server_config.webhook);
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        };
        serve(server_config.addr, router, shutdown).await?;

        syncer.stop();
        Ok(())
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
