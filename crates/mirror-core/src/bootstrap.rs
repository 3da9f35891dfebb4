//! Startup-only recovery policy
//!
//! The very first reconciliation is the only one allowed to destroy data:
//! if it fails, there is no usable working copy to preserve, so the path
//! is deleted outright and the sync retried once. A failure of the retry
//! is surfaced to the caller, which is expected to treat it as fatal.
//! Steady-state failures are retried on the next tick and never delete
//! anything.

use std::fs;
use std::io;

use crate::error::{Result, SyncError};
use crate::syncer::Syncer;

/// Run the initial forced sync with the nuke-and-retry-once policy.
pub fn bootstrap(syncer: &Syncer) -> Result<()> {
    if let Err(err) = syncer.reconcile(true) {
        tracing::warn!(
            error = %err,
            path = %syncer.target().path.display(),
            "initial sync failed, deleting the working copy and retrying"
        );
        match fs::remove_dir_all(&syncer.target().path) {
            Ok(()) => {}
            Err(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            Err(io_err) => return Err(SyncError::Cleanup(io_err)),
        }
        syncer.reconcile(true)?;
    }
    Ok(())
}
