//! Test fixtures for git-mirror
//!
//! Everything here panics on failure; these are test builders, not
//! production code paths.

pub mod git;

pub use git::RemoteRepo;
