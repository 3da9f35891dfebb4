//! Canonical tracked-reference names

use std::fmt;

/// The single reference a working copy is kept aligned to.
///
/// Always stored in full form (`refs/heads/main`, `refs/tags/v1.0.0`); bare
/// names are canonicalized as branches at construction, so the rest of the
/// system never re-derives what kind of ref it is holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRef {
    full: String,
}

impl TrackedRef {
    /// Track a branch by its short name.
    pub fn branch(name: &str) -> Self {
        Self {
            full: format!("refs/heads/{name}"),
        }
    }

    /// Accept either a full ref name or a bare branch name.
    pub fn parse(name: &str) -> Self {
        if name.starts_with("refs/") {
            Self {
                full: name.to_string(),
            }
        } else {
            Self::branch(name)
        }
    }

    /// Full reference name, e.g. `refs/heads/main`.
    pub fn full_name(&self) -> &str {
        &self.full
    }

    /// Short name, e.g. `main` or `v1.0.0`.
    pub fn short_name(&self) -> &str {
        self.full
            .strip_prefix("refs/heads/")
            .or_else(|| self.full.strip_prefix("refs/tags/"))
            .or_else(|| self.full.strip_prefix("refs/"))
            .unwrap_or(&self.full)
    }

    pub fn is_branch(&self) -> bool {
        self.full.starts_with("refs/heads/")
    }
}

impl fmt::Display for TrackedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
