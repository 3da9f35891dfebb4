//! Remote URL classification
//!
//! Only the pieces auth selection needs: the scheme, the embedded user,
//! and the host. `git@host:path` scp-style remotes classify as ssh;
//! `scheme://` remotes parse directly; everything else is a local path.

/// Transport scheme of a remote URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ssh,
    File,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ssh => "ssh",
            Scheme::File => "file",
        }
    }

    pub fn is_ssh(&self) -> bool {
        matches!(self, Scheme::Ssh)
    }
}

/// Parsed view of a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrl {
    pub scheme: Scheme,
    pub user: Option<String>,
    pub host: String,
}

/// Classify a remote URL string.
///
/// Local paths (no scheme, no `user@host:` prefix) come back as `file`
/// with an empty host, so callers never need a special case for them.
pub fn parse(remote: &str) -> GitUrl {
    if let Some((scheme, rest)) = remote.split_once("://") {
        let scheme = match scheme {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "ssh" => Scheme::Ssh,
            _ => Scheme::File,
        };
        let authority = rest.split('/').next().unwrap_or("");
        let (user, host) = split_userinfo(authority);
        return GitUrl { scheme, user, host };
    }

    if let Some((head, _path)) = remote.split_once(':')
        && !head.contains('/')
        && !head.is_empty()
    {
        // scp-style form: [user@]host:path
        let (user, host) = match head.split_once('@') {
            Some((user, host)) => (Some(user.to_string()), host.to_string()),
            None => (None, head.to_string()),
        };
        return GitUrl {
            scheme: Scheme::Ssh,
            user,
            host,
        };
    }

    GitUrl {
        scheme: Scheme::File,
        user: None,
        host: String::new(),
    }
}

fn split_userinfo(authority: &str) -> (Option<String>, String) {
    let (user, host) = match authority.split_once('@') {
        Some((user, host)) => (Some(user.to_string()), host),
        None => (None, authority),
    };
    // strip a port if present
    let host = host.split(':').next().unwrap_or("").to_string();
    (user, host)
}
