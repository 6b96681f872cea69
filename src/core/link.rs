//! Browsable commit URLs derived from a remote URL.
//!
//! Supported remote shapes:
//! - `https://host/owner/repo.git` (or `http://`) -> `https://host/owner/repo/commit/<rev>`
//! - `git@host:owner/repo.git` -> `http://host/owner/repo/commit/<rev>`
//! - `ssh://git@host/owner/repo.git` -> `http://host/owner/repo/commit/<rev>`
//!
//! Anything else yields `None`, which callers treat as "unknown", not as a failure.

use crate::core::annotation::strip_marker;

/// Build the commit URL for `revision` on the remote at `remote_url`
pub fn resolve(remote_url: &str, revision: &str) -> Option<String> {
    let revision = strip_marker(revision);
    if revision.is_empty() {
        return None;
    }

    let (scheme, host, repo_path) = split_remote(remote_url.trim())?;
    Some(format!("{scheme}://{host}/{repo_path}/commit/{revision}"))
}

fn split_remote(remote: &str) -> Option<(&'static str, &str, &str)> {
    if let Some(rest) = remote.strip_prefix("https://") {
        let (host, path) = split_authority(rest, '/')?;
        return Some(("https", host, clean_repo_path(path)?));
    }
    if let Some(rest) = remote.strip_prefix("http://") {
        let (host, path) = split_authority(rest, '/')?;
        return Some(("http", host, clean_repo_path(path)?));
    }
    if let Some(rest) = remote.strip_prefix("ssh://") {
        let (host, path) = split_authority(rest, '/')?;
        return Some(("http", strip_port(host), clean_repo_path(path)?));
    }
    if let Some(rest) = remote.strip_prefix("git@") {
        let (host, path) = rest.split_once(':')?;
        if host.is_empty() {
            return None;
        }
        return Some(("http", host, clean_repo_path(path)?));
    }
    None
}

/// Split `user@host/path` at the first `separator`, dropping any user info
fn split_authority(rest: &str, separator: char) -> Option<(&str, &str)> {
    let (authority, path) = rest.split_once(separator)?;
    let host = authority.rsplit('@').next().unwrap_or(authority);
    if host.is_empty() {
        return None;
    }
    Some((host, path))
}

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// `owner/repo.git/` -> `owner/repo`; needs at least an owner and a name
fn clean_repo_path(path: &str) -> Option<&str> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    match path.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Some(path),
        _ => None,
    }
}
