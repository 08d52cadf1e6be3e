//! Project metadata fallback for the GitHub owner/repository pair.
//!
//! When the options omit `user` or `repo`, the host application's project
//! metadata is consulted: `package.json` (`repository` as a string or as an
//! object with `url`), then `Cargo.toml` (`package.repository`).

use crate::error::{Result, UpdaterError};
use std::path::Path;

/// Message for a missing or unparseable repository reference.
pub const REPO_NOT_FOUND: &str =
    "repo not found. Add repository string to your app's package.json file";

/// GitHub owner and repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Account or organisation.
    pub user: String,
    /// Repository name (no `.git` suffix).
    pub repo: String,
}

/// Infer the repository from the metadata files under `app_path`.
///
/// # Errors
///
/// Returns [`UpdaterError::Config`] with [`REPO_NOT_FOUND`] if no metadata file
/// carries a parseable GitHub repository reference.
pub fn guess_repo(app_path: &Path) -> Result<RepoSlug> {
    let reference = match read_repository(app_path) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("cannot read project metadata in {}: {e}", app_path.display());
            None
        }
    };

    reference
        .as_deref()
        .and_then(parse_github_slug)
        .ok_or_else(|| UpdaterError::Config(REPO_NOT_FOUND.to_owned()))
}

/// Read the raw repository reference from `package.json` or `Cargo.toml`.
///
/// Returns `Ok(None)` if neither file exists or neither names a repository.
///
/// # Errors
///
/// Returns [`UpdaterError::Metadata`] if a present file cannot be read or decoded.
pub fn read_repository(app_path: &Path) -> Result<Option<String>> {
    let package_json = app_path.join("package.json");
    if package_json.is_file() {
        let text = std::fs::read_to_string(&package_json).map_err(|e| {
            UpdaterError::Metadata(format!("cannot read {}: {e}", package_json.display()))
        })?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            UpdaterError::Metadata(format!("cannot parse {}: {e}", package_json.display()))
        })?;
        let repository = &value["repository"];
        let reference = repository
            .as_str()
            .or_else(|| repository["url"].as_str())
            .map(str::to_owned);
        if reference.is_some() {
            return Ok(reference);
        }
    }

    let cargo_toml = app_path.join("Cargo.toml");
    if cargo_toml.is_file() {
        let text = std::fs::read_to_string(&cargo_toml).map_err(|e| {
            UpdaterError::Metadata(format!("cannot read {}: {e}", cargo_toml.display()))
        })?;
        let value: toml::Value = toml::from_str(&text).map_err(|e| {
            UpdaterError::Metadata(format!("cannot parse {}: {e}", cargo_toml.display()))
        })?;
        let reference = value
            .get("package")
            .and_then(|p| p.get("repository"))
            .and_then(toml::Value::as_str)
            .map(str::to_owned);
        return Ok(reference);
    }

    Ok(None)
}

/// Parse a GitHub repository reference into an owner/name pair.
///
/// Accepts `owner/name`, `github:owner/name`, `github.com/owner/name`,
/// `git@github.com:owner/name.git` and http(s)/git URLs (optionally prefixed
/// with `git+`) pointing at `github.com`.
pub fn parse_github_slug(reference: &str) -> Option<RepoSlug> {
    let reference = reference.trim();
    let reference = reference.strip_prefix("git+").unwrap_or(reference);

    let path = if let Some(rest) = reference.strip_prefix("github:") {
        rest.to_owned()
    } else if let Some(rest) = reference.strip_prefix("git@github.com:") {
        rest.to_owned()
    } else if reference.contains("://") {
        let parsed = url::Url::parse(reference).ok()?;
        match parsed.host_str() {
            Some("github.com") | Some("www.github.com") => {}
            _ => return None,
        }
        parsed.path().trim_start_matches('/').to_owned()
    } else if let Some(rest) = reference
        .strip_prefix("github.com/")
        .or_else(|| reference.strip_prefix("www.github.com/"))
    {
        rest.to_owned()
    } else if reference.contains(':') {
        return None;
    } else {
        reference.to_owned()
    };

    let path = path.split(['#', '?']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let user = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if user.is_empty() || repo.is_empty() {
        return None;
    }

    // Shorthand must be exactly `owner/name`.
    if !reference.contains("://")
        && !reference.starts_with("github")
        && !reference.starts_with("git@")
        && segments.next().is_some()
    {
        return None;
    }

    Some(RepoSlug {
        user: user.to_owned(),
        repo: repo.to_owned(),
    })
}
