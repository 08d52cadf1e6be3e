//! GitHub release resolution.
//!
//! Fetches the most recent releases of a repository, drops drafts,
//! prereleases and non-semver tags, and picks the newest release that ships
//! an asset for the running platform. The endpoint's order (newest first) is
//! trusted; releases are never re-sorted.

use crate::error::{Result, UpdaterError};
use crate::platform::Platform;
use crate::version;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default GitHub REST API base.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Base for computed download URLs. Always GitHub, even when the API base is
/// overridden.
pub const GITHUB_DOWNLOAD_BASE: &str = "https://github.com";

/// Media type sent in the `Accept` header.
pub const RELEASES_ACCEPT: &str = "application/vnd.github.preview";

/// Number of releases requested per poll.
pub const RELEASES_PER_PAGE: u32 = 100;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A release as returned by the GitHub releases API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Tag name (e.g. "v1.0.0").
    #[serde(default)]
    pub tag_name: String,
    /// Unpublished draft.
    #[serde(default)]
    pub draft: bool,
    /// Marked as a prerelease.
    #[serde(default)]
    pub prerelease: bool,
    /// Downloadable files, in endpoint order.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Release notes.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

impl Release {
    /// Returns `true` if the release is published, final and semver-tagged.
    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease && version::is_valid_tag(&self.tag_name)
    }

    /// Returns `true` if any asset serves `platform`.
    pub fn has_asset_for(&self, platform: &Platform) -> bool {
        self.assets.iter().any(|a| platform.matches_asset(&a.name))
    }
}

/// A single release asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset file name.
    #[serde(default)]
    pub name: String,
    /// Direct download URL.
    #[serde(default)]
    pub browser_download_url: String,
}

/// The release an update would move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRelease {
    /// Release tag, verbatim.
    pub version: String,
    /// Release notes.
    pub notes: String,
    /// Feed URL for the update facility.
    pub download_url: String,
}

/// Releases endpoint payload: normally an array, occasionally one object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReleasesPayload {
    Many(Vec<Release>),
    One(Box<Release>),
}

impl From<ReleasesPayload> for Vec<Release> {
    fn from(payload: ReleasesPayload) -> Self {
        match payload {
            ReleasesPayload::Many(releases) => releases,
            ReleasesPayload::One(release) => vec![*release],
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pick the first stable release with an asset for `platform`.
pub fn select_eligible<'a>(releases: &'a [Release], platform: &Platform) -> Option<&'a Release> {
    releases
        .iter()
        .filter(|r| r.is_stable())
        .find(|r| r.has_asset_for(platform))
}

/// Build the feed URL handed to the update facility.
pub fn download_url(user: &str, repo: &str, tag: &str) -> String {
    format!("{GITHUB_DOWNLOAD_BASE}/{user}/{repo}/releases/download/{tag}")
}

/// Resolves the newest eligible release of a GitHub repository.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    client: reqwest::Client,
    api_base: String,
    platform: Platform,
}

impl ReleaseResolver {
    /// Create a resolver for `platform` against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Fetch`] if the HTTP client cannot be built.
    pub fn new(platform: Platform) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_base: GITHUB_API_BASE.to_owned(),
            platform,
        })
    }

    /// Point the resolver at another API base (trailing `/` ignored).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    /// Replace the transport timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Fetch`] if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Match releases against another platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Platform releases are matched against.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Releases listing URL for `user/repo`.
    pub fn releases_url(&self, user: &str, repo: &str) -> String {
        format!(
            "{}/repos/{user}/{repo}/releases?per_page={RELEASES_PER_PAGE}",
            self.api_base
        )
    }

    /// Fetch the most recent releases of `user/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Fetch`] on transport failure, a non-success
    /// status, or an undecodable body.
    pub async fn fetch_releases(&self, user: &str, repo: &str) -> Result<Vec<Release>> {
        let url = self.releases_url(user, repo);
        tracing::debug!("fetching releases from {url}");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, RELEASES_ACCEPT)
            .send()
            .await
            .map_err(|e| UpdaterError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpdaterError::Fetch(format!(
                "GitHub API returned {status} for {url}"
            )));
        }

        let payload: ReleasesPayload = resp
            .json()
            .await
            .map_err(|e| UpdaterError::Fetch(format!("cannot decode releases from {url}: {e}")))?;
        Ok(payload.into())
    }

    /// Resolve the newest eligible release of `user/repo`.
    ///
    /// Returns `Ok(None)` when no release qualifies.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Fetch`] if the releases cannot be fetched.
    pub async fn resolve(&self, user: &str, repo: &str) -> Result<Option<ResolvedRelease>> {
        let releases = self.fetch_releases(user, repo).await?;
        let Some(release) = select_eligible(&releases, &self.platform) else {
            tracing::debug!(
                "no eligible release among {} for {user}/{repo} on {}",
                releases.len(),
                self.platform
            );
            return Ok(None);
        };

        tracing::info!("latest release online: {}", release.tag_name);
        Ok(Some(ResolvedRelease {
            version: release.tag_name.clone(),
            notes: release.body.clone(),
            download_url: download_url(user, repo, &release.tag_name),
        }))
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("inline-updater/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| UpdaterError::Fetch(format!("failed to build HTTP client: {e}")))
}
