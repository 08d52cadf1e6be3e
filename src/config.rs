//! Configuration types for the updater.
//!
//! [`UpdaterOptions`] is the raw, partially filled surface a host application
//! hands over (in code or from a TOML file). [`UpdaterConfig`] is the validated
//! form the coordinator runs with.

use crate::error::{Result, UpdaterError};
use crate::metadata;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Interval used when the options leave it unset.
pub const DEFAULT_UPDATE_INTERVAL: &str = "10 minutes";

/// Shortest accepted polling interval.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

const INTERVAL_FORMAT_MESSAGE: &str =
    "updateInterval must be a human-friendly string interval like `20 minutes`";
const INTERVAL_FLOOR_MESSAGE: &str = "updateInterval must be `5 minutes` or more";

/// Options supplied by the host application. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterOptions {
    /// GitHub account owning the repository.
    pub user: Option<String>,
    /// GitHub repository name.
    pub repo: Option<String>,
    /// How often to poll, e.g. `"20 minutes"`. Defaults to `"10 minutes"`.
    #[serde(alias = "updateInterval")]
    pub update_interval: Option<String>,
    /// Ask before restarting into a downloaded update. Defaults to `true`.
    #[serde(alias = "notifyBeforeApply")]
    pub notify_before_apply: Option<bool>,
    /// Ask before starting a download. Defaults to `true`.
    #[serde(alias = "notifyBeforeDownload")]
    pub notify_before_download: Option<bool>,
}

impl UpdaterOptions {
    /// Options naming the repository explicitly, everything else default.
    pub fn for_repo(user: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            repo: Some(repo.into()),
            ..Self::default()
        }
    }

    /// Set the polling interval.
    pub fn with_update_interval(mut self, interval: impl Into<String>) -> Self {
        self.update_interval = Some(interval.into());
        self
    }

    /// Set whether to ask before restarting.
    pub fn with_notify_before_apply(mut self, notify: bool) -> Self {
        self.notify_before_apply = Some(notify);
        self
    }

    /// Set whether to ask before downloading.
    pub fn with_notify_before_download(mut self, notify: bool) -> Self {
        self.notify_before_download = Some(notify);
        self
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UpdaterError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|e| {
            UpdaterError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    fn explicit_repo(&self) -> Option<(&str, &str)> {
        let user = self.user.as_deref().filter(|u| !u.is_empty())?;
        let repo = self.repo.as_deref().filter(|r| !r.is_empty())?;
        Some((user, repo))
    }
}

/// Validated updater configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdaterConfig {
    /// GitHub account owning the repository.
    pub user: String,
    /// GitHub repository name.
    pub repo: String,
    /// Interval string exactly as supplied.
    pub update_interval: String,
    /// Parsed polling interval.
    #[serde(skip)]
    pub interval: Duration,
    /// Ask before restarting into a downloaded update.
    pub notify_before_apply: bool,
    /// Ask before starting a download.
    pub notify_before_download: bool,
}

impl UpdaterConfig {
    /// Validate options, inferring the repository from the project metadata
    /// under `app_path` unless both `user` and `repo` are given.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] if the repository cannot be determined
    /// or the interval is malformed or shorter than five minutes.
    pub fn from_options(options: &UpdaterOptions, app_path: &Path) -> Result<Self> {
        let (user, repo) = match options.explicit_repo() {
            Some((user, repo)) => (user.to_owned(), repo.to_owned()),
            None => {
                let slug = metadata::guess_repo(app_path)?;
                (slug.user, slug.repo)
            }
        };

        if user.is_empty() {
            return Err(UpdaterError::Config("user is required".to_owned()));
        }
        if repo.is_empty() {
            return Err(UpdaterError::Config("repo is required".to_owned()));
        }

        let update_interval = options
            .update_interval
            .clone()
            .unwrap_or_else(|| DEFAULT_UPDATE_INTERVAL.to_owned());
        let interval = parse_interval(&update_interval)?;

        Ok(Self {
            user,
            repo,
            update_interval,
            interval,
            notify_before_apply: options.notify_before_apply.unwrap_or(true),
            notify_before_download: options.notify_before_download.unwrap_or(true),
        })
    }

    /// Re-apply interval and notification flags from a later setup call.
    ///
    /// The repository pair stays as configured; unset fields keep their
    /// current values.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] if the new interval is invalid.
    pub fn reconfigured(&self, options: &UpdaterOptions) -> Result<Self> {
        let update_interval = options
            .update_interval
            .clone()
            .unwrap_or_else(|| self.update_interval.clone());
        let interval = parse_interval(&update_interval)?;

        Ok(Self {
            user: self.user.clone(),
            repo: self.repo.clone(),
            update_interval,
            interval,
            notify_before_apply: options
                .notify_before_apply
                .unwrap_or(self.notify_before_apply),
            notify_before_download: options
                .notify_before_download
                .unwrap_or(self.notify_before_download),
        })
    }
}

/// Parse a human-friendly interval such as `"10 minutes"` or `"1h"`.
///
/// Units are case-insensitive. A bare integer is read as milliseconds.
///
/// # Errors
///
/// Returns [`UpdaterError::Config`] if the string does not start with a digit,
/// cannot be parsed, or is shorter than [`MIN_UPDATE_INTERVAL`].
pub fn parse_interval(value: &str) -> Result<Duration> {
    let trimmed = value.trim().to_ascii_lowercase();
    if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(UpdaterError::Config(INTERVAL_FORMAT_MESSAGE.to_owned()));
    }

    let interval = if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let millis: u64 = trimmed
            .parse()
            .map_err(|_| UpdaterError::Config(INTERVAL_FORMAT_MESSAGE.to_owned()))?;
        Duration::from_millis(millis)
    } else {
        humantime::parse_duration(&trimmed)
            .map_err(|_| UpdaterError::Config(INTERVAL_FORMAT_MESSAGE.to_owned()))?
    };

    if interval < MIN_UPDATE_INTERVAL {
        return Err(UpdaterError::Config(INTERVAL_FLOOR_MESSAGE.to_owned()));
    }
    Ok(interval)
}
