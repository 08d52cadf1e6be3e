//! Host application collaborators.
//!
//! The updater never installs anything itself. It drives three facilities the
//! host application provides:
//! - [`HostApp`]: lifecycle and identity of the running application
//! - [`UpdateFacility`]: the native auto-update mechanism
//! - [`DialogFacility`]: modal confirmation dialogs

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Lifecycle and identity of the host application.
#[async_trait]
pub trait HostApp: Send + Sync {
    /// Returns `true` once the application has finished launching.
    fn is_ready(&self) -> bool;

    /// Resolves when the application becomes ready. Only awaited when
    /// [`is_ready`](Self::is_ready) returned `false`.
    async fn wait_until_ready(&self);

    /// Returns `true` for packaged production builds.
    fn is_packaged(&self) -> bool;

    /// Running application version (semver).
    fn version(&self) -> String;

    /// Directory holding the application's project metadata.
    fn app_path(&self) -> PathBuf;
}

/// Events emitted by the native update facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityEvent {
    /// The facility found the update behind the feed URL and started
    /// downloading it.
    UpdateAvailable,
    /// The update has been downloaded and is ready to install.
    UpdateDownloaded {
        /// Release notes reported by the facility.
        notes: String,
        /// Release name reported by the facility.
        name: String,
        /// Release date, when known.
        date: Option<DateTime<Utc>>,
        /// URL the update was downloaded from.
        url: String,
    },
    /// The facility failed while checking or downloading.
    Error(String),
}

/// The native auto-update mechanism.
pub trait UpdateFacility: Send + Sync {
    /// Set the base URL the facility resolves platform payloads from.
    fn set_feed_url(&self, url: &str);

    /// Ask the facility to check the feed URL and download what it finds.
    fn check_for_updates(&self);

    /// Quit the application and install the downloaded update.
    fn quit_and_install(&self);

    /// Register for facility events.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<FacilityEvent>;
}

/// Contents of an informational confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBoxOptions {
    /// Button labels, left to right. The reply is an index into this list.
    pub buttons: Vec<String>,
    /// Window title.
    pub title: String,
    /// Main message.
    pub message: String,
    /// Secondary text.
    pub detail: String,
}

/// Modal dialogs of the host application.
#[async_trait]
pub trait DialogFacility: Send + Sync {
    /// Show a dialog and resolve with the index of the chosen button.
    async fn show_message_box(&self, options: MessageBoxOptions) -> Result<usize>;
}
