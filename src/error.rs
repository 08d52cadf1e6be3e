//! Error types for the updater.

/// Top-level error type for configuration, resolution and coordination.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// Invalid or missing configuration. Fatal at setup time.
    #[error("config error: {0}")]
    Config(String),

    /// Releases endpoint unreachable, non-success status, or undecodable body.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed semantic version.
    #[error("version error: {0}")]
    Version(String),

    /// Project metadata file could not be read or decoded.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Host dialog facility failure.
    #[error("dialog error: {0}")]
    Dialog(String),

    /// Coordinator task is gone or dropped a reply.
    #[error("channel error: {0}")]
    Channel(String),
}

impl UpdaterError {
    /// Returns `true` for errors that must abort initialisation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdaterError>;
