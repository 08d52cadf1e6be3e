//! Inline updater: interval-driven update checks for desktop applications.
//!
//! The updater polls a GitHub repository's releases, decides whether a newer
//! version exists, optionally asks the user, and hands the update to the
//! host's native update facility. The transfer and installation themselves
//! are the facility's job.
//!
//! # Architecture
//!
//! - **Version comparison** ([`version`]): semver tag parsing, pure
//! - **Release resolution** ([`release`]): one HTTP fetch, platform filtering
//! - **Coordination** ([`coordinator`]): setup, timer, prompts, facility events
//!
//! Host collaborators are traits in [`host`]; the coordinator receives them as
//! explicit handles.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod metadata;
pub mod platform;
pub mod release;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod version;

pub use config::{UpdaterConfig, UpdaterOptions};
pub use coordinator::{
    CheckOutcome, CoordinatorHandle, CoordinatorState, SetupOutcome, SkipReason,
    UpdateCoordinator, UpdatePhase,
};
pub use error::{Result, UpdaterError};
pub use host::{DialogFacility, FacilityEvent, HostApp, MessageBoxOptions, UpdateFacility};
pub use platform::Platform;
pub use release::{Release, ReleaseResolver, ResolvedRelease};
