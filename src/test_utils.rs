//! In-memory collaborators for tests.
//!
//! Compiled for unit tests and behind the `test-utils` feature.
//!
//! [`FakeHost`], [`RecordingFacility`] and [`ScriptedDialog`] implement the
//! [`host`](crate::host) traits without a GUI, recording what the coordinator
//! asked of them.

use crate::error::{Result, UpdaterError};
use crate::host::{DialogFacility, FacilityEvent, HostApp, MessageBoxOptions, UpdateFacility};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};

/// Host application with settable lifecycle flags.
#[derive(Debug)]
pub struct FakeHost {
    ready: AtomicBool,
    ready_notify: Notify,
    packaged: bool,
    version: String,
    app_path: PathBuf,
    ready_waits: AtomicUsize,
}

impl FakeHost {
    /// A ready, packaged host at `version` with metadata under `app_path`.
    pub fn new(version: impl Into<String>, app_path: impl Into<PathBuf>) -> Self {
        Self {
            ready: AtomicBool::new(true),
            ready_notify: Notify::new(),
            packaged: true,
            version: version.into(),
            app_path: app_path.into(),
            ready_waits: AtomicUsize::new(0),
        }
    }

    /// Mark the build as a development (unpackaged) build.
    pub fn unpackaged(mut self) -> Self {
        self.packaged = false;
        self
    }

    /// Start in the not-yet-ready lifecycle phase.
    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    /// Fire the ready notification.
    pub fn make_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        self.ready_notify.notify_waiters();
    }

    /// Number of times the coordinator waited for readiness.
    pub fn ready_waits(&self) -> usize {
        self.ready_waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostApp for FakeHost {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn wait_until_ready(&self) {
        self.ready_waits.fetch_add(1, Ordering::SeqCst);
        let notified = self.ready_notify.notified();
        if self.is_ready() {
            return;
        }
        notified.await;
    }

    fn is_packaged(&self) -> bool {
        self.packaged
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn app_path(&self) -> PathBuf {
        self.app_path.clone()
    }
}

/// Update facility that records calls and lets tests emit events.
#[derive(Debug, Default)]
pub struct RecordingFacility {
    feed_urls: Mutex<Vec<String>>,
    checks: AtomicUsize,
    installs: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FacilityEvent>>>,
}

impl RecordingFacility {
    /// Every feed URL set, oldest first.
    pub fn feed_urls(&self) -> Vec<String> {
        self.feed_urls
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }

    /// Number of `check_for_updates` calls.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    /// Number of `quit_and_install` calls.
    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Deliver `event` to every subscriber. Returns how many received it.
    pub fn emit(&self, event: FacilityEvent) -> usize {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }
}

impl UpdateFacility for RecordingFacility {
    fn set_feed_url(&self, url: &str) {
        if let Ok(mut urls) = self.feed_urls.lock() {
            urls.push(url.to_owned());
        }
    }

    fn check_for_updates(&self) {
        self.checks.fetch_add(1, Ordering::SeqCst);
    }

    fn quit_and_install(&self) {
        self.installs.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<FacilityEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }
}

/// Dialog facility answering from a script. Answers `0` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    responses: Mutex<VecDeque<Result<usize>>>,
    shown: Mutex<Vec<MessageBoxOptions>>,
    hold: Option<std::sync::Arc<Notify>>,
}

impl ScriptedDialog {
    /// Answer with these button indices, in order.
    pub fn answering(responses: impl IntoIterator<Item = usize>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Fail the next dialog with a facility error.
    pub fn failing() -> Self {
        let mut responses = VecDeque::new();
        responses.push_back(Err(UpdaterError::Dialog("dialog closed by host".to_owned())));
        Self {
            responses: Mutex::new(responses),
            ..Self::default()
        }
    }

    /// Keep every dialog open until `release` is notified.
    pub fn held_by(mut self, release: std::sync::Arc<Notify>) -> Self {
        self.hold = Some(release);
        self
    }

    /// Every dialog shown, oldest first.
    pub fn shown(&self) -> Vec<MessageBoxOptions> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DialogFacility for ScriptedDialog {
    async fn show_message_box(&self, options: MessageBoxOptions) -> Result<usize> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(options);
        }
        if let Some(release) = &self.hold {
            release.notified().await;
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or(Ok(0))
    }
}
