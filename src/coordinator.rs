//! Update coordination.
//!
//! [`UpdateCoordinator`] validates configuration, polls the releases endpoint
//! on an interval, compares versions, and sequences the two optional
//! confirmations (before download, before restart) around the host's native
//! update facility.
//!
//! All coordinator state lives on a single tokio task. Ticks, facility
//! events, dialog replies and handle commands are multiplexed with
//! `tokio::select!`, so dialogs never block polling and no locks are needed.

use crate::config::{UpdaterConfig, UpdaterOptions};
use crate::error::{Result, UpdaterError};
use crate::host::{
    DialogFacility, FacilityEvent, HostApp, MessageBoxOptions, UpdateFacility,
};
use crate::platform::Platform;
use crate::release::ReleaseResolver;
use crate::version;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const DIALOG_TITLE: &str = "Application Update";
const DOWNLOADED_DETAIL: &str =
    "A new version has been downloaded. Restart the application to apply the updates.";

/// Observable coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorState {
    /// Last cycle found nothing newer than the running version.
    pub has_latest_version: bool,
    /// Tag of the newest eligible release seen.
    pub fetched_version: String,
    /// Notes of the newest eligible release seen.
    pub release_notes: String,
    /// Feed URL computed for the newest eligible release.
    pub download_url: String,
    /// User postponed the update; automatic checks are suspended.
    pub paused: bool,
    /// The facility is downloading an update.
    pub is_downloading: bool,
    /// The download confirmation dialog is open.
    pub is_prompt_open: bool,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self {
            has_latest_version: true,
            fetched_version: "0.0.0".to_owned(),
            release_notes: String::new(),
            download_url: String::new(),
            paused: false,
            is_downloading: false,
            is_prompt_open: false,
        }
    }
}

/// Where the coordinator is in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    /// `setup` has not been called.
    Uninitialized,
    /// Configuration validated, but updates are not active
    /// (development build or unsupported platform).
    Configured,
    /// Waiting for the next tick.
    Polling,
    /// The download confirmation is open.
    AwaitingDownloadConfirm,
    /// The facility is downloading.
    Downloading,
    /// The restart confirmation is open.
    AwaitingRestartConfirm,
    /// The user postponed the update.
    Paused,
}

/// Result of [`UpdateCoordinator::setup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Ready to [`run`](UpdateCoordinator::run).
    Ready,
    /// Configuration is valid but the build is not packaged; no checks run.
    DevelopmentBuild,
    /// Configuration is valid but the platform has no update channel.
    UnsupportedPlatform,
}

/// Why a check cycle did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A download is in progress.
    Downloading,
    /// The user postponed the update.
    Paused,
}

/// Result of one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing was checked.
    Skipped(SkipReason),
    /// No eligible release is newer than the running version.
    UpToDate,
    /// The releases endpoint failed; treated as up to date.
    ResolutionFailed,
    /// Feed URL set and the download confirmation opened.
    PromptOpened,
    /// Feed URL set; the download confirmation was already open.
    PromptAlreadyOpen,
    /// Feed URL set and the facility asked to download.
    DownloadRequested,
    /// The newest release is already downloaded and waits for a restart.
    AlreadyDownloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Download,
    Restart,
}

struct PromptReply {
    kind: PromptKind,
    response: Result<usize>,
}

enum Command {
    CheckNow(oneshot::Sender<Result<CheckOutcome>>),
    Reconfigure(UpdaterOptions, oneshot::Sender<Result<()>>),
    State(oneshot::Sender<CoordinatorState>),
    Shutdown,
}

/// Coordinates polling, prompting and applying updates for one application.
pub struct UpdateCoordinator {
    options: UpdaterOptions,
    config: Option<UpdaterConfig>,
    host: Arc<dyn HostApp>,
    facility: Arc<dyn UpdateFacility>,
    dialogs: Arc<dyn DialogFacility>,
    platform: Platform,
    resolver: Option<ReleaseResolver>,
    state: CoordinatorState,
    setup_complete: bool,
    active: bool,
    restart_prompt_open: bool,
    downloaded_version: Option<String>,
    events: Option<mpsc::UnboundedReceiver<FacilityEvent>>,
    prompts: FuturesUnordered<BoxFuture<'static, PromptReply>>,
}

impl UpdateCoordinator {
    /// Create a coordinator for the given options and host collaborators.
    ///
    /// Nothing is validated until [`setup`](Self::setup).
    pub fn new(
        options: UpdaterOptions,
        host: Arc<dyn HostApp>,
        facility: Arc<dyn UpdateFacility>,
        dialogs: Arc<dyn DialogFacility>,
    ) -> Self {
        Self {
            options,
            config: None,
            host,
            facility,
            dialogs,
            platform: Platform::current(),
            resolver: None,
            state: CoordinatorState::default(),
            setup_complete: false,
            active: false,
            restart_prompt_open: false,
            downloaded_version: None,
            events: None,
            prompts: FuturesUnordered::new(),
        }
    }

    /// Override the platform (defaults to the build target OS).
    pub fn with_platform(mut self, platform: Platform) -> Self {
        if let Some(resolver) = self.resolver.take() {
            self.resolver = Some(resolver.with_platform(platform.clone()));
        }
        self.platform = platform;
        self
    }

    /// Use a preconfigured resolver. Its platform becomes the coordinator's.
    pub fn with_resolver(mut self, resolver: ReleaseResolver) -> Self {
        self.platform = resolver.platform().clone();
        self.resolver = Some(resolver);
        self
    }

    /// Current state snapshot.
    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Validated configuration, once [`setup`](Self::setup) succeeded.
    pub fn config(&self) -> Option<&UpdaterConfig> {
        self.config.as_ref()
    }

    /// Platform releases are matched against.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Where the coordinator is in its cycle.
    pub fn phase(&self) -> UpdatePhase {
        if !self.setup_complete {
            UpdatePhase::Uninitialized
        } else if !self.active {
            UpdatePhase::Configured
        } else if self.restart_prompt_open {
            UpdatePhase::AwaitingRestartConfirm
        } else if self.state.is_prompt_open {
            UpdatePhase::AwaitingDownloadConfirm
        } else if self.state.is_downloading {
            UpdatePhase::Downloading
        } else if self.state.paused {
            UpdatePhase::Paused
        } else {
            UpdatePhase::Polling
        }
    }

    /// Validate configuration and prepare for polling.
    ///
    /// Waits for the host to become ready first if it is not already.
    /// Development builds and unsupported platforms are not errors: the
    /// configuration is still validated, but no checks will run.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] if called twice or if the options are
    /// invalid.
    pub async fn setup(&mut self) -> Result<SetupOutcome> {
        if self.setup_complete {
            return Err(UpdaterError::Config("can't call setup twice".to_owned()));
        }
        self.setup_complete = true;

        if !self.host.is_ready() {
            debug!("host not ready; deferring updater setup");
            self.host.wait_until_ready().await;
        }

        let config = UpdaterConfig::from_options(&self.options, &self.host.app_path())?;
        debug!(
            "updater configured for {}/{} every {}",
            config.user, config.repo, config.update_interval
        );
        self.config = Some(config);

        if self.resolver.is_none() {
            self.resolver = Some(ReleaseResolver::new(self.platform.clone())?);
        }

        if !self.host.is_packaged() {
            info!("updater config looks good; aborting updates since app is in development mode");
            return Ok(SetupOutcome::DevelopmentBuild);
        }

        if !self.platform.is_supported() {
            info!(
                "updater only supports windows and macos; {} does not receive updates",
                self.platform
            );
            return Ok(SetupOutcome::UnsupportedPlatform);
        }

        self.events = Some(self.facility.subscribe());
        self.active = true;
        Ok(SetupOutcome::Ready)
    }

    /// Re-apply interval and notification flags, and lift a pause.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] before setup or if the options are
    /// invalid. The previous configuration stays in force on error.
    pub fn reconfigure(&mut self, options: &UpdaterOptions) -> Result<()> {
        let current = self
            .config
            .as_ref()
            .ok_or_else(|| UpdaterError::Config("coordinator is not configured".to_owned()))?;
        let next = current.reconfigured(options)?;
        info!(
            "updater reconfigured: every {}, notify before download {}, before apply {}",
            next.update_interval, next.notify_before_download, next.notify_before_apply
        );
        self.config = Some(next);
        self.state.paused = false;
        Ok(())
    }

    /// Run one check cycle.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] if [`setup`](Self::setup) has not
    /// succeeded. Resolution failures are logged, never returned.
    pub async fn check_for_updates(&mut self) -> Result<CheckOutcome> {
        if self.state.is_downloading {
            debug!("download in progress; skipping update check");
            return Ok(CheckOutcome::Skipped(SkipReason::Downloading));
        }
        if self.state.paused {
            debug!("updates paused; skipping update check");
            return Ok(CheckOutcome::Skipped(SkipReason::Paused));
        }

        let (Some(config), Some(resolver)) = (self.config.as_ref(), self.resolver.as_ref()) else {
            return Err(UpdaterError::Config("coordinator is not configured".to_owned()));
        };
        let notify_before_download = config.notify_before_download;

        let resolved = match resolver.resolve(&config.user, &config.repo).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                self.state.has_latest_version = true;
                self.state.download_url.clear();
                info!("app has the latest version ({})", self.state.fetched_version);
                return Ok(CheckOutcome::UpToDate);
            }
            Err(e) => {
                warn!("failed to fetch release information: {e}");
                self.state.has_latest_version = true;
                return Ok(CheckOutcome::ResolutionFailed);
            }
        };

        self.state.fetched_version = resolved.version;
        self.state.release_notes = resolved.notes;
        self.state.download_url = resolved.download_url;

        let current = self.host.version();
        let up_to_date = version::is_up_to_date(&current, &self.state.fetched_version)
            .unwrap_or_else(|e| {
                warn!("cannot compare versions: {e}");
                true
            });
        self.state.has_latest_version = up_to_date;
        if up_to_date {
            info!("app has the latest version ({})", self.state.fetched_version);
            return Ok(CheckOutcome::UpToDate);
        }

        if self.downloaded_version.as_deref() == Some(self.state.fetched_version.as_str()) {
            debug!(
                "update {} already downloaded; waiting for restart",
                self.state.fetched_version
            );
            return Ok(CheckOutcome::AlreadyDownloaded);
        }

        info!(
            "update {} available (running {current}); feed url {}",
            self.state.fetched_version, self.state.download_url
        );
        self.facility.set_feed_url(&self.state.download_url);

        if notify_before_download {
            Ok(self.prompt_download())
        } else {
            self.facility.check_for_updates();
            Ok(CheckOutcome::DownloadRequested)
        }
    }

    /// React to an event from the update facility.
    pub fn handle_event(&mut self, event: FacilityEvent) {
        match event {
            FacilityEvent::UpdateAvailable => {
                info!("update available; downloading");
                self.state.is_downloading = true;
            }
            FacilityEvent::UpdateDownloaded {
                notes,
                name,
                date,
                url,
            } => {
                info!(
                    "update downloaded: name={name:?} date={} url={url}",
                    date.map(|d| d.to_rfc3339()).unwrap_or_default()
                );
                self.state.is_downloading = false;
                self.downloaded_version = Some(self.state.fetched_version.clone());
                let notify_before_apply = self
                    .config
                    .as_ref()
                    .is_some_and(|c| c.notify_before_apply);
                if notify_before_apply {
                    self.prompt_restart(notes, name);
                }
            }
            FacilityEvent::Error(message) => {
                warn!("update facility error: {message}");
                self.state.is_downloading = false;
            }
        }
    }

    /// Wait for every open dialog to close and apply the answers.
    pub async fn settle_prompts(&mut self) {
        while let Some(reply) = self.prompts.next().await {
            self.apply_prompt_reply(reply);
        }
    }

    /// Start the background polling task.
    ///
    /// Checks once immediately, then every configured interval. Ticks missed
    /// while a cycle runs are skipped, not queued.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] unless [`setup`](Self::setup) returned
    /// [`SetupOutcome::Ready`].
    pub fn run(mut self) -> Result<(CoordinatorHandle, tokio::task::JoinHandle<()>)> {
        let events = match (self.active, self.events.take()) {
            (true, Some(events)) => events,
            _ => {
                return Err(UpdaterError::Config(
                    "coordinator is not ready to run".to_owned(),
                ));
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.event_loop(events, rx));
        Ok((CoordinatorHandle { commands: tx }, task))
    }

    async fn event_loop(
        mut self,
        mut events: mpsc::UnboundedReceiver<FacilityEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut interval = poll_interval(self.interval(), true);
        let mut events_open = true;
        info!("update checks started; every {:?}", self.interval());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.check_for_updates().await {
                        error!("update check failed: {e}");
                    }
                }
                Some(reply) = self.prompts.next(), if !self.prompts.is_empty() => {
                    self.apply_prompt_reply(reply);
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        debug!("update facility event channel closed");
                        events_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::CheckNow(reply)) => {
                        let _ = reply.send(self.check_for_updates().await);
                    }
                    Some(Command::Reconfigure(options, reply)) => {
                        let result = self.reconfigure(&options);
                        if result.is_ok() {
                            interval = poll_interval(self.interval(), false);
                        }
                        let _ = reply.send(result);
                    }
                    Some(Command::State(reply)) => {
                        let _ = reply.send(self.state.clone());
                    }
                    Some(Command::Shutdown) | None => {
                        info!("update checks stopped");
                        break;
                    }
                },
            }
        }
    }

    fn interval(&self) -> Duration {
        self.config
            .as_ref()
            .map(|c| c.interval)
            .unwrap_or(crate::config::MIN_UPDATE_INTERVAL)
    }

    fn prompt_download(&mut self) -> CheckOutcome {
        if self.state.is_prompt_open {
            debug!("download prompt already open");
            return CheckOutcome::PromptAlreadyOpen;
        }

        let options = MessageBoxOptions {
            buttons: vec!["Download update".to_owned(), "Later".to_owned()],
            title: DIALOG_TITLE.to_owned(),
            message: self.state.fetched_version.clone(),
            detail: format!(
                "A new version have been released.\n\n{}\n",
                self.state.release_notes
            ),
        };

        self.state.is_prompt_open = true;
        self.open_prompt(PromptKind::Download, options);
        CheckOutcome::PromptOpened
    }

    fn prompt_restart(&mut self, notes: String, name: String) {
        if self.restart_prompt_open {
            debug!("restart prompt already open");
            return;
        }

        let message = if self.platform == Platform::Windows {
            notes
        } else {
            name
        };
        let options = MessageBoxOptions {
            buttons: vec!["Restart".to_owned(), "Later".to_owned()],
            title: DIALOG_TITLE.to_owned(),
            message,
            detail: DOWNLOADED_DETAIL.to_owned(),
        };

        self.restart_prompt_open = true;
        self.open_prompt(PromptKind::Restart, options);
    }

    fn open_prompt(&mut self, kind: PromptKind, options: MessageBoxOptions) {
        let dialogs = Arc::clone(&self.dialogs);
        self.prompts.push(
            async move {
                PromptReply {
                    kind,
                    response: dialogs.show_message_box(options).await,
                }
            }
            .boxed(),
        );
    }

    fn apply_prompt_reply(&mut self, reply: PromptReply) {
        match reply.kind {
            PromptKind::Download => {
                self.state.is_prompt_open = false;
                match reply.response {
                    Ok(0) => {
                        info!("user accepted update {}", self.state.fetched_version);
                        self.facility.check_for_updates();
                    }
                    Ok(_) => {
                        info!("user postponed update; pausing update checks");
                        self.state.paused = true;
                    }
                    Err(e) => error!("download prompt failed: {e}"),
                }
            }
            PromptKind::Restart => {
                self.restart_prompt_open = false;
                match reply.response {
                    Ok(0) => {
                        info!("restarting to apply update");
                        self.facility.quit_and_install();
                    }
                    Ok(_) => info!("restart postponed"),
                    Err(e) => error!("restart prompt failed: {e}"),
                }
            }
        }
    }
}

fn poll_interval(period: Duration, immediate: bool) -> Interval {
    let start = if immediate {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Cloneable handle to a running coordinator task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    /// Run a check cycle now, outside the timer.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Channel`] if the coordinator has stopped.
    pub async fn check_now(&self) -> Result<CheckOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::CheckNow(tx))?;
        rx.await
            .map_err(|_| UpdaterError::Channel("coordinator dropped check reply".to_owned()))?
    }

    /// Re-apply interval and notification flags, and lift a pause. The timer
    /// restarts with the new interval.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Config`] for invalid options, or
    /// [`UpdaterError::Channel`] if the coordinator has stopped.
    pub async fn reconfigure(&self, options: UpdaterOptions) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Reconfigure(options, tx))?;
        rx.await.map_err(|_| {
            UpdaterError::Channel("coordinator dropped reconfigure reply".to_owned())
        })?
    }

    /// Snapshot of the coordinator state.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Channel`] if the coordinator has stopped.
    pub async fn state(&self) -> Result<CoordinatorState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::State(tx))?;
        rx.await
            .map_err(|_| UpdaterError::Channel("coordinator dropped state reply".to_owned()))
    }

    /// Stop the coordinator task. Open dialogs are abandoned.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| UpdaterError::Channel("coordinator is not running".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::test_utils::{FakeHost, RecordingFacility, ScriptedDialog};

    struct Fixture {
        host: Arc<FakeHost>,
        facility: Arc<RecordingFacility>,
        dialogs: Arc<ScriptedDialog>,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(host: impl FnOnce(std::path::PathBuf) -> FakeHost, dialogs: ScriptedDialog) -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self {
                host: Arc::new(host(dir.path().to_owned())),
                facility: Arc::new(RecordingFacility::default()),
                dialogs: Arc::new(dialogs),
                _dir: dir,
            }
        }

        fn packaged() -> Self {
            Self::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::default())
        }

        fn coordinator(&self, options: UpdaterOptions) -> UpdateCoordinator {
            UpdateCoordinator::new(
                options,
                self.host.clone(),
                self.facility.clone(),
                self.dialogs.clone(),
            )
            .with_platform(Platform::Windows)
        }
    }

    fn foo_bar() -> UpdaterOptions {
        UpdaterOptions::for_repo("foo", "bar")
    }

    /// Pretend a cycle found `tag` newer than the running version.
    fn found(coordinator: &mut UpdateCoordinator, tag: &str) {
        coordinator.state.fetched_version = tag.to_owned();
        coordinator.state.release_notes = "Bug fixes".to_owned();
        coordinator.state.has_latest_version = false;
    }

    #[tokio::test]
    async fn setup_twice_fails() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        assert_eq!(coordinator.setup().await.unwrap(), SetupOutcome::Ready);
        let err = coordinator.setup().await.unwrap_err();
        assert!(matches!(err, UpdaterError::Config(ref m) if m == "can't call setup twice"));
    }

    #[tokio::test]
    async fn setup_without_repo_fails() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(UpdaterOptions::default());
        assert!(coordinator.setup().await.unwrap_err().is_fatal());
        assert!(coordinator.config().is_none());
    }

    #[tokio::test]
    async fn setup_rejects_short_interval() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar().with_update_interval("20 seconds"));
        let err = coordinator.setup().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "config error: updateInterval must be `5 minutes` or more"
        );
    }

    #[tokio::test]
    async fn development_build_validates_but_stays_inactive() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p).unpackaged(), ScriptedDialog::default());
        let mut coordinator = fx.coordinator(foo_bar());
        assert_eq!(
            coordinator.setup().await.unwrap(),
            SetupOutcome::DevelopmentBuild
        );
        assert_eq!(coordinator.config().unwrap().update_interval, "10 minutes");
        assert_eq!(coordinator.phase(), UpdatePhase::Configured);
        assert!(coordinator.run().is_err());
    }

    #[tokio::test]
    async fn unsupported_platform_stays_inactive() {
        let fx = Fixture::packaged();
        let mut coordinator = fx
            .coordinator(foo_bar())
            .with_platform(Platform::Other("linux".to_owned()));
        assert_eq!(
            coordinator.setup().await.unwrap(),
            SetupOutcome::UnsupportedPlatform
        );
        assert_eq!(coordinator.phase(), UpdatePhase::Configured);
    }

    #[tokio::test]
    async fn setup_waits_for_ready_exactly_once() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p).not_ready(), ScriptedDialog::default());
        let mut coordinator = fx.coordinator(foo_bar());
        let host = fx.host.clone();

        let setup = tokio::spawn(async move {
            let outcome = coordinator.setup().await;
            (coordinator, outcome)
        });
        while host.ready_waits() == 0 {
            tokio::task::yield_now().await;
        }
        host.make_ready();

        let (coordinator, outcome) = setup.await.unwrap();
        assert_eq!(outcome.unwrap(), SetupOutcome::Ready);
        assert_eq!(host.ready_waits(), 1);
        assert_eq!(coordinator.phase(), UpdatePhase::Polling);
    }

    #[tokio::test]
    async fn ready_host_is_not_waited_on() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        assert_eq!(fx.host.ready_waits(), 0);
    }

    #[tokio::test]
    async fn check_before_setup_is_an_error() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        assert!(coordinator.check_for_updates().await.is_err());
        assert_eq!(coordinator.phase(), UpdatePhase::Uninitialized);
    }

    #[tokio::test]
    async fn paused_and_downloading_cycles_are_skipped() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();

        coordinator.state.paused = true;
        assert_eq!(
            coordinator.check_for_updates().await.unwrap(),
            CheckOutcome::Skipped(SkipReason::Paused)
        );

        coordinator.handle_event(FacilityEvent::UpdateAvailable);
        assert_eq!(
            coordinator.check_for_updates().await.unwrap(),
            CheckOutcome::Skipped(SkipReason::Downloading)
        );
        assert!(fx.facility.feed_urls().is_empty());
    }

    #[tokio::test]
    async fn accepting_download_starts_facility_check() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::answering([0]));
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        found(&mut coordinator, "v1.0.0");

        assert_eq!(coordinator.prompt_download(), CheckOutcome::PromptOpened);
        assert_eq!(coordinator.phase(), UpdatePhase::AwaitingDownloadConfirm);
        coordinator.settle_prompts().await;

        assert_eq!(fx.facility.checks(), 1);
        assert!(!coordinator.state().paused);
        assert!(!coordinator.state().is_prompt_open);

        let shown = fx.dialogs.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].buttons, vec!["Download update", "Later"]);
        assert_eq!(shown[0].title, "Application Update");
        assert_eq!(shown[0].message, "v1.0.0");
        assert_eq!(
            shown[0].detail,
            "A new version have been released.\n\nBug fixes\n"
        );
    }

    #[tokio::test]
    async fn declining_download_pauses() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::answering([1]));
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        found(&mut coordinator, "v1.0.0");

        coordinator.prompt_download();
        coordinator.settle_prompts().await;

        assert!(coordinator.state().paused);
        assert_eq!(fx.facility.checks(), 0);
        assert_eq!(coordinator.phase(), UpdatePhase::Paused);
    }

    #[tokio::test]
    async fn second_download_prompt_is_suppressed() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        found(&mut coordinator, "v1.0.0");

        assert_eq!(coordinator.prompt_download(), CheckOutcome::PromptOpened);
        assert_eq!(coordinator.prompt_download(), CheckOutcome::PromptAlreadyOpen);
        coordinator.settle_prompts().await;
        assert_eq!(fx.dialogs.shown().len(), 1);
        assert_eq!(fx.facility.checks(), 1);
    }

    #[tokio::test]
    async fn dialog_failure_closes_prompt_without_pausing() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::failing());
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        found(&mut coordinator, "v1.0.0");

        coordinator.prompt_download();
        coordinator.settle_prompts().await;
        assert!(!coordinator.state().is_prompt_open);
        assert!(!coordinator.state().paused);
        assert_eq!(fx.facility.checks(), 0);
    }

    fn downloaded() -> FacilityEvent {
        FacilityEvent::UpdateDownloaded {
            notes: "Fixed crash on launch".to_owned(),
            name: "v1.0.0".to_owned(),
            date: None,
            url: "https://github.com/foo/bar/releases/download/v1.0.0".to_owned(),
        }
    }

    #[tokio::test]
    async fn restart_prompt_shows_notes_on_windows() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::answering([0]));
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();

        coordinator.handle_event(FacilityEvent::UpdateAvailable);
        coordinator.handle_event(downloaded());
        assert_eq!(coordinator.phase(), UpdatePhase::AwaitingRestartConfirm);
        coordinator.settle_prompts().await;

        let shown = fx.dialogs.shown();
        assert_eq!(shown[0].buttons, vec!["Restart", "Later"]);
        assert_eq!(shown[0].message, "Fixed crash on launch");
        assert_eq!(shown[0].detail, DOWNLOADED_DETAIL);
        assert_eq!(fx.facility.installs(), 1);
    }

    #[tokio::test]
    async fn restart_prompt_shows_name_on_macos() {
        let fx = Fixture::new(|p| FakeHost::new("0.0.1", p), ScriptedDialog::answering([1]));
        let mut coordinator = fx.coordinator(foo_bar()).with_platform(Platform::MacOs);
        coordinator.setup().await.unwrap();

        coordinator.handle_event(downloaded());
        coordinator.settle_prompts().await;

        assert_eq!(fx.dialogs.shown()[0].message, "v1.0.0");
        assert_eq!(fx.facility.installs(), 0);
    }

    #[tokio::test]
    async fn no_restart_prompt_when_disabled() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar().with_notify_before_apply(false));
        coordinator.setup().await.unwrap();

        coordinator.handle_event(downloaded());
        coordinator.settle_prompts().await;
        assert!(fx.dialogs.shown().is_empty());
        assert_eq!(fx.facility.installs(), 0);
    }

    #[tokio::test]
    async fn facility_error_reopens_checks() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();

        coordinator.handle_event(FacilityEvent::UpdateAvailable);
        assert_eq!(coordinator.phase(), UpdatePhase::Downloading);
        coordinator.handle_event(FacilityEvent::Error("signature mismatch".to_owned()));
        assert!(!coordinator.state().is_downloading);
        assert_eq!(coordinator.phase(), UpdatePhase::Polling);
    }

    #[tokio::test]
    async fn reconfigure_lifts_pause_and_applies_interval() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        coordinator.setup().await.unwrap();
        coordinator.state.paused = true;

        coordinator
            .reconfigure(&UpdaterOptions::default().with_update_interval("30 minutes"))
            .unwrap();
        assert!(!coordinator.state().paused);
        assert_eq!(coordinator.interval(), Duration::from_secs(1800));
        assert_eq!(coordinator.config().unwrap().user, "foo");
    }

    #[tokio::test]
    async fn reconfigure_before_setup_fails() {
        let fx = Fixture::packaged();
        let mut coordinator = fx.coordinator(foo_bar());
        assert!(coordinator.reconfigure(&foo_bar()).is_err());
    }

    #[test]
    fn initial_state() {
        let state = CoordinatorState::default();
        assert!(state.has_latest_version);
        assert_eq!(state.fetched_version, "0.0.0");
        assert!(!state.paused);
        assert!(!state.is_downloading);
        assert!(!state.is_prompt_open);
    }
}
