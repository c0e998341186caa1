use crate::api::CanvasClient;
use crate::config::{Config, ConfigStore};
use crate::error::FetchError;
use crate::fetcher::{self, CycleHandle, WorkerEvent};
use crate::sink::UpdateSink;
use crate::theme::{SyncOutcome, ThemeSync, DEFAULT_THEME};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const EVENT_CHANNEL_SIZE: usize = 16;
const MANUAL_CHANNEL_SIZE: usize = 4;

/// Scheduler states. A tick or manual trigger while a cycle is active is
/// dropped, not queued, so bursts of refresh clicks never pile up work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    CycleActive,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Tick,
    Manual,
}

/// Control handle for the running scheduler, safe to hand to UI callbacks.
#[derive(Clone)]
pub struct SchedulerHandle {
    manual_tx: mpsc::Sender<()>,
    shutdown: CancellationToken,
}

impl SchedulerHandle {
    /// Request a refresh now. Dropped if the trigger queue is full or a
    /// cycle is already active.
    pub fn trigger_refresh(&self) {
        let _ = self.manual_tx.try_send(());
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Drives refresh cycles on a fixed interval and on manual request, checks
/// theme drift on the same cadence, and owns teardown. This is the single
/// task that touches the UI Update Sink; the fetch worker only ever hands
/// it immutable snapshots over a channel.
pub struct RefreshScheduler {
    client: CanvasClient,
    store: ConfigStore,
    config: Config,
    sink: Arc<dyn UpdateSink>,
    theme_sync: Arc<ThemeSync>,
    state: SchedulerState,
    active: Option<CycleHandle>,
    events_tx: mpsc::Sender<WorkerEvent>,
    events_rx: mpsc::Receiver<WorkerEvent>,
    manual_rx: mpsc::Receiver<()>,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(
        client: CanvasClient,
        store: ConfigStore,
        config: Config,
        sink: Arc<dyn UpdateSink>,
    ) -> (Self, SchedulerHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (manual_tx, manual_rx) = mpsc::channel(MANUAL_CHANNEL_SIZE);
        let shutdown = CancellationToken::new();

        let handle = SchedulerHandle {
            manual_tx,
            shutdown: shutdown.clone(),
        };
        let scheduler = Self {
            client,
            store,
            config,
            sink,
            theme_sync: Arc::new(ThemeSync::new()),
            state: SchedulerState::Idle,
            active: None,
            events_tx,
            events_rx,
            manual_rx,
            shutdown,
        };
        (scheduler, handle)
    }

    /// Shared reconciliation machine, for a settings dialog that wants to
    /// apply a theme immediately after saving it.
    pub fn theme_sync(&self) -> Arc<ThemeSync> {
        self.theme_sync.clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run until shutdown, then tear down any active cycle within the grace
    /// period. The first interval tick fires immediately, so startup does an
    /// initial refresh.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_trigger(Trigger::Tick),
                Some(()) = self.manual_rx.recv() => self.on_trigger(Trigger::Manual),
                Some(event) = self.events_rx.recv() => self.on_event(event),
                _ = self.shutdown.cancelled() => break,
            }
        }

        // Teardown must never hang: bounded grace, then abort.
        if let Some(handle) = self.active.take() {
            info!("shutting down with a refresh cycle active");
            if handle.stop(self.config.shutdown_grace()).await {
                info!("active cycle stopped gracefully");
            } else {
                error!("active cycle exceeded the grace period and was aborted");
            }
        }
    }

    fn on_trigger(&mut self, trigger: Trigger) {
        // Theme drift is checked on every trigger, whether or not a data
        // cycle actually starts
        self.run_theme_check();

        match self.state {
            SchedulerState::CycleActive => {
                debug!("refresh cycle already active, dropping {:?} trigger", trigger);
            }
            SchedulerState::Idle => {
                debug!("starting refresh cycle ({:?})", trigger);
                self.sink.status("Refreshing courses...");
                let handle = fetcher::start_cycle(self.client.clone(), self.events_tx.clone());
                self.active = Some(handle);
                self.state = SchedulerState::CycleActive;
            }
        }
    }

    fn on_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::ProfileFetched(profile) => self.sink.profile_updated(profile),
            WorkerEvent::CoursesFetched(courses) => self.sink.courses_updated(courses),
            WorkerEvent::Completed => {
                self.sink
                    .status(&format!("Last updated: {}", Local::now().format("%H:%M")));
                self.finish_cycle();
            }
            WorkerEvent::Failed(e) => {
                error!("refresh cycle failed: {}", e);
                self.sink.status(&e.to_string());
                self.finish_cycle();
            }
        }
    }

    /// Back to Idle; manual triggering works again. No automatic retry
    /// before the next tick.
    fn finish_cycle(&mut self) {
        self.active = None;
        self.state = SchedulerState::Idle;
    }

    fn run_theme_check(&mut self) {
        let configured = match self.store.read_theme() {
            Ok(theme) => theme,
            Err(e) => {
                let err = FetchError::Config(e.to_string());
                self.sink.status(&err.to_string());
                DEFAULT_THEME.to_string()
            }
        };
        match self.theme_sync.check_and_apply(&configured, self.sink.as_ref()) {
            SyncOutcome::Applied => info!("theme switched to '{}'", configured),
            SyncOutcome::Busy => debug!("theme application already in flight"),
            SyncOutcome::Unchanged => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn test_scheduler(dir: &std::path::Path) -> (RefreshScheduler, Arc<RecordingSink>) {
        let store = ConfigStore::at(dir.join("config.json"));
        let mut config = Config::default();
        config.theme = "dark".to_string();
        store.save(&config).unwrap();

        // Unroutable endpoint; these tests only exercise state transitions
        let client = CanvasClient::new("http://127.0.0.1:1", "token");
        let sink = Arc::new(RecordingSink::new());
        let (scheduler, _handle) = RefreshScheduler::new(client, store, config, sink.clone());
        (scheduler, sink)
    }

    #[tokio::test]
    async fn triggers_while_active_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scheduler, sink) = test_scheduler(dir.path());

        scheduler.on_trigger(Trigger::Manual);
        assert_eq!(scheduler.state(), SchedulerState::CycleActive);

        scheduler.on_trigger(Trigger::Tick);
        scheduler.on_trigger(Trigger::Manual);
        assert_eq!(scheduler.state(), SchedulerState::CycleActive);

        let refreshing = sink
            .statuses()
            .iter()
            .filter(|s| s.as_str() == "Refreshing courses...")
            .count();
        assert_eq!(refreshing, 1, "only the first trigger may start a cycle");
    }

    #[tokio::test]
    async fn failure_returns_to_idle_and_reenables_triggers() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scheduler, sink) = test_scheduler(dir.path());

        scheduler.on_trigger(Trigger::Manual);
        scheduler.on_event(WorkerEvent::Failed(FetchError::Auth));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(sink
            .statuses()
            .iter()
            .any(|s| s.contains("rejected the API token")));

        scheduler.on_trigger(Trigger::Manual);
        assert_eq!(scheduler.state(), SchedulerState::CycleActive);
        let refreshing = sink
            .statuses()
            .iter()
            .filter(|s| s.as_str() == "Refreshing courses...")
            .count();
        assert_eq!(refreshing, 2);
    }

    #[tokio::test]
    async fn theme_checked_even_when_cycle_active() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scheduler, sink) = test_scheduler(dir.path());

        scheduler.on_trigger(Trigger::Manual);
        assert_eq!(sink.themes_applied(), vec!["dark".to_string()]);

        // External theme change while a cycle is running
        scheduler.store.write_theme("nord").unwrap();
        scheduler.on_trigger(Trigger::Tick);
        assert_eq!(
            sink.themes_applied(),
            vec!["dark".to_string(), "nord".to_string()]
        );
        assert_eq!(scheduler.state(), SchedulerState::CycleActive);
    }

    #[tokio::test]
    async fn unchanged_theme_is_not_repushed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scheduler, sink) = test_scheduler(dir.path());

        scheduler.on_trigger(Trigger::Manual);
        scheduler.on_event(WorkerEvent::Failed(FetchError::Auth));
        scheduler.on_trigger(Trigger::Tick);

        assert_eq!(sink.themes_applied(), vec!["dark".to_string()]);
    }

    #[tokio::test]
    async fn unreadable_store_falls_back_to_default_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let store = ConfigStore::at(&path);
        let client = CanvasClient::new("http://127.0.0.1:1", "token");
        let sink = Arc::new(RecordingSink::new());
        let (mut scheduler, _handle) =
            RefreshScheduler::new(client, store, Config::default(), sink.clone());

        scheduler.on_trigger(Trigger::Tick);
        assert_eq!(sink.themes_applied(), vec!["light".to_string()]);
        assert!(sink
            .statuses()
            .iter()
            .any(|s| s.contains("Configuration error")));
    }

    #[tokio::test]
    async fn completion_events_update_sink_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scheduler, sink) = test_scheduler(dir.path());

        scheduler.on_trigger(Trigger::Manual);
        scheduler.on_event(WorkerEvent::CoursesFetched(Vec::new()));
        scheduler.on_event(WorkerEvent::Completed);

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(sink.course_updates().len(), 1);
        assert!(sink
            .statuses()
            .iter()
            .any(|s| s.starts_with("Last updated:")));
    }
}
