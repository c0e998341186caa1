use crate::api::CanvasClient;
use crate::error::FetchError;
use crate::models::{CourseSnapshot, ProfileSnapshot};
use indexmap::IndexMap;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one refresh cycle. At most one cycle is ever Running;
/// the scheduler enforces that, not the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
    Cancelling,
    Completed,
    Failed,
}

/// Events the worker emits back to the scheduler. Profile and courses are
/// independent: either can arrive without the other. Completed/Failed is
/// always the final event of a cycle; a cancelled cycle emits nothing
/// further.
#[derive(Debug)]
pub enum WorkerEvent {
    ProfileFetched(ProfileSnapshot),
    CoursesFetched(Vec<CourseSnapshot>),
    Completed,
    Failed(FetchError),
}

/// Handle to an in-flight cycle: cancellation, state observation, teardown.
pub struct CycleHandle {
    cancel: CancellationToken,
    state: watch::Receiver<CycleState>,
    join: JoinHandle<()>,
}

impl CycleHandle {
    /// Request cooperative cancellation. The call currently in flight is not
    /// aborted; its result is discarded and no further calls start.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel and wait up to `grace` for the task to stop on its own, then
    /// abort it. Returns whether the stop was graceful. Never hangs.
    pub async fn stop(mut self, grace: Duration) -> bool {
        self.cancel.cancel();
        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(_) => true,
            Err(_) => {
                warn!("fetch cycle did not stop within {:?}, aborting", grace);
                self.join.abort();
                false
            }
        }
    }
}

/// Spawn a background fetch cycle. The worker owns nothing shared: it hands
/// immutable snapshots to the scheduler over `events` and never touches
/// persisted configuration.
pub fn start_cycle(client: CanvasClient, events: mpsc::Sender<WorkerEvent>) -> CycleHandle {
    let cancel = CancellationToken::new();
    let (state_tx, state_rx) = watch::channel(CycleState::Idle);
    let task_cancel = cancel.clone();
    let join = tokio::spawn(async move {
        run_cycle(client, events, task_cancel, state_tx).await;
    });
    CycleHandle {
        cancel,
        state: state_rx,
        join,
    }
}

async fn run_cycle(
    client: CanvasClient,
    events: mpsc::Sender<WorkerEvent>,
    cancel: CancellationToken,
    state: watch::Sender<CycleState>,
) {
    let _ = state.send(CycleState::Running);

    // Profile is best-effort: a failure must not abort course fetching
    if cancel.is_cancelled() {
        let _ = state.send(CycleState::Cancelling);
        return;
    }
    match client.get_profile().await {
        Ok(profile) => {
            let _ = events.send(WorkerEvent::ProfileFetched(profile.into())).await;
        }
        Err(e) => warn!("profile fetch failed, continuing without it: {}", e),
    }

    if cancel.is_cancelled() {
        info!("refresh cycle cancelled before course list");
        let _ = state.send(CycleState::Cancelling);
        return;
    }
    let courses = match client.list_courses().await {
        Ok(courses) => courses,
        Err(e) => {
            let _ = state.send(CycleState::Failed);
            let _ = events.send(WorkerEvent::Failed(e)).await;
            return;
        }
    };
    debug!("fetched {} active courses", courses.len());

    // Grades are fetched one at a time to bound concurrent load on Canvas.
    // Keyed by course id to drop duplicates while preserving API order.
    let mut snapshots: IndexMap<u64, CourseSnapshot> = IndexMap::new();
    for course in courses {
        if cancel.is_cancelled() {
            info!("refresh cycle cancelled mid-grades, discarding partial results");
            let _ = state.send(CycleState::Cancelling);
            return;
        }
        let grade = match client.get_course_grade(course.id).await {
            Ok(grade) => grade,
            Err(e) => {
                warn!("grade unavailable for course {}: {}", course.id, e);
                None
            }
        };
        snapshots.insert(course.id, CourseSnapshot::from_course(course, grade));
    }

    if cancel.is_cancelled() {
        info!("refresh cycle cancelled after grades, discarding results");
        let _ = state.send(CycleState::Cancelling);
        return;
    }
    let _ = events
        .send(WorkerEvent::CoursesFetched(snapshots.into_values().collect()))
        .await;
    let _ = state.send(CycleState::Completed);
    let _ = events.send(WorkerEvent::Completed).await;
}
