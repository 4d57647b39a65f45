//! # Sync Session
//!
//! One session per screen. The session loop is the only task that touches
//! the state machine, the held catalog and the listener. Store I/O runs in
//! tasks spawned onto a `JoinSet`; each returns its outcome to the loop and
//! never mutates session state itself.
//!
//! ## Lifecycle
//!
//! ```text
//! refresh:  Idle|Ready -> Probing -> Connected -> Fetching -> Ready
//!                                \-> Unreachable -> (Ready | Idle)
//!                                            Fetching -> FetchFailed -> (Ready | Idle)
//! submit:   Ready -> Submitting -> SubmitSucceeded|SubmitFailed -> Ready
//! teardown: any -> Closed
//! ```
//!
//! There is no automatic retry and no refresh after a rating change. A failed
//! fetch keeps the previously held catalog.
//!
//! ## Cancellation
//!
//! The session owns a [`CancellationToken`]. Every I/O task runs under a
//! child token. Teardown cancels the token, aborts and joins the I/O tasks,
//! and drops their results. No listener callback runs after
//! [`SyncHandle::teardown`] returns, whichever handle called it.
//!
//! An I/O task that panics is treated as a failure of the operation it was
//! running, so the session still settles.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use trailblazr_core::{ConnectionError, FetchError, StoreError, SubmissionError};
use trailblazr_state::{SessionMachine, SyncState, TransitionRecord};
use trailblazr_store::StoreClient;
use uuid::Uuid;

use crate::listener::SyncListener;
use crate::rating::{RatingRequest, RatingSubmissionService};
use crate::repository::{Catalog, RouteRepository};
use crate::telemetry;

/// Capacity of the command channel between handles and the loop.
const COMMAND_BUFFER: usize = 32;

// ─── Public types ────────────────────────────────────────────────────

/// Errors returned by [`SyncHandle`] commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The session has been torn down.
    #[error("sync session is closed")]
    SessionClosed,

    /// The submission was refused without issuing a write.
    #[error(transparent)]
    Rejected(#[from] SubmissionError),
}

/// Whether a refresh trigger started a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started,
    /// An operation is already in flight.
    Ignored { state: SyncState },
}

/// Point-in-time view of a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Uuid,
    pub state: SyncState,
    /// The catalog currently held, if any fetch has succeeded.
    pub catalog: Option<Catalog>,
    pub transitions: Vec<TransitionRecord>,
}

impl SessionSnapshot {
    /// Whether the session has ever entered `state`.
    pub fn visited(&self, state: SyncState) -> bool {
        self.transitions.iter().any(|t| t.to_state == state)
    }
}

// ─── Commands and outcomes ───────────────────────────────────────────

enum Command {
    Refresh {
        reply: oneshot::Sender<RefreshOutcome>,
    },
    Submit {
        selected: Option<String>,
        rating: f64,
        reply: oneshot::Sender<Result<(), SubmissionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

enum Outcome {
    Probed(Result<(), ConnectionError>),
    Fetched(Result<Catalog, FetchError>),
    Submitted(Result<(), SubmissionError>),
}

enum Wake {
    Cancelled,
    Command(Option<Command>),
    Joined(Result<Option<Outcome>, JoinError>),
}

// ─── Handle ──────────────────────────────────────────────────────────

/// Cloneable handle to a running session.
///
/// Dropping every handle closes the session the same way
/// [`SyncHandle::teardown`] does.
#[derive(Clone)]
pub struct SyncHandle {
    session: Uuid,
    commands: mpsc::Sender<Command>,
    token: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<SessionSnapshot>>>>,
    /// Flips to `true` once the loop has dropped its listener.
    finished: watch::Receiver<bool>,
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("session", &self.session)
            .field("closed", &self.token.is_cancelled())
            .finish()
    }
}

impl SyncHandle {
    /// Start a session loop on the current tokio runtime.
    pub fn spawn(store: Arc<dyn StoreClient>, listener: impl SyncListener) -> Self {
        let session = Uuid::new_v4();
        let token = CancellationToken::new();
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (finished_tx, finished) = watch::channel(false);

        let session_loop = SessionLoop {
            session,
            machine: SessionMachine::new(),
            catalog: None,
            listener: Box::new(listener),
            repository: RouteRepository::new(store.clone()),
            ratings: RatingSubmissionService::new(store.clone()),
            store,
            token: token.clone(),
            tasks: JoinSet::new(),
            finished: finished_tx,
        };
        let span = tracing::info_span!("sync_session", session = %session);
        let task = tokio::spawn(session_loop.run(rx).instrument(span));

        Self {
            session,
            commands,
            token,
            task: Arc::new(Mutex::new(Some(task))),
            finished,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    /// Refresh trigger: probe, then fetch on success.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SyncError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// Submit trigger. Returns once the session has accepted or refused the
    /// submission; the write's result arrives through
    /// [`SyncListener::on_submission_result`].
    pub async fn submit_rating(
        &self,
        selected: Option<&str>,
        rating: f64,
    ) -> Result<(), SyncError> {
        let selected = selected.map(str::to_string);
        self.request(|reply| Command::Submit {
            selected,
            rating,
            reply,
        })
        .await?
        .map_err(SyncError::Rejected)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SyncError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Cancel in-flight work and wait for the loop to finish.
    ///
    /// Returns the final snapshot to the first caller. Later calls and calls
    /// from other handles wait for the same loop to finish, then return
    /// `None`.
    pub async fn teardown(&self) -> Option<SessionSnapshot> {
        self.token.cancel();
        let task = self.task.lock().take();
        let Some(task) = task else {
            let mut finished = self.finished.clone();
            // Err means the loop ended without signalling, which is also final.
            let _ = finished.wait_for(|done| *done).await;
            return None;
        };
        match task.await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::error!(session = %self.session, error = %e, "sync session task failed");
                None
            }
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SyncError> {
        if self.token.is_cancelled() {
            return Err(SyncError::SessionClosed);
        }
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        rx.await.map_err(|_| SyncError::SessionClosed)
    }
}

// ─── Session loop ────────────────────────────────────────────────────

struct SessionLoop {
    session: Uuid,
    machine: SessionMachine,
    catalog: Option<Catalog>,
    listener: Box<dyn SyncListener>,
    repository: RouteRepository,
    ratings: RatingSubmissionService,
    store: Arc<dyn StoreClient>,
    token: CancellationToken,
    tasks: JoinSet<Option<Outcome>>,
    finished: watch::Sender<bool>,
}

impl SessionLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> SessionSnapshot {
        tracing::debug!("sync session started");
        loop {
            let wake = tokio::select! {
                biased;
                _ = self.token.cancelled() => Wake::Cancelled,
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => Wake::Joined(joined),
                command = commands.recv() => Wake::Command(command),
            };
            match wake {
                Wake::Cancelled | Wake::Command(None) => break,
                Wake::Command(Some(command)) => self.on_command(command),
                Wake::Joined(Ok(Some(outcome))) => self.on_outcome(outcome),
                Wake::Joined(Ok(None)) => {}
                Wake::Joined(Err(e)) => self.on_task_failed(e),
            }
        }
        commands.close();
        self.close().await
    }

    async fn close(mut self) -> SessionSnapshot {
        self.token.cancel();
        self.tasks.shutdown().await;
        self.transition(SyncState::Closed, Some("teardown".into()));
        self.catalog = None;
        tracing::info!("sync session closed");
        let snapshot = self.snapshot();
        drop(self.listener);
        self.finished.send_replace(true);
        snapshot
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            state: self.machine.state(),
            catalog: self.catalog.clone(),
            transitions: self.machine.transition_log().to_vec(),
        }
    }

    fn transition(&mut self, to: SyncState, reason: Option<String>) {
        if let Err(e) = self.machine.try_transition(to, reason) {
            tracing::error!(error = %e, "session transition rejected");
        }
    }

    fn settle(&mut self) {
        if let Err(e) = self.machine.settle(self.catalog.is_some()) {
            tracing::error!(error = %e, "session could not settle");
        }
    }

    /// Run `operation` under a child token and hand its value back to the loop.
    fn spawn_io<T, F>(&mut self, operation: F, into: fn(T) -> Outcome)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.token.child_token();
        self.tasks.spawn(
            async move {
                tokio::select! {
                    _ = token.cancelled() => None,
                    value = operation => Some(into(value)),
                }
            }
            .in_current_span(),
        );
    }

    // ── Commands ────────────────────────────────────────────────────

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Refresh { reply } => {
                let outcome = self.refresh();
                let _ = reply.send(outcome);
            }
            Command::Submit {
                selected,
                rating,
                reply,
            } => {
                let accepted = self.submit(selected.as_deref(), rating);
                let _ = reply.send(accepted);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn refresh(&mut self) -> RefreshOutcome {
        let state = self.machine.state();
        if !state.accepts_refresh() {
            tracing::debug!(%state, "refresh ignored, operation in flight");
            return RefreshOutcome::Ignored { state };
        }
        self.transition(SyncState::Probing, Some("refresh".into()));
        let store = self.store.clone();
        self.spawn_io(async move { store.probe().await }, Outcome::Probed);
        RefreshOutcome::Started
    }

    fn submit(&mut self, selected: Option<&str>, rating: f64) -> Result<(), SubmissionError> {
        let refused = match self.machine.state() {
            SyncState::Ready => None,
            SyncState::Submitting => Some(SubmissionError::SubmissionInProgress),
            other => Some(SubmissionError::CatalogNotReady {
                state: other.name().to_string(),
            }),
        };
        if let Some(e) = refused {
            tracing::debug!(error = %e, "submission refused");
            telemetry::submission(&Err(e.clone()));
            return Err(e);
        }

        self.transition(SyncState::Submitting, selected.map(|s| format!("rate {s}")));
        match RatingRequest::validate(selected, rating) {
            Ok(request) => {
                let ratings = self.ratings.clone();
                self.spawn_io(
                    async move { ratings.apply(&request).await },
                    Outcome::Submitted,
                );
                Ok(())
            }
            Err(e) => {
                let result = Err(e.clone());
                telemetry::submission(&result);
                self.finish_submission(result);
                Err(e)
            }
        }
    }

    // ── Outcomes ────────────────────────────────────────────────────

    fn on_outcome(&mut self, outcome: Outcome) {
        let state = self.machine.state();
        let expected = match outcome {
            Outcome::Probed(_) => SyncState::Probing,
            Outcome::Fetched(_) => SyncState::Fetching,
            Outcome::Submitted(_) => SyncState::Submitting,
        };
        if state != expected {
            tracing::warn!(%state, %expected, "dropping store outcome for another state");
            return;
        }

        match outcome {
            Outcome::Probed(Ok(())) => {
                telemetry::probe(true);
                self.transition(SyncState::Connected, None);
                self.transition(SyncState::Fetching, None);
                let repository = self.repository.clone();
                self.spawn_io(
                    async move { repository.fetch_all().await },
                    Outcome::Fetched,
                );
            }
            Outcome::Probed(Err(e)) => {
                telemetry::probe(false);
                tracing::warn!(error = %e, "route store unreachable");
                self.transition(SyncState::Unreachable, Some(e.to_string()));
                self.listener.on_connectivity_failed(&e);
                self.settle();
            }
            Outcome::Fetched(Ok(catalog)) => {
                self.transition(
                    SyncState::Ready,
                    Some(format!("{} routes", catalog.len())),
                );
                self.listener.on_catalog_ready(catalog.routes());
                self.catalog = Some(catalog);
            }
            Outcome::Fetched(Err(e)) => {
                self.transition(SyncState::FetchFailed, Some(e.to_string()));
                self.listener.on_fetch_failed(&e);
                self.settle();
            }
            Outcome::Submitted(result) => self.finish_submission(result),
        }
    }

    /// An I/O task ended without an outcome. Only one runs at a time, so the
    /// current state names the operation, which then takes its failure path.
    fn on_task_failed(&mut self, error: JoinError) {
        let state = self.machine.state();
        tracing::error!(error = %error, %state, "store task failed");
        let lost = ConnectionError {
            endpoint: self.store.endpoint().to_string(),
            reason: if error.is_panic() {
                "store task panicked".to_string()
            } else {
                "store task was cancelled".to_string()
            },
        };
        let outcome = match state {
            SyncState::Probing => Outcome::Probed(Err(lost)),
            SyncState::Fetching => {
                telemetry::fetch(false);
                Outcome::Fetched(Err(FetchError(StoreError::Connection(lost))))
            }
            SyncState::Submitting => {
                let result = Err(SubmissionError::Store(StoreError::Connection(lost)));
                telemetry::submission(&result);
                Outcome::Submitted(result)
            }
            _ => return,
        };
        self.on_outcome(outcome);
    }

    fn finish_submission(&mut self, result: Result<(), SubmissionError>) {
        match &result {
            Ok(()) => self.transition(SyncState::SubmitSucceeded, None),
            Err(e) => self.transition(SyncState::SubmitFailed, Some(e.to_string())),
        }
        self.listener.on_submission_result(&result);
        self.transition(SyncState::Ready, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ChannelListener, SyncEvent};
    use trailblazr_core::{Route, RouteName};
    use trailblazr_store::MemoryStoreClient;

    fn route(name: &str, rating: f64) -> Route {
        Route::new(RouteName::new(name).unwrap(), 2.0, "10 min", "20 min", rating).unwrap()
    }

    fn start(store: &MemoryStoreClient) -> (SyncHandle, mpsc::UnboundedReceiver<SyncEvent>) {
        let (listener, events) = ChannelListener::channel();
        (SyncHandle::spawn(Arc::new(store.clone()), listener), events)
    }

    // ── Refresh ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn refresh_delivers_catalog_and_settles_ready() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0), &route("B", 4.0)]);
        let (handle, mut events) = start(&store);

        assert_eq!(handle.refresh().await.unwrap(), RefreshOutcome::Started);
        match events.recv().await.unwrap() {
            SyncEvent::CatalogReady(routes) => assert_eq!(routes.len(), 2),
            other => panic!("unexpected event {other:?}"),
        }
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.state, SyncState::Ready);
        assert_eq!(snap.catalog.as_ref().map(|c| c.len()), Some(2));
        assert!(snap.visited(SyncState::Connected));
        handle.teardown().await;
    }

    #[tokio::test]
    async fn refresh_is_ignored_while_busy() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0)]);
        store.pause_reads();
        let (handle, mut events) = start(&store);

        handle.refresh().await.unwrap();
        // Wait until the fetch is actually blocked in the store.
        while store.stats().reads == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            handle.refresh().await.unwrap(),
            RefreshOutcome::Ignored {
                state: SyncState::Fetching
            }
        );
        store.resume_reads();
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::CatalogReady(_)
        ));
        assert_eq!(store.stats().probes, 1);
        handle.teardown().await;
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_catalog() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0)]);
        let (handle, mut events) = start(&store);
        handle.refresh().await.unwrap();
        events.recv().await.unwrap();

        store.set_fail_queries(true);
        handle.refresh().await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::FetchFailed(_)
        ));
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.state, SyncState::Ready);
        assert_eq!(snap.catalog.map(|c| c.len()), Some(1));
        handle.teardown().await;
    }

    // ── Submit ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn submit_before_catalog_is_not_ready() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0)]);
        let (handle, _events) = start(&store);
        let err = handle.submit_rating(Some("A"), 4.0).await.unwrap_err();
        assert_eq!(
            err,
            SyncError::Rejected(SubmissionError::CatalogNotReady {
                state: "IDLE".into()
            })
        );
        assert_eq!(store.stats().writes, 0);
        handle.teardown().await;
    }

    #[tokio::test]
    async fn precondition_failure_returns_to_ready() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0)]);
        let (handle, mut events) = start(&store);
        handle.refresh().await.unwrap();
        events.recv().await.unwrap();

        let err = handle.submit_rating(None, 4.0).await.unwrap_err();
        assert_eq!(err, SyncError::Rejected(SubmissionError::NoRouteSelected));
        assert_eq!(
            events.recv().await.unwrap(),
            SyncEvent::SubmissionResult(Err(SubmissionError::NoRouteSelected))
        );
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.state, SyncState::Ready);
        assert!(snap.visited(SyncState::SubmitFailed));
        assert_eq!(store.stats().writes, 0);
        handle.teardown().await;
    }

    // ── Teardown ────────────────────────────────────────────────────

    #[tokio::test]
    async fn commands_after_teardown_fail() {
        let store = MemoryStoreClient::new();
        let (handle, _events) = start(&store);
        let snap = handle.teardown().await.unwrap();
        assert_eq!(snap.state, SyncState::Closed);
        assert_eq!(handle.refresh().await, Err(SyncError::SessionClosed));
        assert!(handle.teardown().await.is_none());
    }

    #[tokio::test]
    async fn every_teardown_caller_waits_for_the_loop() {
        let store = MemoryStoreClient::with_routes([&route("A", 3.0)]);
        store.pause_reads();
        let (handle, mut events) = start(&store);
        handle.refresh().await.unwrap();
        while store.stats().reads == 0 {
            tokio::task::yield_now().await;
        }

        let other = handle.clone();
        let first = tokio::spawn(async move { other.teardown().await });
        let second = handle.teardown().await;
        // Whichever call returned here, the listener is already gone.
        assert!(matches!(
            events.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        let first = first.await.unwrap();
        assert!(first.is_some() != second.is_some());
        let stats = store.stats();
        assert_eq!(stats.connections_opened, stats.connections_released);
    }

    #[tokio::test]
    async fn dropping_every_handle_closes_the_session() {
        let store = MemoryStoreClient::new();
        let (handle, mut events) = start(&store);
        let clone = handle.clone();
        drop(handle);
        drop(clone);
        // The listener is dropped with the loop, which closes the channel.
        assert!(events.recv().await.is_none());
    }
}
