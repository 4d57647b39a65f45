//! # Presentation Boundary
//!
//! What the session tells the UI. Callbacks run on the session loop, one at
//! a time and in the order the outcomes were applied. None fire after
//! teardown.

use tokio::sync::mpsc;
use trailblazr_core::{ConnectionError, FetchError, Route, SubmissionError};

/// Receiver of session outcomes.
pub trait SyncListener: Send + 'static {
    /// A fetch succeeded. `routes` is the new catalog in store order and may
    /// be empty.
    fn on_catalog_ready(&mut self, routes: &[Route]);

    /// The probe failed; no fetch was attempted.
    fn on_connectivity_failed(&mut self, error: &ConnectionError);

    /// The probe succeeded but the catalog read failed. Any previously
    /// delivered catalog is still current.
    fn on_fetch_failed(&mut self, _error: &FetchError) {}

    /// A submission accepted by the session finished.
    fn on_submission_result(&mut self, result: &Result<(), SubmissionError>);
}

/// An owned copy of one listener callback.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    CatalogReady(Vec<Route>),
    ConnectivityFailed(ConnectionError),
    FetchFailed(FetchError),
    SubmissionResult(Result<(), SubmissionError>),
}

/// Forwards every callback as a [`SyncEvent`] over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelListener {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("sync event dropped, receiver gone");
        }
    }
}

impl SyncListener for ChannelListener {
    fn on_catalog_ready(&mut self, routes: &[Route]) {
        self.forward(SyncEvent::CatalogReady(routes.to_vec()));
    }

    fn on_connectivity_failed(&mut self, error: &ConnectionError) {
        self.forward(SyncEvent::ConnectivityFailed(error.clone()));
    }

    fn on_fetch_failed(&mut self, error: &FetchError) {
        self.forward(SyncEvent::FetchFailed(error.clone()));
    }

    fn on_submission_result(&mut self, result: &Result<(), SubmissionError>) {
        self.forward(SyncEvent::SubmissionResult(result.clone()));
    }
}
