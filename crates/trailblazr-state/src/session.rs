//! # Session State Machine
//!
//! Models one screen session's interaction with the remote route store.
//!
//! ## States
//!
//! ```text
//! Idle ──refresh()──▶ Probing ──probe ok──▶ Connected ──▶ Fetching
//!                        │                                 │      │
//!                 probe failed                      fetch ok      fetch failed
//!                        ▼                                 ▼      ▼
//!                   Unreachable                         Ready   FetchFailed
//!
//! Unreachable, FetchFailed ──settle──▶ Ready (catalog held) | Idle (none)
//!
//! Ready ──refresh()──▶ Probing
//! Ready ──submit()───▶ Submitting ──▶ SubmitSucceeded | SubmitFailed ──▶ Ready
//!
//! any state except Closed ──teardown()──▶ Closed (terminal)
//! ```
//!
//! `Connected`, `Unreachable`, `FetchFailed`, `SubmitSucceeded` and
//! `SubmitFailed` are outcome states: they are recorded in the transition
//! log and immediately settle into `Fetching`, `Idle` or `Ready`.
//!
//! ## Design Decision
//!
//! The session uses an enum with validated transitions rather than typestate
//! types. The orchestrator's event loop holds the machine across `.await`
//! points and receives outcomes from background tasks at runtime, so the
//! current state is never known statically. `try_transition()` rejects
//! invalid edges at runtime and leaves the state untouched.
//!
//! ## Invariants
//!
//! - A refresh always passes through `Probing` before `Fetching`.
//! - `Submitting` is entered only from `Ready`, and at most once at a time.
//! - Submit outcomes return to `Ready`, never to `Fetching`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── States ──────────────────────────────────────────────────────────

/// Runtime state of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    /// No network activity yet.
    Idle,
    /// Connectivity probe in flight.
    Probing,
    /// Probe succeeded; fetch about to launch.
    Connected,
    /// Probe failed; no fetch will be attempted.
    Unreachable,
    /// Catalog read in flight.
    Fetching,
    /// A catalog is held and rendered.
    Ready,
    /// Catalog read failed; any previously held catalog is kept.
    FetchFailed,
    /// Rating write in flight.
    Submitting,
    /// Rating write acknowledged.
    SubmitSucceeded,
    /// Rating submission failed or was refused.
    SubmitFailed,
    /// Session torn down (terminal).
    Closed,
}

impl SyncState {
    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Probing => "PROBING",
            Self::Connected => "CONNECTED",
            Self::Unreachable => "UNREACHABLE",
            Self::Fetching => "FETCHING",
            Self::Ready => "READY",
            Self::FetchFailed => "FETCH_FAILED",
            Self::Submitting => "SUBMITTING",
            Self::SubmitSucceeded => "SUBMIT_SUCCEEDED",
            Self::SubmitFailed => "SUBMIT_FAILED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether a store operation is outstanding in this state.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Probing | Self::Connected | Self::Fetching | Self::Submitting
        )
    }

    /// Whether a refresh trigger may start a new probe from this state.
    pub fn accepts_refresh(&self) -> bool {
        matches!(self, Self::Idle | Self::Ready)
    }

    fn allows(self, to: SyncState) -> bool {
        use SyncState::*;
        if to == Closed {
            return self != Closed;
        }
        matches!(
            (self, to),
            (Idle, Probing)
                | (Probing, Connected)
                | (Probing, Unreachable)
                | (Connected, Fetching)
                | (Fetching, Ready)
                | (Fetching, FetchFailed)
                | (Unreachable, Idle)
                | (Unreachable, Ready)
                | (FetchFailed, Idle)
                | (FetchFailed, Ready)
                | (Ready, Probing)
                | (Ready, Submitting)
                | (Submitting, SubmitSucceeded)
                | (Submitting, SubmitFailed)
                | (SubmitSucceeded, Ready)
                | (SubmitFailed, Ready)
        )
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of a single state transition within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: SyncState,
    /// State after the transition.
    pub to_state: SyncState,
    /// When the transition occurred (UTC).
    pub timestamp: DateTime<Utc>,
    /// Human-readable reason for the transition.
    pub reason: Option<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Attempted transition is not allowed by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid session transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current state.
    pub from: SyncState,
    /// Attempted target state.
    pub to: SyncState,
}

// ─── The Machine ─────────────────────────────────────────────────────

/// Session state plus the log of every transition taken so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMachine {
    state: SyncState,
    transition_log: Vec<TransitionRecord>,
}

impl SessionMachine {
    /// Create a machine in `Idle` with an empty log.
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            transition_log: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Access the immutable transition log.
    pub fn transition_log(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    /// Whether the session has ever been in `state`.
    pub fn visited(&self, state: SyncState) -> bool {
        self.transition_log.iter().any(|t| t.to_state == state)
    }

    /// Attempt a state transition with runtime validation.
    ///
    /// Returns an error and leaves the state unchanged if the edge is not
    /// part of the machine. Records the transition on success.
    pub fn try_transition(
        &mut self,
        to: SyncState,
        reason: Option<String>,
    ) -> Result<(), TransitionError> {
        if !self.state.allows(to) {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }

        tracing::debug!(from = %self.state, to = %to, reason = ?reason, "session transition");
        self.transition_log.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Utc::now(),
            reason,
        });
        self.state = to;
        Ok(())
    }

    /// Leave an outcome state (`Unreachable`, `FetchFailed`) for the resting
    /// state that keeps the session usable.
    pub fn settle(&mut self, catalog_held: bool) -> Result<SyncState, TransitionError> {
        let to = if catalog_held {
            SyncState::Ready
        } else {
            SyncState::Idle
        };
        self.try_transition(to, None)?;
        Ok(to)
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
