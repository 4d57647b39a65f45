//! # trailblazr-state — Sync Session State Machine
//!
//! Tracks where a screen session is in its probe → fetch → submit lifecycle.
//! The orchestrator owns exactly one [`SessionMachine`] per session and
//! consults it before launching any store operation.
//!
//! ## State Machines
//!
//! - **Session** (`session.rs`): `Idle → Probing → {Connected, Unreachable}
//!   → Fetching → {Ready, FetchFailed} → Submitting → {SubmitSucceeded,
//!   SubmitFailed} → Ready`, plus the terminal `Closed` reached on teardown.

pub mod session;

pub use session::{SessionMachine, SyncState, TransitionError, TransitionRecord};
