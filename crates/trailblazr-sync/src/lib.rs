//! # trailblazr-sync — Route Sync and Rating Submission
//!
//! Everything between the route store and the screen:
//!
//! - [`RouteRepository`] reads the catalog, skipping malformed rows.
//! - [`RatingSubmissionService`] applies one rating to one named route.
//! - [`SyncHandle`] drives a per-screen session: probe, fetch, submit, and
//!   teardown, reporting results through a [`SyncListener`].
//! - [`UserNotice`] turns those results into messages.
//!
//! ## Concurrency
//!
//! Each session runs a single loop task that owns its state and catalog.
//! Store I/O runs on separate tasks that report back to that loop. Nothing
//! else writes session state, so no locks guard it.

pub mod listener;
pub mod notice;
pub mod rating;
pub mod repository;
pub mod session;
pub mod telemetry;

pub use listener::{ChannelListener, SyncEvent, SyncListener};
pub use notice::UserNotice;
pub use rating::{RatingRequest, RatingSubmissionService};
pub use repository::{Catalog, RouteRepository};
pub use session::{RefreshOutcome, SessionSnapshot, SyncError, SyncHandle};
