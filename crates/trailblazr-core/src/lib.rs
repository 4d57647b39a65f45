//! # trailblazr-core — Foundational Types for Trailblazr
//!
//! Leaf crate of the workspace. Defines the route entity that flows from the
//! remote route store to the presentation layer, the validated newtypes used
//! at the rating-submission boundary, and the complete error taxonomy shared
//! by the store client, the repository, the rating service, and the
//! orchestrator.
//!
//! ## Key Design Principles
//!
//! 1. **Routes are values.** A [`Route`] is rebuilt on every catalog fetch.
//!    Nothing holds references into a previous catalog.
//!
//! 2. **The route name is the natural key.** Updates address a route by
//!    [`RouteName`], never by a numeric row id.
//!
//! 3. **Errors carry strings, not driver objects.** Every error type is
//!    `Clone + PartialEq` so it can travel inside presentation events.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `trailblazr-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod map;
pub mod route;

pub use error::{
    ConnectionError, FetchError, QueryError, RowError, StoreError, SubmissionError,
    ValidationError,
};
pub use map::{GeoPoint, MapViewport};
pub use route::{Rating, Route, RouteName, MAX_RATING};
