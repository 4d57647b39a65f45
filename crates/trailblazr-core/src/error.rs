//! # Error Types — Pipeline Error Taxonomy
//!
//! Defines every error the route pipeline can surface. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Store failures are split into [`ConnectionError`] (handshake, socket,
//!   timeout) and [`QueryError`] (statement rejected by the store or rows
//!   that could not be decoded). [`StoreError`] is the union.
//! - [`FetchError`] wraps a store failure during a catalog read.
//! - [`RowError`] is recovered locally by the repository; it never reaches
//!   the presentation layer.
//! - [`SubmissionError`] distinguishes every rating-submission outcome so the
//!   UI can show distinct messages.
//! - Errors carry owned strings, so they are `Clone` and can be delivered
//!   inside presentation events.

use thiserror::Error;

// ─── Validation ──────────────────────────────────────────────────────

/// A value failed a domain invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Route names are the natural key and must not be blank.
    #[error("route name must not be empty")]
    EmptyRouteName,

    /// Distance must be finite and non-negative.
    #[error("route distance must be a finite, non-negative number of miles (got {0})")]
    InvalidDistance(f64),

    /// A stored aggregate rating fell outside `0..=5`.
    #[error("stored rating must be within 0..=5 (got {0})")]
    StoredRatingOutOfRange(f64),

    /// A submitted rating fell outside `(0, 5]`.
    #[error("rating must be greater than 0 and at most 5 (got {0})")]
    RatingOutOfRange(f64),
}

// ─── Store ───────────────────────────────────────────────────────────

/// The remote store could not be reached or dropped the connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("route store at {endpoint} unreachable: {reason}")]
pub struct ConnectionError {
    /// `host:port/database` of the store. Never contains credentials.
    pub endpoint: String,
    /// Driver-level failure description.
    pub reason: String,
}

/// The store rejected a statement, or returned rows that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("statement rejected by route store: {reason}")]
pub struct QueryError {
    pub reason: String,
}

/// Failure of a single store operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl StoreError {
    /// Whether the failure happened before the store could answer.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

// ─── Catalog fetch ───────────────────────────────────────────────────

/// The catalog read failed as a whole.
///
/// Distinct from an empty catalog, which is a successful fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("catalog fetch failed: {0}")]
pub struct FetchError(#[from] pub StoreError);

/// A single catalog row could not be turned into a route.
///
/// Rows failing with this error are skipped and logged; the rest of the
/// catalog is still returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// The column is absent from the row.
    #[error("column `{column}` is missing")]
    MissingColumn { column: &'static str },

    /// The column is present but NULL.
    #[error("column `{column}` is null")]
    NullColumn { column: &'static str },

    /// The column holds a value of the wrong type.
    #[error("column `{column}` holds {found}, expected {expected}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
        found: String,
    },

    /// The decoded values violate a route invariant.
    #[error("row rejected: {0}")]
    Invalid(#[from] ValidationError),
}

// ─── Rating submission ───────────────────────────────────────────────

/// Outcome of a rating submission that did not succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// No route is selected in the UI.
    #[error("no route selected")]
    NoRouteSelected,

    /// The rating is outside the star control's meaningful range.
    #[error("invalid rating {rating}: must be greater than 0 and at most 5")]
    InvalidRating { rating: f64 },

    /// The store matched no row with the selected name.
    #[error("route `{route}` not found")]
    RouteNotFound { route: String },

    /// The store matched more than one row; the name uniqueness invariant is broken.
    #[error("rating update for `{route}` affected {rows} rows, expected exactly one")]
    AmbiguousUpdate { route: String, rows: u64 },

    /// A submission is already outstanding for this session.
    #[error("a rating submission is already in progress")]
    SubmissionInProgress,

    /// Submissions are only accepted while a catalog is ready.
    #[error("cannot submit while session is {state}")]
    CatalogNotReady { state: String },

    /// The write itself failed.
    #[error("rating update failed: {0}")]
    Store(#[from] StoreError),
}

impl SubmissionError {
    /// Whether the submission was refused before any write was issued.
    pub fn rejected_before_write(&self) -> bool {
        matches!(
            self,
            Self::NoRouteSelected
                | Self::InvalidRating { .. }
                | Self::SubmissionInProgress
                | Self::CatalogNotReady { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> ConnectionError {
        ConnectionError {
            endpoint: "db.example:5432/trailblazr".into(),
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn connection_error_display_names_endpoint() {
        let msg = connection().to_string();
        assert!(msg.contains("db.example:5432/trailblazr"), "got: {msg}");
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn store_error_is_transparent() {
        let err = StoreError::from(connection());
        assert_eq!(err.to_string(), connection().to_string());
        assert!(err.is_connection());
        assert!(!StoreError::from(QueryError { reason: "syntax".into() }).is_connection());
    }

    #[test]
    fn fetch_error_wraps_store_error() {
        let err = FetchError::from(StoreError::from(connection()));
        assert!(err.to_string().starts_with("catalog fetch failed"));
        assert!(err.0.is_connection());
    }

    #[test]
    fn row_error_from_validation() {
        let err = RowError::from(ValidationError::EmptyRouteName);
        assert!(matches!(err, RowError::Invalid(ValidationError::EmptyRouteName)));
    }

    #[test]
    fn precondition_failures_are_rejected_before_write() {
        assert!(SubmissionError::NoRouteSelected.rejected_before_write());
        assert!(SubmissionError::InvalidRating { rating: 0.0 }.rejected_before_write());
        assert!(SubmissionError::SubmissionInProgress.rejected_before_write());
        assert!(SubmissionError::CatalogNotReady { state: "IDLE".into() }.rejected_before_write());
    }

    #[test]
    fn store_side_failures_are_not_rejected_before_write() {
        assert!(!SubmissionError::RouteNotFound { route: "x".into() }.rejected_before_write());
        assert!(!SubmissionError::AmbiguousUpdate { route: "x".into(), rows: 2 }
            .rejected_before_write());
        assert!(!SubmissionError::Store(connection().into()).rejected_before_write());
    }

    #[test]
    fn ambiguous_update_reports_row_count() {
        let err = SubmissionError::AmbiguousUpdate {
            route: "Lakeshore Loop".into(),
            rows: 3,
        };
        assert!(err.to_string().contains("3 rows"));
    }
}
