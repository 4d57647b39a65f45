//! User-facing messages for session outcomes.
//!
//! Connectivity failures, fetch failures and each class of submission
//! failure map to different messages.

use std::fmt;

use trailblazr_core::SubmissionError;

use crate::listener::SyncEvent;

/// A message the UI shows after a session outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNotice {
    RoutesLoaded { count: usize },
    NoRoutes,
    StoreUnreachable,
    RoutesUnavailable,
    RatingSubmitted,
    /// Nothing selected, or the star control is outside its range.
    SelectRouteAndRating,
    SubmissionBusy,
    RoutesLoading,
    RouteGone { route: String },
    SubmissionFailed,
}

impl UserNotice {
    pub fn from_event(event: &SyncEvent) -> Self {
        match event {
            SyncEvent::CatalogReady(routes) if routes.is_empty() => Self::NoRoutes,
            SyncEvent::CatalogReady(routes) => Self::RoutesLoaded {
                count: routes.len(),
            },
            SyncEvent::ConnectivityFailed(_) => Self::StoreUnreachable,
            SyncEvent::FetchFailed(_) => Self::RoutesUnavailable,
            SyncEvent::SubmissionResult(result) => Self::for_submission(result),
        }
    }

    pub fn for_submission(result: &Result<(), SubmissionError>) -> Self {
        match result {
            Ok(()) => Self::RatingSubmitted,
            Err(SubmissionError::NoRouteSelected | SubmissionError::InvalidRating { .. }) => {
                Self::SelectRouteAndRating
            }
            Err(SubmissionError::SubmissionInProgress) => Self::SubmissionBusy,
            Err(SubmissionError::CatalogNotReady { .. }) => Self::RoutesLoading,
            Err(SubmissionError::RouteNotFound { route }) => Self::RouteGone {
                route: route.clone(),
            },
            Err(SubmissionError::AmbiguousUpdate { .. } | SubmissionError::Store(_)) => {
                Self::SubmissionFailed
            }
        }
    }

    /// Whether the notice reports a failure.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::RoutesLoaded { .. } | Self::NoRoutes | Self::RatingSubmitted
        )
    }
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoutesLoaded { count: 1 } => f.write_str("1 route loaded."),
            Self::RoutesLoaded { count } => write!(f, "{count} routes loaded."),
            Self::NoRoutes => f.write_str("No routes available yet."),
            Self::StoreUnreachable => {
                f.write_str("Can't reach the route server. Check your connection and try again.")
            }
            Self::RoutesUnavailable => f.write_str("Couldn't load routes. Try again later."),
            Self::RatingSubmitted => f.write_str("Rating submitted!"),
            Self::SelectRouteAndRating => f.write_str("Please select a route and rating."),
            Self::SubmissionBusy => f.write_str("A rating is already being submitted."),
            Self::RoutesLoading => f.write_str("Routes are still loading."),
            Self::RouteGone { route } => {
                write!(f, "Failed to submit rating: route \"{route}\" no longer exists.")
            }
            Self::SubmissionFailed => f.write_str("Failed to submit rating."),
        }
    }
}
