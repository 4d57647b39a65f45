//! # Rating Submission
//!
//! Applies a user rating to exactly one route, addressed by name.
//!
//! Preconditions are checked in a fixed order, before any store traffic:
//!
//! 1. a route is selected, else [`SubmissionError::NoRouteSelected`];
//! 2. the rating is within `(0, 5]`, else [`SubmissionError::InvalidRating`].
//!
//! The write binds both the name and the rating as parameters. Exactly one
//! affected row is success. Zero is `RouteNotFound`, more than one is
//! `AmbiguousUpdate`.

use std::sync::Arc;

use trailblazr_core::{Rating, RouteName, SubmissionError};
use trailblazr_store::{schema, StoreClient};

use crate::telemetry;

/// A rating submission that has passed its preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRequest {
    route: RouteName,
    rating: Rating,
}

impl RatingRequest {
    pub fn new(route: RouteName, rating: Rating) -> Self {
        Self { route, rating }
    }

    /// Check the preconditions against the UI's current selection and the
    /// star control value. A blank selection counts as no selection.
    pub fn validate(selected: Option<&str>, rating: f64) -> Result<Self, SubmissionError> {
        let route = selected
            .and_then(|name| RouteName::new(name).ok())
            .ok_or(SubmissionError::NoRouteSelected)?;
        let rating = Rating::new(rating).map_err(|_| SubmissionError::InvalidRating { rating })?;
        Ok(Self { route, rating })
    }

    pub fn route(&self) -> &RouteName {
        &self.route
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }
}

/// Issues rating writes against the route store.
#[derive(Clone)]
pub struct RatingSubmissionService {
    store: Arc<dyn StoreClient>,
}

impl std::fmt::Debug for RatingSubmissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingSubmissionService")
            .finish_non_exhaustive()
    }
}

impl RatingSubmissionService {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Validate and apply in one step.
    pub async fn submit(&self, selected: Option<&str>, rating: f64) -> Result<(), SubmissionError> {
        let request = match RatingRequest::validate(selected, rating) {
            Ok(request) => request,
            Err(e) => {
                let result = Err(e);
                telemetry::submission(&result);
                return result;
            }
        };
        self.apply(&request).await
    }

    /// Issue exactly one parameter-bound write for a validated request.
    pub async fn apply(&self, request: &RatingRequest) -> Result<(), SubmissionError> {
        let statement = schema::update_route_rating(request.route(), request.rating());
        let result = match self.store.execute(&statement).await {
            Ok(1) => Ok(()),
            Ok(0) => Err(SubmissionError::RouteNotFound {
                route: request.route().to_string(),
            }),
            Ok(rows) => Err(SubmissionError::AmbiguousUpdate {
                route: request.route().to_string(),
                rows,
            }),
            Err(e) => Err(SubmissionError::Store(e)),
        };

        telemetry::submission(&result);
        match &result {
            Ok(()) => {
                tracing::info!(route = %request.route(), rating = %request.rating(), "rating submitted")
            }
            Err(e) => tracing::warn!(route = %request.route(), error = %e, "rating submission failed"),
        }
        result
    }
}
