//! # Route Entity
//!
//! The immutable value describing one trail route, plus the two validated
//! newtypes used when a user rates a route.
//!
//! ## Invariants
//!
//! - `name` is non-empty and is the only key used to address a route.
//! - `length_in_miles` is finite and ≥ 0.
//! - `rating` (the stored aggregate) is finite and within `0..=5`.
//! - `biking_time` / `running_time` are preformatted display strings and are
//!   never interpreted here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound of the star-rating control, inclusive.
pub const MAX_RATING: f64 = 5.0;

// ─── RouteName ───────────────────────────────────────────────────────

/// Unique identifier and display name of a route.
///
/// Kept exactly as stored, since it is matched byte for byte when a rating
/// is written. A name that is blank after trimming is rejected, so holding
/// a `RouteName` proves a route is addressable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteName(String);

impl RouteName {
    /// Validate and wrap a route name.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyRouteName);
        }
        Ok(Self(name))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RouteName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RouteName> for String {
    fn from(name: RouteName) -> Self {
        name.0
    }
}

impl AsRef<str> for RouteName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RouteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Rating ──────────────────────────────────────────────────────────

/// A user-submitted rating.
///
/// Must be finite, strictly greater than zero (a zero-star control value
/// means "nothing chosen"), and no greater than [`MAX_RATING`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Validate a rating value from the star control.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_finite() && value > 0.0 && value <= MAX_RATING {
            Ok(Self(value))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    /// The raw rating value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Route ───────────────────────────────────────────────────────────

/// One trail route as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: RouteName,
    pub length_in_miles: f64,
    /// Preformatted biking duration (e.g. "25 min").
    pub biking_time: String,
    /// Preformatted running duration.
    pub running_time: String,
    /// Current aggregate rating, `0..=5`.
    pub rating: f64,
}

impl Route {
    /// Build a route, checking the numeric invariants.
    pub fn new(
        name: RouteName,
        length_in_miles: f64,
        biking_time: impl Into<String>,
        running_time: impl Into<String>,
        rating: f64,
    ) -> Result<Self, ValidationError> {
        if !length_in_miles.is_finite() || length_in_miles < 0.0 {
            return Err(ValidationError::InvalidDistance(length_in_miles));
        }
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            return Err(ValidationError::StoredRatingOutOfRange(rating));
        }
        Ok(Self {
            name,
            length_in_miles,
            biking_time: biking_time.into(),
            running_time: running_time.into(),
            rating,
        })
    }
}
