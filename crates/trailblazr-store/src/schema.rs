//! # Route Store Schema
//!
//! The read/write surface of the `routes` table and the only constructors of
//! [`Statement`].
//!
//! ```text
//! routes(name text unique, distance numeric, biking_time text,
//!        running_time text, rating numeric)
//! ```
//!
//! Numeric columns are cast to `float8` on read so every client decodes them
//! the same way.

use trailblazr_core::{Rating, RouteName};

use crate::statement::{Param, Statement};

/// Column names of the `routes` table.
pub mod columns {
    pub const NAME: &str = "name";
    pub const DISTANCE: &str = "distance";
    pub const BIKING_TIME: &str = "biking_time";
    pub const RUNNING_TIME: &str = "running_time";
    pub const RATING: &str = "rating";
}

/// Select every route, all five columns, in store order.
pub const SELECT_ALL_ROUTES: &str = "SELECT name, distance::float8 AS distance, biking_time, \
     running_time, rating::float8 AS rating FROM routes";

/// Set the rating of the route with the given name. `$1` rating, `$2` name.
pub const UPDATE_ROUTE_RATING: &str = "UPDATE routes SET rating = $1 WHERE name = $2";

/// The catalog read.
pub fn select_all_routes() -> Statement {
    Statement::new(SELECT_ALL_ROUTES, Vec::new())
}

/// The rating write for one route, with both values bound as parameters.
pub fn update_route_rating(name: &RouteName, rating: Rating) -> Statement {
    Statement::new(
        UPDATE_ROUTE_RATING,
        vec![
            Param::Float(rating.value()),
            Param::Text(name.as_str().to_string()),
        ],
    )
}
