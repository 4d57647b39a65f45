//! # Map Viewport
//!
//! The default marker and camera position shown beside the route list when
//! no device location is available. Rendering is the presentation layer's
//! job; this module only fixes the coordinates.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Initial camera position and marker for the map screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewport {
    pub center: GeoPoint,
    pub zoom: f32,
    /// Title of the marker placed at `center`.
    pub marker_title: String,
}

impl MapViewport {
    /// Madison, Wisconsin at city zoom.
    pub fn default_marker() -> Self {
        Self {
            center: GeoPoint {
                latitude: 43.0731,
                longitude: -89.4012,
            },
            zoom: 10.0,
            marker_title: "Marker in Madison, WI".to_string(),
        }
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::default_marker()
    }
}

impl std::fmt::Display for MapViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.4}, {:.4}) zoom {}",
            self.marker_title, self.center.latitude, self.center.longitude, self.zoom
        )
    }
}
