//! # Console Rendering
//!
//! Route rows in the list layout of the map screen, the default map marker,
//! and the JSON document emitted by `routes --json`.

use std::io::{self, Write};

use serde::Serialize;
use trailblazr_core::{MapViewport, Route};

/// `3` renders as `3.0`, `3.25` as `3.25`.
fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// One route as a five-line block.
pub fn route_block(route: &Route) -> String {
    format!(
        "{}\n  {} miles\n  Biking: {}\n  Running: {}\n  Rating: {} ⭐",
        route.name,
        number(route.length_in_miles),
        route.biking_time,
        route.running_time,
        number(route.rating),
    )
}

pub fn write_routes(out: &mut impl Write, routes: &[Route], viewport: &MapViewport) -> io::Result<()> {
    if routes.is_empty() {
        writeln!(out, "No routes available yet.")?;
    }
    for route in routes {
        writeln!(out, "{}", route_block(route))?;
        writeln!(out)?;
    }
    writeln!(out, "Map: {viewport}")
}

#[derive(Debug, Serialize)]
pub struct RoutesDocument<'a> {
    pub routes: &'a [Route],
    pub skipped: usize,
    pub map: &'a MapViewport,
}

pub fn write_routes_json(out: &mut impl Write, document: &RoutesDocument<'_>) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, document)?;
    writeln!(out)
}
