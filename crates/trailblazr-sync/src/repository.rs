//! # Route Repository
//!
//! Turns the remote `routes` table into an ordered sequence of [`Route`]s.
//!
//! One read per fetch. Rows come back in store order and are never
//! re-sorted. A row with a missing, null, mistyped or out-of-range column is
//! skipped and logged; the rest of the catalog is still returned. Only a
//! failure of the read itself fails the fetch.

use std::sync::Arc;

use trailblazr_core::{FetchError, Route, RouteName, RowError};
use trailblazr_store::schema::{self, columns};
use trailblazr_store::{StoreClient, StoreRow, StoreValue};

use crate::telemetry;

// ─── Catalog ─────────────────────────────────────────────────────────

/// Result of a successful fetch: the routes in store order, plus how many
/// rows had to be skipped to build them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    routes: Vec<Route>,
    skipped: usize,
}

impl Catalog {
    pub fn new(routes: Vec<Route>, skipped: usize) -> Self {
        Self { routes, skipped }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }

    /// Rows dropped as malformed during this fetch.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// An empty catalog is a successful fetch of an empty table.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look a route up by name.
    pub fn find(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name.as_str() == name)
    }
}

// ─── Repository ──────────────────────────────────────────────────────

/// Reads the route catalog from a [`StoreClient`].
#[derive(Clone)]
pub struct RouteRepository {
    store: Arc<dyn StoreClient>,
}

impl std::fmt::Debug for RouteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRepository").finish_non_exhaustive()
    }
}

impl RouteRepository {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Fetch the full catalog.
    pub async fn fetch_all(&self) -> Result<Catalog, FetchError> {
        let rows = match self.store.query(&schema::select_all_routes()).await {
            Ok(rows) => rows,
            Err(e) => {
                telemetry::fetch(false);
                tracing::warn!(error = %e, "catalog fetch failed");
                return Err(FetchError::from(e));
            }
        };

        let total = rows.len();
        let mut routes = Vec::with_capacity(total);
        for (index, row) in rows.iter().enumerate() {
            match parse_row(row) {
                Ok(route) => routes.push(route),
                Err(e) => {
                    tracing::warn!(row = index, error = %e, "skipping malformed route row");
                }
            }
        }
        let skipped = total - routes.len();

        telemetry::fetch(true);
        telemetry::rows_skipped(skipped as u64);
        tracing::info!(routes = routes.len(), skipped, "catalog fetched");
        Ok(Catalog::new(routes, skipped))
    }
}

// ─── Row parsing ─────────────────────────────────────────────────────

/// Parse one store row into a route. All five columns must be present.
pub fn parse_row(row: &StoreRow) -> Result<Route, RowError> {
    let name = RouteName::new(text(row, columns::NAME)?)?;
    let distance = number(row, columns::DISTANCE)?;
    let biking_time = text(row, columns::BIKING_TIME)?;
    let running_time = text(row, columns::RUNNING_TIME)?;
    let rating = number(row, columns::RATING)?;
    Ok(Route::new(name, distance, biking_time, running_time, rating)?)
}

fn column<'r>(row: &'r StoreRow, column: &'static str) -> Result<&'r StoreValue, RowError> {
    match row.get(column) {
        None => Err(RowError::MissingColumn { column }),
        Some(StoreValue::Null) => Err(RowError::NullColumn { column }),
        Some(value) => Ok(value),
    }
}

fn text(row: &StoreRow, name: &'static str) -> Result<String, RowError> {
    let value = column(row, name)?;
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| RowError::TypeMismatch {
            column: name,
            expected: "text",
            found: value.type_label(),
        })
}

fn number(row: &StoreRow, name: &'static str) -> Result<f64, RowError> {
    let value = column(row, name)?;
    value.as_f64().ok_or_else(|| RowError::TypeMismatch {
        column: name,
        expected: "number",
        found: value.type_label(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trailblazr_core::ValidationError;
    use trailblazr_store::MemoryStoreClient;

    fn row(name: &str, distance: f64, rating: f64) -> StoreRow {
        StoreRow::new()
            .with(columns::NAME, StoreValue::Text(name.into()))
            .with(columns::DISTANCE, StoreValue::Float(distance))
            .with(columns::BIKING_TIME, StoreValue::Text("15 min".into()))
            .with(columns::RUNNING_TIME, StoreValue::Text("30 min".into()))
            .with(columns::RATING, StoreValue::Float(rating))
    }

    fn without(row: StoreRow, dropped: &str) -> StoreRow {
        row.columns()
            .filter(|(c, _)| *c != dropped)
            .fold(StoreRow::new(), |acc, (c, v)| acc.with(c, v.clone()))
    }

    fn repository(store: &MemoryStoreClient) -> RouteRepository {
        RouteRepository::new(Arc::new(store.clone()))
    }

    // ── parse_row ───────────────────────────────────────────────────

    #[test]
    fn parses_well_formed_row() {
        let route = parse_row(&row("Lakeshore Loop", 3.2, 4.0)).unwrap();
        assert_eq!(route.name.as_str(), "Lakeshore Loop");
        assert_eq!(route.length_in_miles, 3.2);
        assert_eq!(route.biking_time, "15 min");
        assert_eq!(route.running_time, "30 min");
        assert_eq!(route.rating, 4.0);
    }

    #[test]
    fn stored_name_is_kept_verbatim() {
        let route = parse_row(&row(" Lakeshore Loop ", 3.2, 4.0)).unwrap();
        assert_eq!(route.name.as_str(), " Lakeshore Loop ");
    }

    #[test]
    fn integer_numerics_are_accepted() {
        let mut r = row("Arboretum", 0.0, 0.0);
        r.set(columns::DISTANCE, StoreValue::Integer(7));
        r.set(columns::RATING, StoreValue::Integer(5));
        let route = parse_row(&r).unwrap();
        assert_eq!(route.length_in_miles, 7.0);
        assert_eq!(route.rating, 5.0);
    }

    #[test]
    fn missing_rating_is_reported() {
        let err = parse_row(&without(row("A", 1.0, 1.0), columns::RATING)).unwrap_err();
        assert_eq!(err, RowError::MissingColumn { column: "rating" });
    }

    #[test]
    fn null_and_mistyped_columns_are_reported() {
        let mut r = row("A", 1.0, 1.0);
        r.set(columns::BIKING_TIME, StoreValue::Null);
        assert_eq!(
            parse_row(&r).unwrap_err(),
            RowError::NullColumn { column: "biking_time" }
        );

        let mut r = row("A", 1.0, 1.0);
        r.set(columns::DISTANCE, StoreValue::Text("far".into()));
        assert!(matches!(
            parse_row(&r).unwrap_err(),
            RowError::TypeMismatch { column: "distance", expected: "number", .. }
        ));
    }

    #[test]
    fn invariant_violations_are_reported() {
        assert_eq!(
            parse_row(&row("  ", 1.0, 1.0)).unwrap_err(),
            RowError::Invalid(ValidationError::EmptyRouteName)
        );
        assert!(matches!(
            parse_row(&row("A", -1.0, 1.0)).unwrap_err(),
            RowError::Invalid(ValidationError::InvalidDistance(_))
        ));
        assert!(matches!(
            parse_row(&row("A", 1.0, 7.5)).unwrap_err(),
            RowError::Invalid(ValidationError::StoredRatingOutOfRange(_))
        ));
    }

    // ── fetch_all ───────────────────────────────────────────────────

    #[tokio::test]
    async fn corrupt_row_is_skipped_and_rest_returned() {
        let store = MemoryStoreClient::new();
        store.insert_row(row("A", 1.0, 3.0));
        store.insert_row(without(row("B", 2.0, 4.0), columns::RATING));
        store.insert_row(row("C", 3.0, 5.0));

        let catalog = repository(&store).fetch_all().await.unwrap();
        let names: Vec<_> = catalog.routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
        assert_eq!(catalog.skipped(), 1);
    }

    #[tokio::test]
    async fn empty_table_is_empty_catalog_not_error() {
        let store = MemoryStoreClient::new();
        let catalog = repository(&store).fetch_all().await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.skipped(), 0);
    }

    #[tokio::test]
    async fn store_failure_fails_the_fetch() {
        let store = MemoryStoreClient::new();
        store.set_reachable(false);
        let err = repository(&store).fetch_all().await.unwrap_err();
        assert!(err.0.is_connection());

        store.set_reachable(true);
        store.set_fail_queries(true);
        let err = repository(&store).fetch_all().await.unwrap_err();
        assert!(!err.0.is_connection());
    }

    #[tokio::test]
    async fn fetch_issues_exactly_one_read() {
        let store = MemoryStoreClient::new();
        store.insert_row(row("A", 1.0, 3.0));
        repository(&store).fetch_all().await.unwrap();
        let stats = store.stats();
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.connections_opened, stats.connections_released);
    }

    // ── Properties ──────────────────────────────────────────────────

    fn well_formed_rows() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((0.0f64..500.0, 0.0f64..=5.0), 0..40)
    }

    proptest! {
        #[test]
        fn fetch_preserves_length_and_order(specs in well_formed_rows()) {
            let store = MemoryStoreClient::new();
            for (i, (distance, rating)) in specs.iter().enumerate() {
                // Names are unique and deliberately not in sort order.
                store.insert_row(row(&format!("route-{}", specs.len() - i), *distance, *rating));
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let catalog = runtime.block_on(repository(&store).fetch_all()).unwrap();

            prop_assert_eq!(catalog.len(), specs.len());
            prop_assert_eq!(catalog.skipped(), 0);
            for (i, route) in catalog.routes().iter().enumerate() {
                let expected_name = format!("route-{}", specs.len() - i);
                prop_assert_eq!(route.name.as_str(), expected_name.as_str());
                prop_assert_eq!(route.length_in_miles, specs[i].0);
                prop_assert_eq!(route.rating, specs[i].1);
            }
        }
    }
}
