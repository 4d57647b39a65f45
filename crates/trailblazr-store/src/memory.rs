//! # In-Memory Store Client
//!
//! A `routes` table held in process memory, interpreting the two schema
//! statements. Used by tests and demos to exercise the repository, rating
//! service and session loop without a database.
//!
//! Every operation opens a lease that is counted on acquisition and counted
//! again when dropped, so tests can assert that connections are released
//! exactly once on every exit path, including cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use trailblazr_core::{ConnectionError, QueryError, Route, StoreError};

use crate::client::StoreClient;
use crate::row::{StoreRow, StoreValue};
use crate::schema::{columns, SELECT_ALL_ROUTES, UPDATE_ROUTE_RATING};
use crate::statement::{Param, Statement};

const ENDPOINT: &str = "memory";

/// Counters observed by tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub connections_opened: u64,
    pub connections_released: u64,
    pub probes: u64,
    pub reads: u64,
    pub writes: u64,
}

/// Holds operations of one kind until resumed.
#[derive(Debug)]
struct Gate(watch::Sender<bool>);

impl Gate {
    fn new() -> Self {
        Self(watch::channel(true).0)
    }

    fn set_open(&self, open: bool) {
        self.0.send_replace(open);
    }

    async fn pass(&self) {
        let mut rx = self.0.subscribe();
        loop {
            let open = *rx.borrow_and_update();
            if open || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    rows: Mutex<Vec<StoreRow>>,
    reachable: AtomicBool,
    fail_queries: AtomicBool,
    read_gate: Gate,
    write_gate: Gate,
    opened: AtomicU64,
    released: AtomicU64,
    probes: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Counts the release when dropped.
struct Lease<'a>(&'a Inner);

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory route store. Clones share the same table and counters.
#[derive(Debug, Clone)]
pub struct MemoryStoreClient {
    inner: Arc<Inner>,
}

impl Default for MemoryStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreClient {
    /// An empty, reachable store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: Mutex::new(Vec::new()),
                reachable: AtomicBool::new(true),
                fail_queries: AtomicBool::new(false),
                read_gate: Gate::new(),
                write_gate: Gate::new(),
                opened: AtomicU64::new(0),
                released: AtomicU64::new(0),
                probes: AtomicU64::new(0),
                reads: AtomicU64::new(0),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// A store seeded with well-formed rows for `routes`, in order.
    pub fn with_routes<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Self {
        let store = Self::new();
        for route in routes {
            store.insert_row(Self::route_row(route));
        }
        store
    }

    /// The row the store would hold for `route`.
    pub fn route_row(route: &Route) -> StoreRow {
        StoreRow::new()
            .with(columns::NAME, StoreValue::Text(route.name.to_string()))
            .with(columns::DISTANCE, StoreValue::Float(route.length_in_miles))
            .with(
                columns::BIKING_TIME,
                StoreValue::Text(route.biking_time.clone()),
            )
            .with(
                columns::RUNNING_TIME,
                StoreValue::Text(route.running_time.clone()),
            )
            .with(columns::RATING, StoreValue::Float(route.rating))
    }

    /// Append a raw row. Rows may be malformed or share a name.
    pub fn insert_row(&self, row: StoreRow) {
        self.inner.rows.lock().push(row);
    }

    /// When unreachable every operation fails its handshake.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// When set, reads and writes connect but the statement is rejected.
    pub fn set_fail_queries(&self, fail: bool) {
        self.inner.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Hold reads after the connection is open until [`Self::resume_reads`].
    pub fn pause_reads(&self) {
        self.inner.read_gate.set_open(false);
    }

    pub fn resume_reads(&self) {
        self.inner.read_gate.set_open(true);
    }

    /// Hold writes after the connection is open until [`Self::resume_writes`].
    pub fn pause_writes(&self) {
        self.inner.write_gate.set_open(false);
    }

    pub fn resume_writes(&self) {
        self.inner.write_gate.set_open(true);
    }

    /// Current rating of every row named `name`, in table order.
    pub fn ratings_of(&self, name: &str) -> Vec<StoreValue> {
        self.inner
            .rows
            .lock()
            .iter()
            .filter(|row| row.get(columns::NAME).and_then(StoreValue::as_text) == Some(name))
            .map(|row| row.get(columns::RATING).cloned().unwrap_or(StoreValue::Null))
            .collect()
    }

    /// Current rating of the first row named `name`, if numeric.
    pub fn rating_of(&self, name: &str) -> Option<f64> {
        self.ratings_of(name).first().and_then(StoreValue::as_f64)
    }

    /// Snapshot of the table.
    pub fn rows(&self) -> Vec<StoreRow> {
        self.inner.rows.lock().clone()
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let i = &self.inner;
        MemoryStoreStats {
            connections_opened: i.opened.load(Ordering::SeqCst),
            connections_released: i.released.load(Ordering::SeqCst),
            probes: i.probes.load(Ordering::SeqCst),
            reads: i.reads.load(Ordering::SeqCst),
            writes: i.writes.load(Ordering::SeqCst),
        }
    }

    fn open(&self) -> Result<Lease<'_>, ConnectionError> {
        if !self.inner.reachable.load(Ordering::SeqCst) {
            return Err(ConnectionError {
                endpoint: ENDPOINT.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Lease(&self.inner))
    }

    fn check_statement(&self, statement: &Statement, expected: &str) -> Result<(), QueryError> {
        if self.inner.fail_queries.load(Ordering::SeqCst) {
            return Err(QueryError {
                reason: "statement rejected by store".to_string(),
            });
        }
        if statement.text() != expected {
            return Err(QueryError {
                reason: format!("unsupported statement: {}", statement.text()),
            });
        }
        Ok(())
    }

    fn apply_rating_update(&self, params: &[Param]) -> Result<u64, QueryError> {
        let (rating, name) = match params {
            [Param::Float(rating), Param::Text(name)] => (*rating, name.as_str()),
            other => {
                return Err(QueryError {
                    reason: format!("bad parameters for rating update: {other:?}"),
                })
            }
        };
        let mut rows = self.inner.rows.lock();
        let mut affected = 0;
        for row in rows.iter_mut() {
            if row.get(columns::NAME).and_then(StoreValue::as_text) == Some(name) {
                row.set(columns::RATING, StoreValue::Float(rating));
                affected += 1;
            }
        }
        Ok(affected)
    }
}

#[async_trait]
impl StoreClient for MemoryStoreClient {
    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    async fn probe(&self) -> Result<(), ConnectionError> {
        self.inner.probes.fetch_add(1, Ordering::SeqCst);
        let _lease = self.open()?;
        Ok(())
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<StoreRow>, StoreError> {
        let _lease = self.open()?;
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_gate.pass().await;
        self.check_statement(statement, SELECT_ALL_ROUTES)?;
        Ok(self.inner.rows.lock().clone())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let _lease = self.open()?;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_gate.pass().await;
        self.check_statement(statement, UPDATE_ROUTE_RATING)?;
        Ok(self.apply_rating_update(statement.params())?)
    }
}
