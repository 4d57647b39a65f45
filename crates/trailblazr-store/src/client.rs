//! The store client seam shared by the Postgres and in-memory implementations.

use async_trait::async_trait;
use trailblazr_core::{ConnectionError, StoreError};

use crate::row::StoreRow;
use crate::statement::Statement;

/// Scoped-connection access to the remote route store.
///
/// Implementations must release the connection exactly once before each
/// method returns, whatever the outcome. Dropping a pending future must
/// release it as well.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Where the store lives, safe to log.
    fn endpoint(&self) -> &str;

    /// Open and immediately close a connection.
    async fn probe(&self) -> Result<(), ConnectionError>;

    /// Run a read statement and return its rows in store order.
    async fn query(&self, statement: &Statement) -> Result<Vec<StoreRow>, StoreError>;

    /// Run a write statement and return the number of rows affected.
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;
}
