//! # PostgreSQL Store Client
//!
//! One `PgConnection` per operation. The connection is closed explicitly on
//! every path before the operation returns. If the caller drops the future
//! mid-operation, dropping the connection closes the socket.
//!
//! ## Error Classification
//!
//! | SQLx error                                   | Surfaced as        |
//! |----------------------------------------------|--------------------|
//! | connect failure, connect timeout             | `ConnectionError`  |
//! | `Io`, `Tls`, `Protocol`, pool/worker errors  | `ConnectionError`  |
//! | `Database` (server rejected the statement)   | `QueryError`       |
//! | column / decode / encode errors              | `QueryError`       |

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Postgres, Row, TypeInfo, ValueRef};
use trailblazr_core::{ConnectionError, QueryError, StoreError};

use crate::client::StoreClient;
use crate::config::StoreConfig;
use crate::row::{StoreRow, StoreValue};
use crate::statement::{Param, Statement};

/// Store client backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStoreClient {
    endpoint: String,
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl std::fmt::Debug for PgStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStoreClient")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl PgStoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            options: config.options().clone(),
            connect_timeout: config.connect_timeout(),
        }
    }

    async fn connect(&self) -> Result<PgConnection, ConnectionError> {
        match tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options))
            .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(self.connection_error(e.to_string())),
            Err(_) => Err(self.connection_error(format!(
                "connect timed out after {}s",
                self.connect_timeout.as_secs()
            ))),
        }
    }

    /// Close the connection. A failed close never changes the operation result.
    async fn release(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "failed to close store connection cleanly");
        }
    }

    fn connection_error(&self, reason: String) -> ConnectionError {
        ConnectionError {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }

    fn classify(&self, err: sqlx::Error) -> StoreError {
        match err {
            sqlx::Error::Database(db) => {
                let reason = match db.code() {
                    Some(code) => format!("{} (SQLSTATE {code})", db.message()),
                    None => db.message().to_string(),
                };
                QueryError { reason }.into()
            }
            e @ (sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::Encode(_)
            | sqlx::Error::RowNotFound) => QueryError {
                reason: e.to_string(),
            }
            .into(),
            other => self.connection_error(other.to_string()).into(),
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Param],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Param::Text(s) => query.bind(s.clone()),
            Param::Float(v) => query.bind(*v),
        };
    }
    query
}

/// Decode a Postgres row column by column into a [`StoreRow`].
fn decode_row(row: &PgRow) -> Result<StoreRow, sqlx::Error> {
    let mut out = StoreRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let is_null = row.try_get_raw(i)?.is_null();
        let value = if is_null {
            StoreValue::Null
        } else {
            match column.type_info().name() {
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => StoreValue::Text(row.try_get(i)?),
                "FLOAT8" => StoreValue::Float(row.try_get(i)?),
                "FLOAT4" => StoreValue::Float(f64::from(row.try_get::<f32, _>(i)?)),
                "INT2" => StoreValue::Integer(i64::from(row.try_get::<i16, _>(i)?)),
                "INT4" => StoreValue::Integer(i64::from(row.try_get::<i32, _>(i)?)),
                "INT8" => StoreValue::Integer(row.try_get(i)?),
                other => StoreValue::Unsupported(other.to_string()),
            }
        };
        out.set(column.name(), value);
    }
    Ok(out)
}

#[async_trait]
impl StoreClient for PgStoreClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), ConnectionError> {
        let conn = self.connect().await?;
        self.release(conn).await;
        tracing::debug!(endpoint = %self.endpoint, "store probe succeeded");
        Ok(())
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<StoreRow>, StoreError> {
        let mut conn = self.connect().await?;
        let result = bind_params(sqlx::query(statement.text()), statement.params())
            .fetch_all(&mut conn)
            .await;
        self.release(conn).await;

        let rows = result.map_err(|e| self.classify(e))?;
        let decoded = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.classify(e))?;
        tracing::debug!(endpoint = %self.endpoint, rows = decoded.len(), "store query completed");
        Ok(decoded)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let mut conn = self.connect().await?;
        let result = bind_params(sqlx::query(statement.text()), statement.params())
            .execute(&mut conn)
            .await;
        self.release(conn).await;

        let affected = result.map_err(|e| self.classify(e))?.rows_affected();
        tracing::debug!(endpoint = %self.endpoint, rows_affected = affected, "store write completed");
        Ok(affected)
    }
}
