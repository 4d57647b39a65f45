//! # trailblazr-store — Remote Route Store Client
//!
//! The only path by which Trailblazr talks to the remote route store.
//!
//! ## Architecture
//!
//! Every operation ([`StoreClient::probe`], [`StoreClient::query`],
//! [`StoreClient::execute`]) opens its own connection, uses it, and closes it
//! before returning, on success and on failure. There is no pool and no
//! connection reuse across operations.
//!
//! ## Statement Safety
//!
//! A [`Statement`] pairs a compile-time statement text with an ordered list
//! of bound [`Param`]s. Statements can only be constructed inside this crate,
//! and only by the functions in [`schema`], so user-influenced values (route
//! names, ratings) always travel as bound parameters and never as statement
//! text.
//!
//! ## Implementations
//!
//! - [`PgStoreClient`]: PostgreSQL via SQLx.
//! - `MemoryStoreClient` (feature `memory`): in-memory `routes` table.

pub mod client;
pub mod config;
#[cfg(feature = "memory")]
pub mod memory;
pub mod postgres;
pub mod row;
pub mod schema;
pub mod statement;

pub use client::StoreClient;
pub use config::{ConfigError, StoreConfig};
#[cfg(feature = "memory")]
pub use memory::{MemoryStoreClient, MemoryStoreStats};
pub use postgres::PgStoreClient;
pub use row::{StoreRow, StoreValue};
pub use statement::{Param, Statement};
