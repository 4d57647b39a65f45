//! # trailblazr-cli — Trailblazr Command-Line Client
//!
//! A console stand-in for the map screen. Each invocation opens one sync
//! session, drives it with the refresh and submit triggers, prints the
//! outcome, and tears the session down.
//!
//! ## Subcommands
//!
//! - `probe`: connectivity check only
//! - `routes`: list the catalog and the default map marker
//! - `rate`: submit a rating for one route
//!
//! Handlers take the store as `Arc<dyn StoreClient>` and write to any
//! `io::Write`, so they run unchanged against the in-memory store in tests.

pub mod probe;
pub mod rate;
pub mod render;
pub mod routes;
