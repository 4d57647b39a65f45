//! # Probe Subcommand

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use trailblazr_store::StoreClient;
use trailblazr_sync::UserNotice;

/// Open and close one connection. Exit code 1 when the store is unreachable.
pub async fn run_probe(store: Arc<dyn StoreClient>, out: &mut impl Write) -> Result<u8> {
    match store.probe().await {
        Ok(()) => {
            writeln!(out, "Route store reachable.")?;
            Ok(0)
        }
        Err(e) => {
            tracing::warn!(error = %e, "probe failed");
            writeln!(out, "{}", UserNotice::StoreUnreachable)?;
            Ok(1)
        }
    }
}
