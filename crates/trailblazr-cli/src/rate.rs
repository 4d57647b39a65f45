//! # Rate Subcommand
//!
//! Loads the catalog, selects a route and submits a rating, the same
//! sequence the map screen runs when the user taps submit.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use trailblazr_core::SubmissionError;
use trailblazr_store::StoreClient;
use trailblazr_sync::{SyncError, SyncEvent, UserNotice};

use crate::routes::Screen;

/// Arguments for `trailblazr rate`.
#[derive(Args, Debug)]
pub struct RateArgs {
    /// Name of the route to rate. Omitting it is the same as having nothing
    /// selected.
    #[arg(long)]
    pub route: Option<String>,

    /// Star rating, greater than 0 and at most 5.
    #[arg(long, allow_negative_numbers = true)]
    pub rating: f64,
}

pub async fn run_rate(args: &RateArgs, store: Arc<dyn StoreClient>, out: &mut impl Write) -> Result<u8> {
    let mut screen = Screen::open(store);
    let routes = match screen.load_catalog().await? {
        Ok(routes) => routes,
        Err(notice) => {
            writeln!(out, "{notice}")?;
            screen.close().await;
            return Ok(1);
        }
    };
    if let Some(name) = &args.route {
        if !routes.iter().any(|r| r.name.as_str() == name.as_str()) {
            tracing::warn!(route = %name, "route not in the loaded catalog");
        }
    }

    let result = match screen
        .session
        .submit_rating(args.route.as_deref(), args.rating)
        .await
    {
        Ok(()) => wait_for_submission(&mut screen).await?,
        Err(SyncError::Rejected(e)) => Err(e),
        Err(SyncError::SessionClosed) => bail!("sync session closed during submission"),
    };
    screen.close().await;

    let notice = UserNotice::for_submission(&result);
    writeln!(out, "{notice}")?;
    Ok(u8::from(result.is_err()))
}

async fn wait_for_submission(screen: &mut Screen) -> Result<std::result::Result<(), SubmissionError>> {
    loop {
        if let SyncEvent::SubmissionResult(result) = screen.next_event().await? {
            return Ok(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailblazr_core::{Route, RouteName};
    use trailblazr_store::MemoryStoreClient;

    fn lakeshore() -> Route {
        Route::new(
            RouteName::new("Lakeshore Loop").unwrap(),
            3.2,
            "20 min",
            "35 min",
            4.0,
        )
        .unwrap()
    }

    async fn rate(store: &MemoryStoreClient, route: Option<&str>, rating: f64) -> (u8, String) {
        let args = RateArgs {
            route: route.map(str::to_string),
            rating,
        };
        let mut out = Vec::new();
        let code = run_rate(&args, Arc::new(store.clone()), &mut out)
            .await
            .unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn successful_rating() {
        let store = MemoryStoreClient::with_routes([&lakeshore()]);
        let (code, text) = rate(&store, Some("Lakeshore Loop"), 4.5).await;
        assert_eq!(code, 0);
        assert_eq!(text, "Rating submitted!\n");
        assert_eq!(store.rating_of("Lakeshore Loop"), Some(4.5));
    }

    #[tokio::test]
    async fn missing_selection_prompts_user() {
        let store = MemoryStoreClient::with_routes([&lakeshore()]);
        let (code, text) = rate(&store, None, 4.0).await;
        assert_eq!(code, 1);
        assert_eq!(text, "Please select a route and rating.\n");
        assert_eq!(store.stats().writes, 0);
    }

    #[tokio::test]
    async fn unknown_route_fails() {
        let store = MemoryStoreClient::with_routes([&lakeshore()]);
        let (code, text) = rate(&store, Some("Nonexistent"), 3.0).await;
        assert_eq!(code, 1);
        assert!(text.starts_with("Failed to submit rating"));
    }

    #[tokio::test]
    async fn unreachable_store_never_writes() {
        let store = MemoryStoreClient::with_routes([&lakeshore()]);
        store.set_reachable(false);
        let (code, text) = rate(&store, Some("Lakeshore Loop"), 3.0).await;
        assert_eq!(code, 1);
        assert!(text.contains("Can't reach the route server"));
        assert_eq!(store.stats().writes, 0);
    }
}
