//! # Routes Subcommand
//!
//! Refreshes a session and renders the catalog it delivers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc::UnboundedReceiver;
use trailblazr_core::{MapViewport, Route};
use trailblazr_store::StoreClient;
use trailblazr_sync::{ChannelListener, SyncEvent, SyncHandle, UserNotice};

use crate::render::{self, RoutesDocument};

/// Arguments for `trailblazr routes`.
#[derive(Args, Debug, Default)]
pub struct RoutesArgs {
    /// Emit the catalog as JSON instead of the list layout.
    #[arg(long)]
    pub json: bool,
}

/// A session plus the event stream its listener feeds.
pub(crate) struct Screen {
    pub session: SyncHandle,
    pub events: UnboundedReceiver<SyncEvent>,
}

impl Screen {
    pub fn open(store: Arc<dyn StoreClient>) -> Self {
        let (listener, events) = ChannelListener::channel();
        Self {
            session: SyncHandle::spawn(store, listener),
            events,
        }
    }

    pub async fn next_event(&mut self) -> Result<SyncEvent> {
        self.events
            .recv()
            .await
            .context("sync session ended before reporting an outcome")
    }

    /// Refresh and wait for the outcome. `Err(notice)` when the store was
    /// unreachable or the fetch failed.
    pub async fn load_catalog(&mut self) -> Result<std::result::Result<Vec<Route>, UserNotice>> {
        self.session.refresh().await?;
        Ok(match self.next_event().await? {
            SyncEvent::CatalogReady(routes) => Ok(routes),
            other => Err(UserNotice::from_event(&other)),
        })
    }

    pub async fn close(self) {
        self.session.teardown().await;
    }
}

pub async fn run_routes(
    args: &RoutesArgs,
    store: Arc<dyn StoreClient>,
    out: &mut impl Write,
) -> Result<u8> {
    let mut screen = Screen::open(store);
    let code = match screen.load_catalog().await? {
        Ok(routes) => {
            let viewport = MapViewport::default_marker();
            if args.json {
                let skipped = screen
                    .session
                    .snapshot()
                    .await?
                    .catalog
                    .map_or(0, |c| c.skipped());
                let document = RoutesDocument {
                    routes: &routes,
                    skipped,
                    map: &viewport,
                };
                render::write_routes_json(out, &document)?;
            } else {
                render::write_routes(out, &routes, &viewport)?;
            }
            0
        }
        Err(notice) => {
            writeln!(out, "{notice}")?;
            1
        }
    };
    screen.close().await;
    Ok(code)
}
