//! Diagnostic tool: drive a full overlay session against in-memory
//! collaborators and print every status line and surface mutation.
//! Useful for eyeballing the center/search/page/clear flow without a
//! browser or an API key.
//!
//! Usage: cargo run --bin walkthrough --features test-support

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pinpoint_common::{OverlayConfig, SearchFilters};
use pinpoint_overlay::testing::{
    place_at, MemoryStore, MockHostPage, MockSearch, RecordingStatus, RecordingSurface,
    TEST_API_KEY,
};
use pinpoint_overlay::OverlaySession;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pinpoint_overlay=debug".parse()?),
        )
        .init();

    let host = Arc::new(MockHostPage::new(
        "https://www.google.com/maps/@49.2807,-123.1207,14z",
    ));
    host.set_ready(true);

    let surface = Arc::new(RecordingSurface::new());
    let status = Arc::new(RecordingStatus::new());
    let searcher = Arc::new(
        MockSearch::new()
            .on(
                "cafe",
                vec![
                    place_at("cafe-1", 420, 49.2811, -123.1190),
                    place_at("cafe-2", 87, 49.2790, -123.1250),
                ],
            )
            .on(
                "restaurant",
                vec![place_at("rest-1", 1305, 49.2830, -123.1170)],
            ),
    );

    let session = OverlaySession::new(
        host.clone(),
        surface.clone(),
        searcher,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        status.clone(),
        OverlayConfig::from_env(),
    );

    session.start().await;
    session.save_credential(TEST_API_KEY).await?;

    session.use_map_center(1500);
    println!("state after center: {:?}", session.renderer().state());

    let filters = SearchFilters {
        restaurants: true,
        ..Default::default()
    };
    let total = session.run_search(1500, filters).await?;
    println!("found {total} places, pins on page: {}", surface.pin_count());

    if let Some((page, pages, len)) = session.page_info() {
        println!("page {}/{pages} of {len} results", page + 1);
    }

    // Pan the map; the poll loops pick the change up and re-project pins.
    host.set_url("https://www.google.com/maps/@49.2900,-123.1300,13z");
    tokio::time::sleep(std::time::Duration::from_millis(700)).await;
    println!(
        "radius diameter after pan: {:?}",
        surface.radius_diameter()
    );

    session.clear();
    println!("state after clear: {:?}", session.renderer().state());

    for line in status.messages() {
        println!("status: {line}");
    }
    Ok(())
}
