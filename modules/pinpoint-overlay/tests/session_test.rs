//! End-to-end session tests: the control-surface contract from center
//! selection through search, paging and clear, with status lines checked
//! along the way. Everything runs on mocks.

use std::sync::Arc;

use pinpoint_common::{OverlayConfig, OverlayError, SearchFilters};
use pinpoint_overlay::testing::{
    place_at, MemoryStore, MockHostPage, MockSearch, RecordingStatus, RecordingSurface,
    TEST_API_KEY,
};
use pinpoint_overlay::traits::KeyValueStore;
use pinpoint_overlay::{OverlaySession, OverlayState};

const MAP_URL: &str = "https://www.google.com/maps/@49.2807,-123.1207,14z";

struct Rig {
    surface: Arc<RecordingSurface>,
    status: Arc<RecordingStatus>,
    primary: Arc<MemoryStore>,
    session: OverlaySession,
}

fn rig(url: &str, search: MockSearch) -> Rig {
    let host = Arc::new(MockHostPage::new(url));
    host.set_ready(true);
    let surface = Arc::new(RecordingSurface::new());
    let status = Arc::new(RecordingStatus::new());
    let primary = Arc::new(MemoryStore::new());
    let session = OverlaySession::new(
        host,
        surface.clone(),
        Arc::new(search),
        primary.clone(),
        Arc::new(MemoryStore::new()),
        status.clone(),
        OverlayConfig::default(),
    );
    Rig {
        surface,
        status,
        primary,
        session,
    }
}

/// Twelve located restaurant results, already in descending review order.
fn twelve_results() -> MockSearch {
    let places: Vec<_> = (0..12)
        .map(|i| {
            place_at(
                &format!("p{i}"),
                (120 - i * 10) as u32,
                49.2807 + i as f64 * 0.0005,
                -123.1207,
            )
        })
        .collect();
    MockSearch::new().on("restaurant", places)
}

fn restaurants() -> SearchFilters {
    SearchFilters {
        restaurants: true,
        ..Default::default()
    }
}

async fn save_key(rig: &Rig) {
    rig.session.save_credential(TEST_API_KEY).await.unwrap();
}

// ---------------------------------------------------------------------------
// Center selection
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unreadable_url_disables_center_selection_with_a_message() {
    let r = rig("https://example.com/plain-page", MockSearch::new());

    assert!(r.session.use_map_center(1000).is_none());
    assert!(r.session.selected_center().is_none());
    assert_eq!(r.session.renderer().state(), OverlayState::Idle);
    assert!(r
        .status
        .last()
        .unwrap()
        .contains("Could not detect the map location"));
}

#[tokio::test(start_paused = true)]
async fn center_selection_shows_indicators_and_reports_coordinates() {
    let r = rig(MAP_URL, MockSearch::new());

    let center = r.session.use_map_center(1000).unwrap();
    assert_eq!(center.lat, 49.2807);
    assert_eq!(r.session.renderer().state(), OverlayState::CenterShown);
    assert!(r.surface.center_shown());

    let message = r.status.last().unwrap();
    assert!(message.contains("49.280700"));
    assert!(message.contains("-123.120700"));
}

#[tokio::test(start_paused = true)]
async fn radius_edit_before_center_is_a_no_op() {
    let r = rig(MAP_URL, MockSearch::new());
    r.session.set_radius(2500);
    assert!(r.status.messages().is_empty());
    assert!(r.surface.radius_diameter().is_none());
}

#[tokio::test(start_paused = true)]
async fn radius_edit_after_center_resizes_and_restates() {
    let r = rig(MAP_URL, MockSearch::new());
    r.session.use_map_center(1000);

    r.session.set_radius(2500);

    assert_eq!(r.surface.radius_resizes(), 1);
    assert!(r.status.last().unwrap().contains("Radius: 2500m"));
}

// ---------------------------------------------------------------------------
// Search preconditions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn search_without_center_is_rejected_up_front() {
    let r = rig(MAP_URL, MockSearch::new());
    save_key(&r).await;

    let err = r.session.run_search(1000, restaurants()).await.unwrap_err();
    assert!(matches!(err, OverlayError::Validation(_)));
    assert!(r.status.last().unwrap().contains("Select a center point"));
}

#[tokio::test(start_paused = true)]
async fn search_with_no_categories_is_rejected_up_front() {
    let r = rig(MAP_URL, MockSearch::new());
    save_key(&r).await;
    r.session.use_map_center(1000);

    let err = r
        .session
        .run_search(1000, SearchFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, OverlayError::Validation(_)));
    assert!(r
        .status
        .last()
        .unwrap()
        .contains("at least one place type"));
}

#[tokio::test(start_paused = true)]
async fn search_without_credential_reports_the_missing_key() {
    let r = rig(MAP_URL, twelve_results());
    r.session.use_map_center(1000);

    let err = r.session.run_search(1000, restaurants()).await.unwrap_err();
    assert!(matches!(err, OverlayError::MissingCredential));
    assert!(r.status.last().unwrap().contains("API key not found"));
}

#[tokio::test(start_paused = true)]
async fn empty_results_report_and_leave_no_pager() {
    let r = rig(MAP_URL, MockSearch::new());
    save_key(&r).await;
    r.session.use_map_center(1000);

    let total = r.session.run_search(1000, restaurants()).await.unwrap();
    assert_eq!(total, 0);
    assert!(r.session.page_info().is_none());
    assert!(r.status.last().unwrap().contains("No places found"));
}

// ---------------------------------------------------------------------------
// Search, paging, clear
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_flow_search_pages_and_renumbers_globally() {
    let r = rig(MAP_URL, twelve_results());
    save_key(&r).await;
    r.session.use_map_center(1000);

    let total = r.session.run_search(1000, restaurants()).await.unwrap();
    assert_eq!(total, 12);
    assert_eq!(r.session.renderer().state(), OverlayState::ResultsShown);
    assert_eq!(r.session.page_info(), Some((0, 2, 12)));
    assert_eq!(r.surface.pin_ranks(), (0..10).collect::<Vec<_>>());
    assert!(r.surface.pin(0).unwrap().title.starts_with("1. "));

    let page = r.session.current_page();
    assert_eq!(page.len(), 10);
    assert_eq!(page[0].place_id, "p0", "highest review count ranks first");

    // Page forward: markers are replaced and keep their absolute ranks.
    assert!(r.session.next_page());
    assert_eq!(r.session.page_info(), Some((1, 2, 12)));
    assert_eq!(r.surface.pin_ranks(), vec![10, 11]);
    assert!(r.surface.pin(10).unwrap().title.starts_with("11. "));
    assert!(r.surface.pin(11).unwrap().title.starts_with("12. "));

    // Walking past the end is a no-op.
    assert!(!r.session.next_page());
    assert_eq!(r.session.page_info(), Some((1, 2, 12)));

    assert!(r.session.previous_page());
    assert_eq!(r.surface.pin_ranks(), (0..10).collect::<Vec<_>>());
    assert!(!r.session.previous_page());
}

#[tokio::test(start_paused = true)]
async fn clear_resets_everything() {
    let r = rig(MAP_URL, twelve_results());
    save_key(&r).await;
    r.session.use_map_center(1000);
    r.session.run_search(1000, restaurants()).await.unwrap();

    r.session.clear();

    assert!(r.session.selected_center().is_none());
    assert!(r.session.page_info().is_none());
    assert_eq!(r.session.renderer().state(), OverlayState::Idle);
    assert_eq!(r.surface.pin_count(), 0);
    assert!(!r.surface.center_shown());
    assert!(r
        .status
        .last()
        .unwrap()
        .contains("start a new search"));
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn start_waits_for_the_host_surface() {
    let host = Arc::new(MockHostPage::new(MAP_URL));
    let status = Arc::new(RecordingStatus::new());
    let session = Arc::new(OverlaySession::new(
        host.clone(),
        Arc::new(RecordingSurface::new()),
        Arc::new(MockSearch::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        status.clone(),
        OverlayConfig::default(),
    ));

    let starter = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };

    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    assert!(!starter.is_finished(), "no surface yet, keep waiting");

    host.set_ready(true);
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert!(starter.is_finished());
    starter.await.unwrap();

    assert!(status.last().unwrap().contains("Enter an API key"));
}

#[tokio::test(start_paused = true)]
async fn start_with_a_stored_key_reports_it_loaded() {
    let r = rig(MAP_URL, MockSearch::new());
    r.primary.set("places_api_key", TEST_API_KEY).await.unwrap();

    r.session.start().await;
    assert!(r.status.last().unwrap().contains("API key loaded"));
}

#[tokio::test(start_paused = true)]
async fn odd_looking_key_saves_with_a_warning_status() {
    let r = rig(MAP_URL, MockSearch::new());
    r.session.save_credential("weird-key").await.unwrap();
    assert!(r.status.last().unwrap().contains("looks unusual"));

    // Still usable for a search afterwards.
    r.session.use_map_center(1000);
    let total = r.session.run_search(1000, restaurants()).await.unwrap();
    assert_eq!(total, 0);
}
