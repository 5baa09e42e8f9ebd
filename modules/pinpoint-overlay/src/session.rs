//! One overlay session per page: owns the selected center, the pager, and
//! the wiring between observer, renderer, orchestrator and credential store.
//! The control surface calls in here and renders the status lines; nothing
//! else touches session state.

use std::sync::{Arc, Mutex};

use tracing::info;

use pinpoint_common::{GeoPoint, OverlayConfig, OverlayError, SearchFilters};
use places_client::Place;

use crate::markers::OverlayRenderer;
use crate::pager::ResultsPager;
use crate::search::SearchOrchestrator;
use crate::store::CredentialStore;
use crate::traits::{HostPage, KeyValueStore, NearbySearch, OverlaySurface, StatusSink};
use crate::view::ViewObserver;

pub struct OverlaySession {
    observer: Arc<ViewObserver>,
    renderer: Arc<OverlayRenderer>,
    orchestrator: SearchOrchestrator,
    credentials: Arc<CredentialStore>,
    status: Arc<dyn StatusSink>,
    config: OverlayConfig,
    selected_center: Mutex<Option<GeoPoint>>,
    pager: Mutex<Option<ResultsPager>>,
}

impl OverlaySession {
    pub fn new(
        host: Arc<dyn HostPage>,
        surface: Arc<dyn OverlaySurface>,
        searcher: Arc<dyn NearbySearch>,
        primary_store: Arc<dyn KeyValueStore>,
        backup_store: Arc<dyn KeyValueStore>,
        status: Arc<dyn StatusSink>,
        config: OverlayConfig,
    ) -> Self {
        let observer = Arc::new(ViewObserver::new(host.clone(), config.default_zoom));
        let credentials = Arc::new(CredentialStore::new(primary_store, backup_store));
        let renderer = Arc::new(OverlayRenderer::new(
            surface,
            observer.clone(),
            host,
            config.clone(),
        ));
        let orchestrator = SearchOrchestrator::new(searcher, credentials.clone(), &config);
        Self {
            observer,
            renderer,
            orchestrator,
            credentials,
            status,
            config,
            selected_center: Mutex::new(None),
            pager: Mutex::new(None),
        }
    }

    /// Block until the host page shows a map surface, then report readiness
    /// with whatever credential state we find.
    pub async fn start(&self) {
        self.observer
            .wait_for_host_ready(self.config.host_ready_poll())
            .await;
        match self.credentials.load().await {
            Ok(Some(_)) => self
                .status
                .status("API key loaded. Select the map center to start."),
            Ok(None) => self
                .status
                .status("Enter an API key, then select the map center to start."),
            Err(e) => self.status.status(&e.to_string()),
        }
    }

    /// Fix the search center from the map's current view. An unreadable view
    /// is a normal outcome: the action is skipped and explained, nothing
    /// fails.
    pub fn use_map_center(&self, radius_m: u32) -> Option<GeoPoint> {
        match self.observer.observe() {
            Some(view) => {
                *self.selected_center.lock().unwrap() = Some(view.center);
                self.renderer.show_center_and_radius(view.center, radius_m);
                info!(
                    lat = view.center.lat,
                    lng = view.center.lng,
                    zoom = view.zoom,
                    "Center selected from map view"
                );
                self.status.status(&format!(
                    "Using center: {:.6}, {:.6}. Ready to search.",
                    view.center.lat, view.center.lng
                ));
                Some(view.center)
            }
            None => {
                self.status
                    .status("Could not detect the map location. Try navigating the map first.");
                None
            }
        }
    }

    /// React to an edited radius value: resize the circle and restate
    /// readiness. No-op until a center is selected.
    pub fn set_radius(&self, radius_m: u32) {
        let Some(center) = *self.selected_center.lock().unwrap() else {
            return;
        };
        self.renderer.update_radius(radius_m);
        self.status.status(&format!(
            "Center: {:.6}, {:.6}. Radius: {radius_m}m. Ready to search.",
            center.lat, center.lng
        ));
    }

    /// Run a search against the selected center and show the first page of
    /// results. Returns the total number of places found.
    pub async fn run_search(
        &self,
        radius_m: u32,
        filters: SearchFilters,
    ) -> Result<usize, OverlayError> {
        let Some(center) = *self.selected_center.lock().unwrap() else {
            self.status.status("Select a center point first.");
            return Err(OverlayError::Validation("no center selected".to_string()));
        };
        if !filters.any() {
            self.status
                .status("Select at least one place type to search.");
            return Err(OverlayError::Validation(
                "no place type selected".to_string(),
            ));
        }

        self.status.status("Searching for places...");
        match self.orchestrator.search(center, radius_m, &filters).await {
            Ok(places) if places.is_empty() => {
                self.renderer.clear_result_markers();
                *self.pager.lock().unwrap() = None;
                self.status.status("No places found in the searched area.");
                Ok(0)
            }
            Ok(places) => {
                let total = places.len();
                self.status
                    .status(&format!("Found {total} places. Check the results below."));
                let pager = ResultsPager::new(places);
                self.render_page(&pager);
                *self.pager.lock().unwrap() = Some(pager);
                Ok(total)
            }
            Err(e) => {
                self.status.status(&e.to_string());
                Err(e)
            }
        }
    }

    /// Advance to the next result page, replacing the markers with the new
    /// page's subset. Returns whether the page moved.
    pub fn next_page(&self) -> bool {
        let mut guard = self.pager.lock().unwrap();
        let Some(pager) = guard.as_mut() else {
            return false;
        };
        if pager.next_page() {
            self.render_page(pager);
            true
        } else {
            false
        }
    }

    /// Go back one result page. Returns whether the page moved.
    pub fn previous_page(&self) -> bool {
        let mut guard = self.pager.lock().unwrap();
        let Some(pager) = guard.as_mut() else {
            return false;
        };
        if pager.previous_page() {
            self.render_page(pager);
            true
        } else {
            false
        }
    }

    /// Persist the API key, relaying the store's outcome to the status line.
    pub async fn save_credential(&self, raw: &str) -> Result<(), OverlayError> {
        match self.credentials.save(raw).await {
            Ok(Some(warning)) => {
                self.status.status(&warning);
                Ok(())
            }
            Ok(None) => {
                self.status
                    .status("API key saved. Select the map center to start.");
                Ok(())
            }
            Err(e) => {
                self.status.status(&e.to_string());
                Err(e)
            }
        }
    }

    /// Reset everything: center, results, indicators, poll loops.
    pub fn clear(&self) {
        *self.selected_center.lock().unwrap() = None;
        *self.pager.lock().unwrap() = None;
        self.renderer.clear_all();
        self.status
            .status("Select the map center to start a new search.");
    }

    pub fn selected_center(&self) -> Option<GeoPoint> {
        *self.selected_center.lock().unwrap()
    }

    /// The current page's places, for the control surface's results panel.
    pub fn current_page(&self) -> Vec<Place> {
        let guard = self.pager.lock().unwrap();
        guard
            .as_ref()
            .map(|p| p.current_slice().to_vec())
            .unwrap_or_default()
    }

    /// (current page, page count, total results) for the control surface's
    /// pagination header.
    pub fn page_info(&self) -> Option<(usize, usize, usize)> {
        let guard = self.pager.lock().unwrap();
        guard
            .as_ref()
            .map(|p| (p.page(), p.page_count(), p.len()))
    }

    /// The renderer, for host glue that forwards its own change signals.
    pub fn renderer(&self) -> &Arc<OverlayRenderer> {
        &self.renderer
    }

    fn render_page(&self, pager: &ResultsPager) {
        self.renderer.clear_result_markers();
        self.renderer
            .show_result_markers(pager.current_slice(), pager.offset());
    }
}
