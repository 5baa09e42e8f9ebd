// Test mocks for the overlay engine.
//
// Five mocks matching the five trait boundaries:
// - MockHostPage (HostPage) - settable URL, viewport, readiness flag
// - RecordingSurface (OverlaySurface) - records every overlay mutation
// - MemoryStore (KeyValueStore) - HashMap storage with failure toggles
// - MockSearch (NearbySearch) - per-subtype canned outcomes
// - RecordingStatus (StatusSink) - captures status lines
//
// Plus fixture helpers for Place records. No network and no real clock:
// `cargo test` in seconds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use pinpoint_common::ScreenPoint;
use places_client::{Geometry, LatLng, Place, PlacesError};

use crate::traits::{HostPage, KeyValueStore, NearbySearch, OverlaySurface, StatusSink};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// An API key that passes the credential shape heuristic.
pub const TEST_API_KEY: &str = "AIzaTestKey0123456789abcdefghijk";

/// Minimal place record with a review count and no location.
pub fn place(id: &str, reviews: u32) -> Place {
    Place {
        place_id: id.to_string(),
        name: format!("Place {id}"),
        rating: None,
        user_ratings_total: Some(reviews),
        vicinity: None,
        formatted_address: None,
        geometry: None,
        photos: Vec::new(),
    }
}

/// Place record with a location, for marker tests.
pub fn place_at(id: &str, reviews: u32, lat: f64, lng: f64) -> Place {
    let mut p = place(id, reviews);
    p.geometry = Some(Geometry {
        location: LatLng { lat, lng },
    });
    p
}

// ---------------------------------------------------------------------------
// MockHostPage
// ---------------------------------------------------------------------------

pub struct MockHostPage {
    url: Mutex<String>,
    viewport: Mutex<(f64, f64)>,
    ready: AtomicBool,
}

impl MockHostPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            viewport: Mutex::new((1280.0, 720.0)),
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        *self.viewport.lock().unwrap() = (width, height);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl HostPage for MockHostPage {
    fn current_url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    fn viewport(&self) -> (f64, f64) {
        *self.viewport.lock().unwrap()
    }

    fn map_surface_present(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// RecordingSurface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PinState {
    pub title: String,
    pub position: Option<ScreenPoint>,
    pub visible: bool,
}

#[derive(Default)]
struct SurfaceState {
    center_shown: bool,
    radius_diameter: Option<f64>,
    radius_resizes: u32,
    pins: HashMap<usize, PinState>,
    clears: u32,
}

#[derive(Default)]
pub struct RecordingSurface {
    state: Mutex<SurfaceState>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center_shown(&self) -> bool {
        self.state.lock().unwrap().center_shown
    }

    pub fn radius_diameter(&self) -> Option<f64> {
        self.state.lock().unwrap().radius_diameter
    }

    pub fn radius_resizes(&self) -> u32 {
        self.state.lock().unwrap().radius_resizes
    }

    pub fn pin(&self, rank: usize) -> Option<PinState> {
        self.state.lock().unwrap().pins.get(&rank).cloned()
    }

    pub fn pin_count(&self) -> usize {
        self.state.lock().unwrap().pins.len()
    }

    pub fn pin_ranks(&self) -> Vec<usize> {
        let mut ranks: Vec<usize> = self.state.lock().unwrap().pins.keys().copied().collect();
        ranks.sort_unstable();
        ranks
    }

    pub fn clears(&self) -> u32 {
        self.state.lock().unwrap().clears
    }
}

impl OverlaySurface for RecordingSurface {
    fn show_center_indicator(&self) {
        self.state.lock().unwrap().center_shown = true;
    }

    fn show_radius_indicator(&self, diameter_px: f64) {
        self.state.lock().unwrap().radius_diameter = Some(diameter_px);
    }

    fn resize_radius_indicator(&self, diameter_px: f64) {
        let mut state = self.state.lock().unwrap();
        state.radius_diameter = Some(diameter_px);
        state.radius_resizes += 1;
    }

    fn add_result_pin(&self, rank: usize, title: &str) {
        self.state.lock().unwrap().pins.insert(
            rank,
            PinState {
                title: title.to_string(),
                position: None,
                visible: true,
            },
        );
    }

    fn position_result_pin(&self, rank: usize, position: ScreenPoint) {
        if let Some(pin) = self.state.lock().unwrap().pins.get_mut(&rank) {
            pin.position = Some(position);
        }
    }

    fn set_pin_visible(&self, rank: usize, visible: bool) {
        if let Some(pin) = self.state.lock().unwrap().pins.get_mut(&rank) {
            pin.visible = visible;
        }
    }

    fn remove_result_pins(&self) {
        self.state.lock().unwrap().pins.clear();
    }

    fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.center_shown = false;
        state.radius_diameter = None;
        state.pins.clear();
        state.clears += 1;
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
    reads_fail: AtomicBool,
    writes_fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.reads_fail.load(Ordering::SeqCst) {
            bail!("MemoryStore: reads disabled");
        }
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            bail!("MemoryStore: writes disabled");
        }
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

enum CannedOutcome {
    Results(Vec<Place>),
    NetworkError,
    ApiError(String),
    /// Never completes on its own; only a caller-side timeout ends it.
    Hang,
}

/// Per-subtype canned nearby-search outcomes. Builder pattern: `.on()`,
/// `.fail()`, `.api_error()`, `.hang()`. Unregistered subtypes return empty
/// results. Records every dispatched subtype and the key used.
#[derive(Default)]
pub struct MockSearch {
    outcomes: Mutex<HashMap<String, CannedOutcome>>,
    calls: Mutex<Vec<String>>,
    keys_seen: Mutex<Vec<String>>,
}

fn subtype_key(subtype: Option<&str>) -> String {
    subtype.unwrap_or("<untyped>").to_string()
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, subtype: &str, places: Vec<Place>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(subtype.to_string(), CannedOutcome::Results(places));
        self
    }

    pub fn fail(self, subtype: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(subtype.to_string(), CannedOutcome::NetworkError);
        self
    }

    pub fn api_error(self, subtype: &str, status: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(subtype.to_string(), CannedOutcome::ApiError(status.to_string()));
        self
    }

    pub fn hang(self, subtype: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(subtype.to_string(), CannedOutcome::Hang);
        self
    }

    /// Make every unregistered subtype fail at the transport level.
    pub fn fail_all(self) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert("*".to_string(), CannedOutcome::NetworkError);
        self
    }

    /// Subtypes dispatched, in call order (`<untyped>` for the typeless
    /// fallback query).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys_seen(&self) -> Vec<String> {
        self.keys_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl NearbySearch for MockSearch {
    async fn nearby(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_m: u32,
        place_type: Option<&str>,
        api_key: &str,
    ) -> places_client::Result<Vec<Place>> {
        let key = subtype_key(place_type);
        self.calls.lock().unwrap().push(key.clone());
        self.keys_seen.lock().unwrap().push(api_key.to_string());

        enum Action {
            Results(Vec<Place>),
            Network,
            Api(String),
            Hang,
        }

        let action = {
            let outcomes = self.outcomes.lock().unwrap();
            match outcomes.get(&key).or_else(|| outcomes.get("*")) {
                None => Action::Results(Vec::new()),
                Some(CannedOutcome::Results(places)) => Action::Results(places.clone()),
                Some(CannedOutcome::NetworkError) => Action::Network,
                Some(CannedOutcome::ApiError(status)) => Action::Api(status.clone()),
                Some(CannedOutcome::Hang) => Action::Hang,
            }
        };

        match action {
            Action::Results(places) => Ok(places),
            Action::Network => Err(PlacesError::Network("connection refused".to_string())),
            Action::Api(status) => Err(PlacesError::Api {
                status,
                message: "canned upstream error".to_string(),
            }),
            Action::Hang => {
                // Out-waits any reasonable request timeout under a paused
                // clock without pending forever if a test forgets one.
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(PlacesError::Network("hang elapsed".to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingStatus
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingStatus {
    messages: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }
}

impl StatusSink for RecordingStatus {
    fn status(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
