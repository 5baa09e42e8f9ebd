//! Best-effort observation of the host map's view state. The host exposes no
//! viewport-change event and no map API, so the current (center, zoom) is
//! parsed out of the page URL and re-checked by polling.

use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use regex::Regex;

use pinpoint_common::{GeoPoint, MapViewState};

use crate::traits::HostPage;

/// Path segment `@lat,lng,ZOOMz`, the canonical form while navigating.
static AT_ZOOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*),(-?\d+\.?\d*)z").expect("valid regex")
});

/// Nested path form `/maps/@lat,lng,zoom` without the z suffix.
static MAPS_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/maps/@(-?\d+\.?\d*),(-?\d+\.?\d*),(-?\d+\.?\d*)").expect("valid regex")
});

/// Fragment form `#...@lat,lng,zoom`.
static FRAGMENT_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*),(-?\d+\.?\d*)").expect("valid regex")
});

/// Extract the host map's view state from its URL. Matchers are tried in
/// order; the first match wins. Returns `None` when no pattern matches,
/// a normal outcome, not an error.
pub fn extract_view_state(url: &str, default_zoom: f64) -> Option<MapViewState> {
    if let Some(state) = AT_ZOOM_RE.captures(url).and_then(view_from_captures) {
        return Some(state);
    }
    if let Some(state) = MAPS_AT_RE.captures(url).and_then(view_from_captures) {
        return Some(state);
    }

    let parsed = url::Url::parse(url).ok()?;
    if let Some(state) = parsed
        .fragment()
        .and_then(|f| FRAGMENT_AT_RE.captures(f))
        .and_then(view_from_captures)
    {
        return Some(state);
    }

    // Query-parameter fallback carries no zoom; assume the default.
    let center = parsed
        .query_pairs()
        .find(|(k, _)| k == "center")
        .map(|(_, v)| v.into_owned())?;
    let mut parts = center.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lng: f64 = parts.next()?.trim().parse().ok()?;
    Some(MapViewState {
        center: GeoPoint::new(lat, lng),
        zoom: default_zoom,
    })
}

fn view_from_captures(caps: regex::Captures<'_>) -> Option<MapViewState> {
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lng: f64 = caps.get(2)?.as_str().parse().ok()?;
    let zoom: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(MapViewState {
        center: GeoPoint::new(lat, lng),
        zoom,
    })
}

struct ObserverInner {
    last_url: String,
    current: Option<MapViewState>,
    last_known: Option<MapViewState>,
}

/// Owner of the best-known view state. One instance per page session; all
/// cached state lives here rather than in globals.
pub struct ViewObserver {
    host: Arc<dyn HostPage>,
    default_zoom: f64,
    inner: Mutex<ObserverInner>,
}

impl ViewObserver {
    pub fn new(host: Arc<dyn HostPage>, default_zoom: f64) -> Self {
        Self {
            host,
            default_zoom,
            inner: Mutex::new(ObserverInner {
                last_url: String::new(),
                current: None,
                last_known: None,
            }),
        }
    }

    /// Re-extract the view state from the host URL, replacing the cached
    /// state wholesale.
    pub fn observe(&self) -> Option<MapViewState> {
        let url = self.host.current_url();
        let state = extract_view_state(&url, self.default_zoom);
        let mut inner = self.inner.lock().unwrap();
        inner.last_url = url;
        inner.current = state;
        if state.is_some() {
            inner.last_known = state;
        }
        state
    }

    /// One poll tick: returns the freshly extracted state only when the host
    /// URL changed since the previous look and the new URL parses. An
    /// unchanged URL or an unparseable new one yields `None`.
    pub fn check_for_change(&self) -> Option<MapViewState> {
        let url = self.host.current_url();
        let mut inner = self.inner.lock().unwrap();
        if url == inner.last_url {
            return None;
        }
        let state = extract_view_state(&url, self.default_zoom);
        inner.last_url = url;
        inner.current = state;
        if state.is_some() {
            inner.last_known = state;
        }
        state
    }

    /// View state from the most recent look, if it parsed.
    pub fn current(&self) -> Option<MapViewState> {
        self.inner.lock().unwrap().current
    }

    /// Most recent state that ever parsed, surviving unparseable URLs.
    pub fn last_known(&self) -> Option<MapViewState> {
        self.inner.lock().unwrap().last_known
    }

    /// Best-known state: the current one, else the last that parsed.
    pub fn best_known(&self) -> Option<MapViewState> {
        let inner = self.inner.lock().unwrap();
        inner.current.or(inner.last_known)
    }

    /// Poll until the host exposes a recognizable map surface. Probes
    /// immediately, then at `poll` intervals; runs until success. Cancelled
    /// by dropping the future (session teardown).
    pub async fn wait_for_host_ready(&self, poll: Duration) {
        let mut ticker = tokio::time::interval(poll);
        loop {
            ticker.tick().await;
            if self.host.map_surface_present() {
                tracing::info!("Host map surface detected");
                return;
            }
            tracing::debug!("Host map surface not present yet");
        }
    }
}
