// Trait abstractions for the overlay's external collaborators.
//
// HostPage - read-only view of the page the overlay is injected into. The
//   overlay never calls into a host map object; URL and viewport are the
//   whole contract.
// OverlaySurface - the one component allowed to mutate the overlay's DOM
//   region: indicators and pins live behind it.
// KeyValueStore - durable string storage; two instances form the two-tier
//   credential persistence.
// NearbySearch - the places endpoint; implemented by PlacesClient below.
// StatusSink - the user-visible status line owned by the control surface.
//
// These enable deterministic testing with the mocks in `testing`:
// no network and no real clock.

use anyhow::Result;
use async_trait::async_trait;

use pinpoint_common::ScreenPoint;
use places_client::{Place, PlacesClient};

/// Read-only surface of the host page. Implementations must not reach into
/// host map internals; the URL is the only source of geographic state.
pub trait HostPage: Send + Sync {
    /// The page's current full URL.
    fn current_url(&self) -> String;

    /// Viewport width and height in pixels.
    fn viewport(&self) -> (f64, f64);

    /// Whether a recognizable map container is present yet.
    fn map_surface_present(&self) -> bool;
}

/// Owner of the overlay's visual elements. Pins are keyed by their absolute
/// zero-based rank in the ranked result set.
pub trait OverlaySurface: Send + Sync {
    /// Show the center dot, anchored at the viewport's visual center.
    fn show_center_indicator(&self);

    /// Show the radius circle at the viewport center with the given pixel
    /// diameter.
    fn show_radius_indicator(&self, diameter_px: f64);

    /// Resize the existing radius circle without recreating it.
    fn resize_radius_indicator(&self, diameter_px: f64);

    /// Create a numbered result pin. `title` is the hover/click-through text.
    fn add_result_pin(&self, rank: usize, title: &str);

    /// Move a pin to a viewport position.
    fn position_result_pin(&self, rank: usize, position: ScreenPoint);

    /// Hide or reveal a pin without destroying it.
    fn set_pin_visible(&self, rank: usize, visible: bool);

    /// Destroy all result pins.
    fn remove_result_pins(&self);

    /// Destroy every overlay element (indicators and pins).
    fn clear(&self);
}

/// Durable string storage scoped to the extension profile.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One nearby-place query against the places endpoint.
#[async_trait]
pub trait NearbySearch: Send + Sync {
    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        place_type: Option<&str>,
        api_key: &str,
    ) -> places_client::Result<Vec<Place>>;
}

#[async_trait]
impl NearbySearch for PlacesClient {
    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        place_type: Option<&str>,
        api_key: &str,
    ) -> places_client::Result<Vec<Place>> {
        self.nearby_search(lat, lng, radius_m, place_type, api_key)
            .await
    }
}

/// User-visible status line. Messages are short and presentable; no raw
/// error objects pass through here.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}
