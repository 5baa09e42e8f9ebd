use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Timing and layout knobs for the overlay engine. Every poll interval is an
/// explicit field so tests can run the loops against a virtual clock.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// How often to probe for the host map surface before the overlay starts.
    pub host_ready_poll_ms: u64,
    /// Coarse URL poll used to track view changes while indicators are shown.
    pub view_poll_ms: u64,
    /// Position-refresh loop for result pins while results are shown.
    pub marker_refresh_ms: u64,
    /// Upper bound on a single nearby-search request.
    pub search_timeout_secs: u64,
    /// Pins within this many pixels beyond the viewport stay rendered;
    /// beyond it they are hidden, not removed.
    pub viewport_margin_px: f64,
    /// Zoom assumed when the host URL carries a center but no zoom.
    pub default_zoom: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            host_ready_poll_ms: 2000,
            view_poll_ms: 500,
            marker_refresh_ms: 100,
            search_timeout_secs: 10,
            viewport_margin_px: 100.0,
            default_zoom: 14.0,
        }
    }
}

impl OverlayConfig {
    /// Load configuration, honoring `PINPOINT_*` environment overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host_ready_poll_ms: env_or("PINPOINT_HOST_READY_POLL_MS", defaults.host_ready_poll_ms),
            view_poll_ms: env_or("PINPOINT_VIEW_POLL_MS", defaults.view_poll_ms),
            marker_refresh_ms: env_or("PINPOINT_MARKER_REFRESH_MS", defaults.marker_refresh_ms),
            search_timeout_secs: env_or("PINPOINT_SEARCH_TIMEOUT_SECS", defaults.search_timeout_secs),
            viewport_margin_px: env_or("PINPOINT_VIEWPORT_MARGIN_PX", defaults.viewport_margin_px),
            default_zoom: env_or("PINPOINT_DEFAULT_ZOOM", defaults.default_zoom),
        }
    }

    pub fn host_ready_poll(&self) -> Duration {
        Duration::from_millis(self.host_ready_poll_ms)
    }

    pub fn view_poll(&self) -> Duration {
        Duration::from_millis(self.view_poll_ms)
    }

    pub fn marker_refresh(&self) -> Duration {
        Duration::from_millis(self.marker_refresh_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, raw = raw.as_str(), "Unparseable override, using default");
            default
        }),
        Err(_) => default,
    }
}
