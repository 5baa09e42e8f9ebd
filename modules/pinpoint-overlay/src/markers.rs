//! Overlay rendering: a center dot and radius circle anchored at the
//! viewport's visual center, plus numbered result pins positioned by
//! projection. The selected center always renders at the screen center; the
//! map moves and zooms around it, and polling keeps everything aligned.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use pinpoint_common::{GeoPoint, MapViewState, OverlayConfig};
use places_client::Place;

use crate::geo;
use crate::traits::{HostPage, OverlaySurface};
use crate::view::ViewObserver;

/// Visual session state. `clear_all` returns to `Idle` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    CenterShown,
    ResultsShown,
}

struct ResultMarker {
    /// Absolute zero-based rank in the full ranked set; also the pin key.
    rank: usize,
    point: GeoPoint,
    visible: bool,
}

struct RendererInner {
    state: OverlayState,
    center: Option<GeoPoint>,
    radius_m: u32,
    markers: Vec<ResultMarker>,
}

/// A spawned poll loop. Dropping the handle cancels the task.
struct LoopHandle {
    cancel: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

pub struct OverlayRenderer {
    surface: Arc<dyn OverlaySurface>,
    observer: Arc<ViewObserver>,
    host: Arc<dyn HostPage>,
    config: OverlayConfig,
    inner: Mutex<RendererInner>,
    view_loop: Mutex<Option<LoopHandle>>,
    marker_loop: Mutex<Option<LoopHandle>>,
}

impl OverlayRenderer {
    pub fn new(
        surface: Arc<dyn OverlaySurface>,
        observer: Arc<ViewObserver>,
        host: Arc<dyn HostPage>,
        config: OverlayConfig,
    ) -> Self {
        Self {
            surface,
            observer,
            host,
            config,
            inner: Mutex::new(RendererInner {
                state: OverlayState::Idle,
                center: None,
                radius_m: 0,
                markers: Vec::new(),
            }),
            view_loop: Mutex::new(None),
            marker_loop: Mutex::new(None),
        }
    }

    pub fn state(&self) -> OverlayState {
        self.inner.lock().unwrap().state
    }

    /// Show the center dot and radius circle for a fresh session and start
    /// the coarse view poll that keeps the circle sized to the zoom.
    pub fn show_center_and_radius(self: &Arc<Self>, center: GeoPoint, radius_m: u32) {
        self.clear_all();

        self.surface.show_center_indicator();
        let diameter = self.current_diameter(center, radius_m);
        self.surface.show_radius_indicator(diameter);

        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = OverlayState::CenterShown;
            inner.center = Some(center);
            inner.radius_m = radius_m;
        }
        self.ensure_view_poll();
        info!(radius_m, diameter_px = diameter, "Center and radius shown");
    }

    /// Resize the radius circle for an edited radius without recreating the
    /// indicator elements. No-op while idle.
    pub fn update_radius(&self, radius_m: u32) {
        let center = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == OverlayState::Idle {
                return;
            }
            inner.radius_m = radius_m;
            inner.center
        };
        let Some(center) = center else { return };
        let diameter = self.current_diameter(center, radius_m);
        self.surface.resize_radius_indicator(diameter);
        debug!(radius_m, diameter_px = diameter, "Radius circle resized");
    }

    /// Create numbered pins for one page of results. Ranks are absolute:
    /// `start_rank` is the page's offset into the full ranked set and labels
    /// are 1-based. Results without a location get no pin. Callers clear the
    /// previous page's pins first; marker sets must not overlap.
    pub fn show_result_markers(self: &Arc<Self>, places: &[Place], start_rank: usize) {
        let mut created = 0usize;
        {
            let mut inner = self.inner.lock().unwrap();
            for (i, place) in places.iter().enumerate() {
                let Some((lat, lng)) = place.location() else {
                    debug!(place_id = %place.place_id, "Result has no location, no pin");
                    continue;
                };
                let rank = start_rank + i;
                self.surface
                    .add_result_pin(rank, &format!("{}. {}", rank + 1, place.name));
                inner.markers.push(ResultMarker {
                    rank,
                    point: GeoPoint::new(lat, lng),
                    visible: true,
                });
                created += 1;
            }
            if created > 0 {
                inner.state = OverlayState::ResultsShown;
            }
        }

        if let Some(view) = self.observer.best_known() {
            self.position_markers(&view);
        }
        if created > 0 {
            self.ensure_marker_refresh();
        }
        info!(pins = created, start_rank, "Result markers shown");
    }

    /// Remove all result pins and stop the refresh loop, keeping the center
    /// and radius indicators (and their poll) alive.
    pub fn clear_result_markers(&self) {
        self.marker_loop.lock().unwrap().take();
        let mut inner = self.inner.lock().unwrap();
        inner.markers.clear();
        self.surface.remove_result_pins();
        if inner.state == OverlayState::ResultsShown {
            inner.state = if inner.center.is_some() {
                OverlayState::CenterShown
            } else {
                OverlayState::Idle
            };
        }
    }

    /// Tear down the whole visual session: both poll loops stop as a unit,
    /// every overlay element is released, state returns to `Idle`.
    pub fn clear_all(&self) {
        self.view_loop.lock().unwrap().take();
        self.marker_loop.lock().unwrap().take();

        let mut inner = self.inner.lock().unwrap();
        inner.markers.clear();
        inner.center = None;
        inner.state = OverlayState::Idle;
        drop(inner);

        self.surface.clear();
    }

    /// Run one change check immediately. The poll loops call this on every
    /// tick; host glue with its own change signal (e.g. a DOM-mutation
    /// observer) may call it too; the check is idempotent and cheap when
    /// the URL is unchanged.
    pub fn refresh_now(&self) {
        if let Some(view) = self.observer.check_for_change() {
            self.apply_view_change(&view);
        }
    }

    fn apply_view_change(&self, view: &MapViewState) {
        let (radius_m, center_shown, have_markers) = {
            let inner = self.inner.lock().unwrap();
            (
                inner.radius_m,
                inner.center.is_some(),
                !inner.markers.is_empty(),
            )
        };
        if center_shown {
            let diameter =
                geo::meters_to_pixel_diameter(radius_m as f64, view.zoom, view.center.lat);
            self.surface.resize_radius_indicator(diameter);
        }
        if have_markers {
            self.position_markers(view);
        }
    }

    fn position_markers(&self, view: &MapViewState) {
        let (width, height) = self.host.viewport();
        let margin = self.config.viewport_margin_px;

        let mut inner = self.inner.lock().unwrap();
        for marker in &mut inner.markers {
            let position = geo::project_to_screen(marker.point, view, width, height)
                .unwrap_or_else(|| {
                    // Fallback: linear-degrees approximation.
                    geo::project_to_screen_linear(marker.point, view, width, height)
                });

            let within = position.x >= -margin
                && position.x <= width + margin
                && position.y >= -margin
                && position.y <= height + margin;

            if within {
                self.surface.position_result_pin(marker.rank, position);
                if !marker.visible {
                    self.surface.set_pin_visible(marker.rank, true);
                    marker.visible = true;
                }
            } else if marker.visible {
                // Hidden, not removed: the pin comes back without flicker
                // when the view swings past it again.
                self.surface.set_pin_visible(marker.rank, false);
                marker.visible = false;
            }
        }
    }

    fn current_diameter(&self, center: GeoPoint, radius_m: u32) -> f64 {
        let (zoom, lat) = match self.observer.best_known() {
            Some(view) => (view.zoom, view.center.lat),
            None => (self.config.default_zoom, center.lat),
        };
        geo::meters_to_pixel_diameter(radius_m as f64, zoom, lat)
    }

    fn ensure_view_poll(self: &Arc<Self>) {
        let mut slot = self.view_loop.lock().unwrap();
        if slot.is_none() {
            *slot = Some(spawn_poll_loop(
                Arc::downgrade(self),
                self.config.view_poll(),
            ));
        }
    }

    fn ensure_marker_refresh(self: &Arc<Self>) {
        let mut slot = self.marker_loop.lock().unwrap();
        if slot.is_none() {
            *slot = Some(spawn_poll_loop(
                Arc::downgrade(self),
                self.config.marker_refresh(),
            ));
        }
    }
}

/// Tick `refresh_now` at a fixed period until cancelled or the renderer is
/// gone. The weak reference keeps page teardown from leaking timers: once
/// the renderer drops, the next tick exits the task.
fn spawn_poll_loop(renderer: Weak<OverlayRenderer>, period: Duration) -> LoopHandle {
    let (cancel, mut cancelled) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(renderer) = renderer.upgrade() else { break };
                    renderer.refresh_now();
                }
                _ = cancelled.changed() => break,
            }
        }
    });
    LoopHandle {
        cancel,
        _task: task,
    }
}
