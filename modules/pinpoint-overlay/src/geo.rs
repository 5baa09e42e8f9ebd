//! Web-Mercator projection math. Pure functions over an observed
//! (center, zoom) pair; no state, no side effects.

use std::f64::consts::PI;

use pinpoint_common::{GeoPoint, MapViewState, ScreenPoint};

/// Web map tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Earth's circumference in meters at the equator.
pub const EARTH_CIRCUMFERENCE_METERS: f64 = 40_075_016.686;

/// Smallest radius-indicator diameter that stays visible.
pub const MIN_DIAMETER_PX: f64 = 20.0;

/// Largest radius-indicator diameter before it dwarfs the viewport.
pub const MAX_DIAMETER_PX: f64 = 800.0;

/// Meters per degree of latitude, used only by the linear fallback.
const METERS_PER_DEGREE: f64 = 111_319.9;

/// Pixel diameter of a circle covering `radius_meters` at the given zoom and
/// latitude. Clamped to [MIN_DIAMETER_PX, MAX_DIAMETER_PX]; a non-finite raw
/// value (latitude at the poles) clamps to the maximum rather than
/// propagating.
pub fn meters_to_pixel_diameter(radius_meters: f64, zoom: f64, lat: f64) -> f64 {
    let pixels_per_meter =
        (TILE_SIZE * 2f64.powf(zoom)) / (EARTH_CIRCUMFERENCE_METERS * lat.to_radians().cos());
    let raw = radius_meters * pixels_per_meter * 2.0;
    let diameter = if raw.is_finite() { raw } else { f64::MAX };
    diameter.clamp(MIN_DIAMETER_PX, MAX_DIAMETER_PX)
}

/// Project a point into viewport pixels under the view's Mercator world.
///
/// Both the point and the view center are converted to world pixel
/// coordinates at the view's zoom; the delta is applied to the viewport's
/// geometric center. Returns `None` when the math degenerates (latitudes at
/// the projection's singularities); callers fall back to
/// [`project_to_screen_linear`].
pub fn project_to_screen(
    point: GeoPoint,
    view: &MapViewState,
    viewport_w: f64,
    viewport_h: f64,
) -> Option<ScreenPoint> {
    let (world_cx, world_cy) = world_pixel(view.center, view.zoom);
    let (world_px, world_py) = world_pixel(point, view.zoom);

    let x = viewport_w / 2.0 + (world_px - world_cx);
    let y = viewport_h / 2.0 + (world_py - world_cy);
    (x.is_finite() && y.is_finite()).then_some(ScreenPoint { x, y })
}

/// Linear-degrees approximation of [`project_to_screen`]. Less accurate away
/// from the view center; used only as an explicit fallback when the precise
/// projection is unavailable.
pub fn project_to_screen_linear(
    point: GeoPoint,
    view: &MapViewState,
    viewport_w: f64,
    viewport_h: f64,
) -> ScreenPoint {
    let center_lat_rad = view.center.lat.to_radians();
    let pixels_per_meter = (TILE_SIZE * 2f64.powf(view.zoom))
        / (EARTH_CIRCUMFERENCE_METERS * center_lat_rad.cos());

    let lat_diff_m = (point.lat - view.center.lat) * METERS_PER_DEGREE;
    let lng_diff_m = (point.lng - view.center.lng) * METERS_PER_DEGREE * center_lat_rad.cos();

    ScreenPoint {
        x: viewport_w / 2.0 + lng_diff_m * pixels_per_meter,
        // Screen y grows downward.
        y: viewport_h / 2.0 - lat_diff_m * pixels_per_meter,
    }
}

fn world_pixel(point: GeoPoint, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat_rad = point.lat.to_radians();
    let lng_rad = point.lng.to_radians();
    let x = scale * (lng_rad + PI) / (2.0 * PI);
    let y = scale * (PI - (PI / 4.0 + lat_rad / 2.0).tan().ln()) / (2.0 * PI);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(lat: f64, lng: f64, zoom: f64) -> MapViewState {
        MapViewState {
            center: GeoPoint::new(lat, lng),
            zoom,
        }
    }

    // --- meters_to_pixel_diameter ---

    #[test]
    fn diameter_always_within_clamp_bounds() {
        for &radius in &[1.0, 100.0, 5_000.0, 50_000.0, 1_000_000.0] {
            for &zoom in &[1.0, 8.0, 14.0, 21.0] {
                for &lat in &[-84.9, -45.0, 0.0, 37.7749, 84.9] {
                    let d = meters_to_pixel_diameter(radius, zoom, lat);
                    assert!(
                        (MIN_DIAMETER_PX..=MAX_DIAMETER_PX).contains(&d),
                        "radius {radius} zoom {zoom} lat {lat} gave {d}"
                    );
                }
            }
        }
    }

    #[test]
    fn diameter_monotonic_in_radius_before_clamp() {
        // Pick a zoom/lat where neither endpoint clamps.
        let small = meters_to_pixel_diameter(500.0, 14.0, 45.0);
        let large = meters_to_pixel_diameter(900.0, 14.0, 45.0);
        assert!(small < large, "expected {small} < {large}");
    }

    #[test]
    fn huge_radius_clamps_to_max() {
        assert_eq!(meters_to_pixel_diameter(1_000_000.0, 14.0, 45.0), 800.0);
    }

    #[test]
    fn tiny_radius_clamps_to_min() {
        assert_eq!(meters_to_pixel_diameter(1.0, 1.0, 45.0), 20.0);
    }

    #[test]
    fn polar_latitude_clamps_instead_of_exploding() {
        let d = meters_to_pixel_diameter(1000.0, 14.0, 90.0);
        assert_eq!(d, 800.0);
        assert!(d.is_finite());
    }

    // --- project_to_screen ---

    #[test]
    fn view_center_projects_to_viewport_center() {
        let v = view(37.7749, -122.4194, 14.0);
        let pos = project_to_screen(v.center, &v, 1280.0, 720.0).unwrap();
        assert!((pos.x - 640.0).abs() < 1e-9);
        assert!((pos.y - 360.0).abs() < 1e-9);
    }

    #[test]
    fn point_east_of_center_lands_right_of_center() {
        let v = view(37.7749, -122.4194, 14.0);
        let east = GeoPoint::new(37.7749, -122.4000);
        let pos = project_to_screen(east, &v, 1280.0, 720.0).unwrap();
        assert!(pos.x > 640.0);
        assert!((pos.y - 360.0).abs() < 1.0);
    }

    #[test]
    fn point_north_of_center_lands_above_center() {
        let v = view(37.7749, -122.4194, 14.0);
        let north = GeoPoint::new(37.7900, -122.4194);
        let pos = project_to_screen(north, &v, 1280.0, 720.0).unwrap();
        assert!(pos.y < 360.0);
        assert!((pos.x - 640.0).abs() < 1.0);
    }

    #[test]
    fn doubling_zoom_doubles_the_offset() {
        let v14 = view(37.7749, -122.4194, 14.0);
        let v15 = view(37.7749, -122.4194, 15.0);
        let east = GeoPoint::new(37.7749, -122.4000);
        let at14 = project_to_screen(east, &v14, 1000.0, 1000.0).unwrap();
        let at15 = project_to_screen(east, &v15, 1000.0, 1000.0).unwrap();
        let off14 = at14.x - 500.0;
        let off15 = at15.x - 500.0;
        assert!((off15 - off14 * 2.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_latitude_returns_none() {
        // Past the projection's singularity tan() goes negative and the
        // world-pixel math produces NaN.
        let v = view(0.0, 0.0, 10.0);
        let garbage = GeoPoint::new(180.0, 0.0);
        assert!(project_to_screen(garbage, &v, 800.0, 600.0).is_none());
    }

    // --- project_to_screen_linear ---

    #[test]
    fn linear_fallback_agrees_with_precise_near_center() {
        let v = view(37.7749, -122.4194, 14.0);
        let nearby = GeoPoint::new(37.7760, -122.4170);
        let precise = project_to_screen(nearby, &v, 1280.0, 720.0).unwrap();
        let linear = project_to_screen_linear(nearby, &v, 1280.0, 720.0);
        assert!((precise.x - linear.x).abs() < 2.0);
        assert!((precise.y - linear.y).abs() < 2.0);
    }
}
