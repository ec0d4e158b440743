//! Viewport Projection
//!
//! Pure Web Mercator math mapping geographic coordinates to screen pixels
//! for a given viewport transform. No map instance is needed, so marker
//! positioning can be tested in isolation.

use crate::domain::value_objects::Coordinates;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tile size used by vector map renderers.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A position on screen, in CSS pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &ScreenPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Current pan/zoom/rotation state of a map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    /// Geographic point at the centre of the viewport
    pub center: Coordinates,
    /// Zoom level (0 = whole world in one tile)
    pub zoom: f64,
    /// Rotation in degrees, clockwise from north
    pub bearing: f64,
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels
    pub height: f64,
}

impl ViewportTransform {
    pub fn new(center: Coordinates, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            bearing: 0.0,
            width,
            height,
        }
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }
}

/// Project a coordinate to its world-pixel position at the given zoom.
fn to_world(coords: &Coordinates, world_size: f64) -> (f64, f64) {
    let lat = coords.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coords.longitude + 180.0) / 360.0 * world_size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world_size;
    (x, y)
}

fn from_world(x: f64, y: f64, world_size: f64) -> Coordinates {
    let longitude = x / world_size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / world_size;
    let latitude = n.sinh().atan().to_degrees();
    Coordinates::new(longitude, latitude)
}

/// Screen position of `coords` for the viewport `transform`.
pub fn project(coords: &Coordinates, transform: &ViewportTransform) -> ScreenPoint {
    let ws = transform.world_size();
    let (px, py) = to_world(coords, ws);
    let (cx, cy) = to_world(&transform.center, ws);

    let (dx, dy) = rotate(px - cx, py - cy, -transform.bearing);

    ScreenPoint::new(transform.width / 2.0 + dx, transform.height / 2.0 + dy)
}

/// Geographic position under `point` for the viewport `transform`.
pub fn unproject(point: &ScreenPoint, transform: &ViewportTransform) -> Coordinates {
    let ws = transform.world_size();
    let (cx, cy) = to_world(&transform.center, ws);

    let (dx, dy) = rotate(
        point.x - transform.width / 2.0,
        point.y - transform.height / 2.0,
        transform.bearing,
    );

    from_world(cx + dx, cy + dy, ws)
}

fn rotate(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    if degrees == 0.0 {
        return (x, y);
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
