//! Geographic to screen projection.
//!
//! Spherical Mercator with 256 px tiles, the same pipeline slippy-map
//! libraries use: a coordinate is projected to "world pixels" at the
//! current zoom, then shifted so the viewport center lands in the middle
//! of the container. Everything here is a pure function of
//! `(coordinate, ViewportTransform)`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::basemap::{DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::geo::LngLat;

pub const TILE_SIZE: f64 = 256.0;
pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 18.0;
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Padding between a route's pixel bounds and its SVG frame.
pub const FRAME_PADDING: f64 = 50.0;
/// Extra width/height added to the frame so strokes and markers never clip.
pub const FRAME_GROWTH: f64 = 120.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

fn world_scale(zoom: f64) -> f64 {
    TILE_SIZE * 2_f64.powf(zoom)
}

/// Project a coordinate to world pixels at `zoom` (origin at the north-west corner).
pub fn world_px(p: &LngLat, zoom: f64) -> Point {
    let scale = world_scale(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin_lat = lat.to_radians().sin();
    let x = (p.lng + 180.0) / 360.0 * scale;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * scale;
    Point::new(x, y)
}

/// Inverse of [`world_px`].
pub fn unproject_world(pt: Point, zoom: f64) -> LngLat {
    let scale = world_scale(zoom);
    let lng = pt.x / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * pt.y / scale;
    let lat = n.sinh().atan().to_degrees();
    LngLat::new(lng, lat)
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Current pan/zoom state of the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub center: LngLat,
    pub zoom: f64,
    /// Container size in CSS pixels.
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        ViewportTransform::new(DEFAULT_CENTER, DEFAULT_ZOOM, 960.0, 640.0)
    }
}

impl ViewportTransform {
    pub fn new(center: LngLat, zoom: f64, width: f64, height: f64) -> Self {
        ViewportTransform {
            center,
            zoom: zoom.clamp(ZOOM_MIN, ZOOM_MAX),
            width,
            height,
        }
    }

    fn half_size(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Container pixel position of a geographic coordinate.
    pub fn project(&self, p: &LngLat) -> Point {
        let w = world_px(p, self.zoom);
        let c = world_px(&self.center, self.zoom);
        let half = self.half_size();
        Point::new(w.x - c.x + half.x, w.y - c.y + half.y)
    }

    /// Geographic coordinate under a container pixel.
    pub fn unproject(&self, pt: Point) -> LngLat {
        let c = world_px(&self.center, self.zoom);
        let half = self.half_size();
        unproject_world(Point::new(pt.x - half.x + c.x, pt.y - half.y + c.y), self.zoom)
    }

    /// Drag the map by `(dx, dy)` pixels; content follows the pointer.
    pub fn panned_by(&self, dx: f64, dy: f64) -> Self {
        let half = self.half_size();
        let mut center = self.unproject(Point::new(half.x - dx, half.y - dy));
        center.lng = wrap_lng(center.lng);
        center.lat = center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        ViewportTransform { center, ..*self }
    }

    /// Zoom to `new_zoom`, keeping the coordinate under `cursor` in place.
    pub fn zoomed_at(&self, cursor: Point, new_zoom: f64) -> Self {
        let new_zoom = new_zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        if (new_zoom - self.zoom).abs() < 1e-9 {
            return *self;
        }
        let anchor = self.unproject(cursor);
        let anchor_world = world_px(&anchor, new_zoom);
        let half = self.half_size();
        let center_world = Point::new(
            anchor_world.x - (cursor.x - half.x),
            anchor_world.y - (cursor.y - half.y),
        );
        ViewportTransform {
            center: unproject_world(center_world, new_zoom),
            zoom: new_zoom,
            ..*self
        }
    }

    /// Zoom by `delta` levels around the container center.
    pub fn zoomed_by(&self, delta: f64) -> Self {
        self.zoomed_at(self.half_size(), self.zoom + delta)
    }

    pub fn resized(&self, width: f64, height: f64) -> Self {
        ViewportTransform {
            width,
            height,
            ..*self
        }
    }
}

/// Axis-aligned pixel box around a set of projected points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub min: Point,
    pub max: Point,
}

impl PixelBounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = PixelBounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Placement of one route's SVG element: its box in container pixels and
/// the translate applied to its inner group so absolute positions line up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl OverlayFrame {
    pub fn around(bounds: &PixelBounds) -> Self {
        OverlayFrame {
            left: bounds.min.x - FRAME_PADDING,
            top: bounds.min.y - FRAME_PADDING,
            width: bounds.width() + FRAME_GROWTH,
            height: bounds.height() + FRAME_GROWTH,
            translate_x: -bounds.min.x + FRAME_PADDING,
            translate_y: -bounds.min.y + FRAME_PADDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc() -> ViewportTransform {
        ViewportTransform::new(LngLat::new(-73.99, 40.7233), 13.0, 800.0, 600.0)
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn test_world_px_origin_and_extent() {
        let p = world_px(&LngLat::new(-180.0, MAX_LATITUDE), 0.0);
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-3);
        let p = world_px(&LngLat::new(0.0, 0.0), 0.0);
        assert!(close(p, Point::new(128.0, 128.0)));
    }

    #[test]
    fn test_world_px_roundtrip() {
        let p = LngLat::new(-73.99, 40.7233);
        let back = unproject_world(world_px(&p, 13.0), 13.0);
        assert!((back.lng - p.lng).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let pole = world_px(&LngLat::new(0.0, 90.0), 2.0);
        assert!(pole.y.is_finite());
        assert!(pole.y.abs() < 1e-3);
    }

    #[test]
    fn test_project_is_deterministic() {
        let vt = nyc();
        let p = LngLat::new(-73.98, 40.73);
        assert_eq!(vt.project(&p), vt.project(&p));
    }

    #[test]
    fn test_center_projects_to_middle() {
        let vt = nyc();
        assert!(close(vt.project(&vt.center), Point::new(400.0, 300.0)));
    }

    #[test]
    fn test_distinct_coordinates_distinct_pixels() {
        let vt = ViewportTransform::new(LngLat::new(0.5, 0.5), 8.0, 800.0, 600.0);
        let a = vt.project(&LngLat::new(0.0, 0.0));
        let b = vt.project(&LngLat::new(1.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(a, vt.project(&LngLat::new(0.0, 0.0)));
        // North is up, east is right
        assert!(b.x > a.x);
        assert!(b.y < a.y);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vt = nyc();
        let p = LngLat::new(-73.95, 40.75);
        let back = vt.unproject(vt.project(&p));
        assert!((back.lng - p.lng).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let vt = nyc();
        let p = LngLat::new(-73.98, 40.73);
        let before = vt.project(&p);
        let after = vt.panned_by(30.0, -20.0).project(&p);
        assert!((after.x - before.x - 30.0).abs() < 1e-6);
        assert!((after.y - before.y + 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_at_cursor_keeps_anchor() {
        let vt = nyc();
        let cursor = Point::new(120.0, 450.0);
        let anchor = vt.unproject(cursor);
        let zoomed = vt.zoomed_at(cursor, 14.5);
        assert!((zoomed.zoom - 14.5).abs() < 1e-12);
        assert!(close(zoomed.project(&anchor), cursor));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let vt = nyc();
        assert_eq!(vt.zoomed_by(100.0).zoom, ZOOM_MAX);
        assert_eq!(vt.zoomed_by(-100.0).zoom, ZOOM_MIN);
        assert_eq!(ViewportTransform::new(vt.center, 0.0, 1.0, 1.0).zoom, ZOOM_MIN);
    }

    #[test]
    fn test_zoom_by_keeps_center() {
        let vt = nyc();
        let z = vt.zoomed_by(1.0);
        assert!((z.center.lng - vt.center.lng).abs() < 1e-9);
        assert!((z.center.lat - vt.center.lat).abs() < 1e-9);
    }

    #[test]
    fn test_pan_wraps_longitude() {
        let vt = ViewportTransform::new(LngLat::new(179.99, 0.0), 10.0, 800.0, 600.0);
        let panned = vt.panned_by(-400.0, 0.0);
        assert!(panned.center.lng >= -180.0 && panned.center.lng < 180.0);
        assert!(panned.center.lng < 0.0);
    }

    #[test]
    fn test_pixel_bounds() {
        let pts = [Point::new(10.0, 40.0), Point::new(-5.0, 60.0), Point::new(30.0, 20.0)];
        let b = PixelBounds::from_points(&pts).unwrap();
        assert_eq!(b.min, Point::new(-5.0, 20.0));
        assert_eq!(b.max, Point::new(30.0, 60.0));
        assert_eq!(b.width(), 35.0);
        assert_eq!(b.height(), 40.0);
        assert!(PixelBounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_overlay_frame_padding() {
        let b = PixelBounds {
            min: Point::new(100.0, 200.0),
            max: Point::new(160.0, 230.0),
        };
        let f = OverlayFrame::around(&b);
        assert_eq!(f.left, 50.0);
        assert_eq!(f.top, 150.0);
        assert_eq!(f.width, 180.0);
        assert_eq!(f.height, 150.0);
        assert_eq!(f.translate_x, -50.0);
        assert_eq!(f.translate_y, -150.0);
        // A point at bounds.min lands FRAME_PADDING inside the frame
        assert_eq!(b.min.x + f.translate_x, FRAME_PADDING);
    }
}
