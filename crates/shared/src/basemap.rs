//! Slippy-map basemap: which tiles cover the viewport and where they go.

use crate::geo::LngLat;
use crate::projection::{world_px, ViewportTransform, TILE_SIZE, ZOOM_MAX};

pub const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];
pub const ATTRIBUTION: &str = "Map data © OpenStreetMap contributors, CC-BY-SA, Imagery © Mapbox";

pub const DEFAULT_CENTER: LngLat = LngLat::new(-73.99, 40.72332345541449);
pub const DEFAULT_ZOOM: f64 = 13.0;

/// One basemap tile placed in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRef {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub left: f64,
    pub top: f64,
    /// Rendered edge length; differs from 256 between integer zoom levels.
    pub size: f64,
}

/// Tiles needed to cover the viewport, row by row from the top-left.
pub fn visible_tiles(vt: &ViewportTransform) -> Vec<TileRef> {
    if vt.width <= 0.0 || vt.height <= 0.0 {
        return Vec::new();
    }

    let z = vt.zoom.round().clamp(0.0, ZOOM_MAX);
    let size = TILE_SIZE * 2_f64.powf(vt.zoom - z);
    let count = 2_i64.pow(z as u32);

    let center = world_px(&vt.center, vt.zoom);
    let origin_x = center.x - vt.width / 2.0;
    let origin_y = center.y - vt.height / 2.0;

    let first_col = (origin_x / size).floor() as i64;
    let last_col = ((origin_x + vt.width) / size).floor() as i64;
    let first_row = ((origin_y / size).floor() as i64).max(0);
    let last_row = (((origin_y + vt.height) / size).floor() as i64).min(count - 1);

    let mut tiles = Vec::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            tiles.push(TileRef {
                x: col.rem_euclid(count) as u32,
                y: row as u32,
                z: z as u32,
                left: col as f64 * size - origin_x,
                top: row as f64 * size - origin_y,
                size,
            });
        }
    }
    tiles
}

pub fn tile_url(tile: &TileRef) -> String {
    let subdomain = TILE_SUBDOMAINS[((tile.x + tile.y) as usize) % TILE_SUBDOMAINS.len()];
    TILE_URL_TEMPLATE
        .replace("{s}", subdomain)
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}
