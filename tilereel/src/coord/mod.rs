//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates used by slippy-map imagery services.

mod types;


pub use types::{
    BoundingBox, CoordError, TileCoord, TileRectangle, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// There is no error path: latitude is clamped to the Web Mercator range,
/// longitude to -180..=180, zoom to [`MAX_ZOOM`], and the resulting indices
/// to `0..2^zoom`. Non-finite inputs are treated as 0.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> TileCoord {
    let zoom = zoom.min(MAX_ZOOM);
    let lat = if lat.is_finite() { lat } else { 0.0 };
    let lon = if lon.is_finite() { lon } else { 0.0 };
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let lon = lon.clamp(MIN_LON, MAX_LON);

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (1u64 << zoom) - 1;

    let x = ((lon + 180.0) / 360.0 * n).floor();

    // ln(tan + sec) == asinh(tan)
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    TileCoord {
        x: clamp_index(x, max_index),
        y: clamp_index(y, max_index),
        zoom,
    }
}

fn clamp_index(value: f64, max_index: u64) -> u32 {
    if value <= 0.0 {
        0
    } else {
        (value as u64).min(max_index) as u32
    }
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Computes the tile rectangle covering a bounding box.
///
/// The northwest corner `(minLon, maxLat)` gives the top-left tile and the
/// southeast corner `(maxLon, minLat)` the bottom-right tile; increasing
/// latitude decreases tile y.
pub fn tile_rectangle(bbox: &BoundingBox, zoom: u8) -> TileRectangle {
    let top_left = to_tile_coords(bbox.max_lat, bbox.min_lon, zoom);
    let bottom_right = to_tile_coords(bbox.min_lat, bbox.max_lon, zoom);

    // Clamping keeps corners ordered for any validated bounding box.
    TileRectangle {
        top_left: TileCoord {
            x: top_left.x.min(bottom_right.x),
            y: top_left.y.min(bottom_right.y),
            zoom: top_left.zoom,
        },
        bottom_right: TileCoord {
            x: top_left.x.max(bottom_right.x),
            y: top_left.y.max(bottom_right.y),
            zoom: top_left.zoom,
        },
    }
}
