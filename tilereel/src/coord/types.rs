//! Coordinate type definitions

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by slippy-map tile services
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinates in the Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Creates a bounding box, rejecting non-finite or inverted edges.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, CoordError> {
        let edges = [min_lon, min_lat, max_lon, max_lat];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(CoordError::InvalidBoundingBox(format!(
                "edges must be finite numbers, got {:?}",
                edges
            )));
        }
        if min_lon >= max_lon {
            return Err(CoordError::InvalidBoundingBox(format!(
                "min longitude {} must be less than max longitude {}",
                min_lon, max_lon
            )));
        }
        if min_lat >= max_lat {
            return Err(CoordError::InvalidBoundingBox(format!(
                "min latitude {} must be less than max latitude {}",
                min_lat, max_lat
            )));
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Creates a bounding box from `[minLon, minLat, maxLon, maxLat]`.
    pub fn from_array(edges: [f64; 4]) -> Result<Self, CoordError> {
        Self::new(edges[0], edges[1], edges[2], edges[3])
    }

    /// Returns the edges as `[minLon, minLat, maxLon, maxLat]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

/// The minimal tile grid covering a bounding box at one zoom level.
///
/// Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRectangle {
    pub top_left: TileCoord,
    pub bottom_right: TileCoord,
}

impl TileRectangle {
    /// Creates a rectangle from two inclusive corners at the same zoom.
    pub fn new(top_left: TileCoord, bottom_right: TileCoord) -> Result<Self, CoordError> {
        if top_left.zoom != bottom_right.zoom {
            return Err(CoordError::MixedZoom(top_left.zoom, bottom_right.zoom));
        }
        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return Err(CoordError::InvertedRectangle {
                top_left: (top_left.x, top_left.y),
                bottom_right: (bottom_right.x, bottom_right.y),
            });
        }
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    #[inline]
    pub fn zoom(&self) -> u8 {
        self.top_left.zoom
    }

    /// Number of tile columns.
    #[inline]
    pub fn width(&self) -> u32 {
        self.bottom_right.x - self.top_left.x + 1
    }

    /// Number of tile rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.bottom_right.y - self.top_left.y + 1
    }

    /// Total number of tiles covered.
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom()
            && (self.top_left.x..=self.bottom_right.x).contains(&tile.x)
            && (self.top_left.y..=self.bottom_right.y).contains(&tile.y)
    }

    /// Iterates tiles in row-major order (north to south, west to east).
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom();
        (self.top_left.y..=self.bottom_right.y).flat_map(move |y| {
            (self.top_left.x..=self.bottom_right.x).map(move |x| TileCoord { x, y, zoom })
        })
    }
}

/// Errors that can occur while building coordinate types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Bounding box edges are not finite or not ordered
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// Zoom level is outside the supported range
    #[error("Invalid zoom level: {0} (must be between {MIN_ZOOM} and {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Rectangle corners come from different zoom levels
    #[error("Rectangle corners use different zoom levels ({0} and {1})")]
    MixedZoom(u8, u8),

    /// Rectangle corners are not ordered top-left to bottom-right
    #[error("Rectangle corners are inverted: top-left {top_left:?}, bottom-right {bottom_right:?}")]
    InvertedRectangle {
        top_left: (u32, u32),
        bottom_right: (u32, u32),
    },
}
