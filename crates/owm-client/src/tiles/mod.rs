// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Web Mercator tile math.
//!
//! Maps geographic coordinates onto the standard slippy-map tile pyramid
//! (origin top-left, `2^zoom` columns and rows) used by OpenWeatherMap's
//! overlay layers and every OSM-style tile service.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Northern/southern limit of the Web Mercator projection in degrees.
///
/// Latitudes beyond this are clamped before projecting, so the poles map to
/// the first/last tile row instead of producing infinities.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Highest zoom level accepted (keeps `2^zoom` within `u32`).
pub const MAX_ZOOM: u8 = 24;

/// Errors from the strict tile conversion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TileError {
    #[error("invalid latitude {0}: must be finite and strictly between -90 and 90")]
    InvalidLatitude(f64),

    #[error("invalid longitude {0}: must be finite")]
    InvalidLongitude(f64),

    #[error("invalid zoom {0}: maximum is {MAX_ZOOM}")]
    InvalidZoom(u8),
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.4}°{} {:.4}°{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// Index of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileIndex {
    #[must_use]
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Coordinate of the tile's top-left corner.
    #[must_use]
    pub fn north_west(&self) -> Coordinate {
        Coordinate::new(
            tile_to_lat(f64::from(self.y), self.zoom),
            tile_to_lon(f64::from(self.x), self.zoom),
        )
    }

    /// Coordinate of the tile's center.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            tile_to_lat(f64::from(self.y) + 0.5, self.zoom),
            tile_to_lon(f64::from(self.x) + 0.5, self.zoom),
        )
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
#[must_use]
pub fn grid_size(zoom: u8) -> u32 {
    1u32 << zoom.min(MAX_ZOOM)
}

/// Wrap a longitude into `[-180, 180)`.
#[must_use]
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamp a latitude into the projectable Web Mercator band.
#[must_use]
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

/// Fractional tile column for a longitude.
#[must_use]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> f64 {
    ((lon + 180.0) / 360.0) * f64::from(grid_size(zoom))
}

/// Fractional tile row for a latitude (inverse Mercator, 0 at the north edge).
#[must_use]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> f64 {
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    y * f64::from(grid_size(zoom))
}

/// Longitude of a fractional tile column.
#[must_use]
pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
    x / f64::from(grid_size(zoom)) * 360.0 - 180.0
}

/// Latitude of a fractional tile row.
#[must_use]
pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
    let n = f64::from(grid_size(zoom));
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

/// Tile containing `(lat, lon)` at `zoom`.
///
/// Longitude is wrapped into `[-180, 180)` and latitude clamped to
/// [`MAX_LATITUDE`], so every input yields a tile inside the grid. Zoom
/// levels above [`MAX_ZOOM`] are treated as [`MAX_ZOOM`].
#[must_use]
pub fn tile_index(lat: f64, lon: f64, zoom: u8) -> TileIndex {
    let zoom = zoom.min(MAX_ZOOM);
    let x = lon_to_tile_x(normalize_longitude(lon), zoom);
    let y = lat_to_tile_y(clamp_latitude(lat), zoom);
    TileIndex::new(floor_to_cell(x, zoom), floor_to_cell(y, zoom), zoom)
}

/// Strict variant of [`tile_index`] that rejects unprojectable input.
///
/// Latitudes in `[MAX_LATITUDE, 90)` are still accepted and land on the
/// edge row.
pub fn try_tile_index(lat: f64, lon: f64, zoom: u8) -> Result<TileIndex, TileError> {
    if !lat.is_finite() || lat.abs() >= 90.0 {
        return Err(TileError::InvalidLatitude(lat));
    }
    if !lon.is_finite() {
        return Err(TileError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(TileError::InvalidZoom(zoom));
    }
    Ok(tile_index(lat, lon, zoom))
}

// Rounding at the far edge can produce exactly 2^zoom; pin it to the last cell.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is clamped into the grid first")]
fn floor_to_cell(value: f64, zoom: u8) -> u32 {
    let last = f64::from(grid_size(zoom) - 1);
    if value.is_nan() {
        return 0;
    }
    value.floor().clamp(0.0, last) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dhaka_zoom_6() {
        assert_eq!(tile_index(23.8103, 90.4125, 6), TileIndex::new(48, 27, 6));
    }

    #[test]
    fn test_known_osm_tiles() {
        // Reference values from the OSM slippy-map tile scheme
        assert_eq!(tile_index(52.2564, 8.0653, 9), TileIndex::new(267, 168, 9));
        assert_eq!(tile_index(51.3563, 12.3528, 9), TileIndex::new(273, 170, 9));
        assert_eq!(tile_index(58.0042, -4.43515, 12), TileIndex::new(1997, 1233, 12));
        assert_eq!(tile_index(44.8029, 20.4395, 12), TileIndex::new(2280, 1476, 12));
    }

    #[test]
    fn test_origin_maps_to_grid_center() {
        for zoom in 1..=10 {
            let half = grid_size(zoom) / 2;
            assert_eq!(tile_index(0.0, 0.0, zoom), TileIndex::new(half, half, zoom));
        }
        assert_eq!(tile_index(0.0, 0.0, 0), TileIndex::new(0, 0, 0));
    }

    #[test]
    fn test_longitude_boundaries() {
        for zoom in 0..=10 {
            assert_eq!(tile_index(10.0, -180.0, zoom).x, 0);
            assert_eq!(tile_index(10.0, 179.999, zoom).x, grid_size(zoom) - 1);
        }
    }

    #[test]
    fn test_indices_stay_in_grid() {
        for zoom in 0..=10 {
            let size = grid_size(zoom);
            let mut lat = -84.9;
            while lat < 85.0 {
                let mut lon = -180.0;
                while lon < 180.0 {
                    let tile = tile_index(lat, lon, zoom);
                    assert!(tile.x < size, "x out of range at {lat},{lon} z{zoom}");
                    assert!(tile.y < size, "y out of range at {lat},{lon} z{zoom}");
                    lon += 7.3;
                }
                lat += 4.1;
            }
        }
    }

    #[test]
    fn test_x_monotonic_in_longitude() {
        let mut previous = 0;
        let mut lon = -180.0;
        while lon < 180.0 {
            let x = tile_index(40.0, lon, 8).x;
            assert!(x >= previous);
            previous = x;
            lon += 0.25;
        }
    }

    #[test]
    fn test_y_monotonic_moving_north() {
        let mut previous = u32::MAX;
        let mut lat = -85.0;
        while lat < 85.0 {
            let y = tile_index(lat, 0.0, 8).y;
            assert!(y <= previous);
            previous = y;
            lat += 0.25;
        }
    }

    #[test]
    fn test_poles_are_clamped() {
        let north = tile_index(90.0, 0.0, 6);
        let south = tile_index(-90.0, 0.0, 6);
        assert_eq!(north.y, 0);
        assert_eq!(south.y, grid_size(6) - 1);
    }

    #[test]
    fn test_longitude_wraps() {
        assert_eq!(tile_index(0.0, 180.0, 4).x, 0);
        assert_eq!(tile_index(0.0, 540.0, 4).x, 0);
        assert_eq!(tile_index(0.0, -190.0, 4), tile_index(0.0, 170.0, 4));
        assert!((normalize_longitude(190.0) + 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_strict_rejects_poles() {
        assert_eq!(try_tile_index(90.0, 0.0, 3), Err(TileError::InvalidLatitude(90.0)));
        assert_eq!(try_tile_index(-90.0, 0.0, 3), Err(TileError::InvalidLatitude(-90.0)));
        assert!(matches!(try_tile_index(f64::NAN, 0.0, 3), Err(TileError::InvalidLatitude(_))));
        assert_eq!(try_tile_index(0.0, f64::INFINITY, 3), Err(TileError::InvalidLongitude(f64::INFINITY)));
        assert_eq!(try_tile_index(0.0, 0.0, 30), Err(TileError::InvalidZoom(30)));
        assert_eq!(try_tile_index(89.9, 0.0, 3).map(|t| t.y), Ok(0));
    }

    #[test]
    fn test_inverse_projection_round_trips_tile_center() {
        let tile = tile_index(23.8103, 90.4125, 6);
        let center = tile.center();
        assert_eq!(tile_index(center.lat, center.lon, 6), tile);

        let nw = TileIndex::new(0, 0, 0).north_west();
        assert!((nw.lat - MAX_LATITUDE).abs() < 1e-6);
        assert!((nw.lon + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileIndex::new(48, 27, 6).to_string(), "6/48/27");
        assert_eq!(Coordinate::new(23.8103, -90.4125).to_string(), "23.8103°N 90.4125°W");
    }
}
