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

//! Extents and Web Mercator (EPSG:3857) projection helpers.
//!
//! Every remote query is scoped by an [`Extent`] expressed in projected
//! metres. Geographic positions ([`LonLat`]) are converted with the
//! spherical Mercator formulas used by slippy-map tile servers.

use std::f64::consts::PI;
use std::fmt;

use geo::Coord;

/// WGS84 semi-major axis used by spherical Mercator.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which the Mercator square ends.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Pixel size of one map tile.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Projected CRS identifier used for bounding boxes.
pub const EPSG_3857: &str = "EPSG:3857";

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Project to Web Mercator metres.
    #[must_use]
    pub fn to_mercator(self) -> [f64; 2] {
        lon_lat_to_mercator(self.lon, self.lat)
    }

    /// Inverse of [`LonLat::to_mercator`].
    #[must_use]
    pub fn from_mercator(xy: [f64; 2]) -> Self {
        mercator_to_lon_lat(xy[0], xy[1])
    }
}

impl From<Coord<f64>> for LonLat {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<LonLat> for Coord<f64> {
    fn from(p: LonLat) -> Self {
        Coord { x: p.lon, y: p.lat }
    }
}

/// Convert longitude/latitude in degrees to Web Mercator metres.
///
/// Latitude is clamped to the Mercator square so the poles stay finite.
#[must_use]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> [f64; 2] {
    let lat = lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    [x, y]
}

/// Convert Web Mercator metres back to longitude/latitude in degrees.
#[must_use]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> LonLat {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    LonLat { lon, lat }
}

/// Ground resolution in metres per pixel at a (fractional) zoom level.
#[must_use]
pub fn resolution_at_zoom(zoom: f64) -> f64 {
    2.0 * PI * EARTH_RADIUS_M / (TILE_SIZE_PX * 2_f64.powf(zoom))
}

/// Axis-aligned bounding box in EPSG:3857 metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Build an extent from two opposite corners given in any order.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    #[must_use]
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self::new(a[0], a[1], b[0], b[1])
    }

    /// Extent of the rectangle spanned by two geographic corners.
    #[must_use]
    pub fn from_lon_lat_corners(a: LonLat, b: LonLat) -> Self {
        Self::from_corners(a.to_mercator(), b.to_mercator())
    }

    /// Extent visible in a viewport of `width_px` x `height_px` centred on
    /// `center` (Mercator metres) at `zoom`.
    #[must_use]
    pub fn around(center: [f64; 2], zoom: f64, width_px: f64, height_px: f64) -> Self {
        let resolution = resolution_at_zoom(zoom);
        let half_w = width_px * resolution / 2.0;
        let half_h = height_px * resolution / 2.0;
        Self {
            min_x: center[0] - half_w,
            min_y: center[1] - half_h,
            max_x: center[0] + half_w,
            max_y: center[1] + half_h,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    #[must_use]
    pub fn contains(&self, xy: [f64; 2]) -> bool {
        xy[0] >= self.min_x && xy[0] <= self.max_x && xy[1] >= self.min_y && xy[1] <= self.max_y
    }

    /// South-west and north-east corners in degrees.
    #[must_use]
    pub fn to_lon_lat_corners(&self) -> (LonLat, LonLat) {
        (
            mercator_to_lon_lat(self.min_x, self.min_y),
            mercator_to_lon_lat(self.max_x, self.max_y),
        )
    }

    /// WFS `bbox` parameter value: `minx,miny,maxx,maxy,<srs>`.
    #[must_use]
    pub fn to_bbox_param(&self, srs: &str) -> String {
        format!("{self},{srs}")
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_WORLD: f64 = 20_037_508.342_789_244;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_mercator_origin_and_antimeridian() {
        let [x0, y0] = lon_lat_to_mercator(0.0, 0.0);
        assert!(close(x0, 0.0, 1e-6));
        assert!(close(y0, 0.0, 1e-6));
        let [x, _] = lon_lat_to_mercator(180.0, 0.0);
        assert!(close(x, HALF_WORLD, 1e-6));
    }

    #[test]
    fn test_coord_conversion() {
        let p = LonLat::new(-3.4, 54.9);
        let c: Coord<f64> = p.into();
        assert_eq!((c.x, c.y), (-3.4, 54.9));
        assert_eq!(LonLat::from(c), p);
    }

    #[test]
    fn test_mercator_inverse() {
        let start = LonLat::new(-3.432, 54.910);
        let back = LonLat::from_mercator(start.to_mercator());
        assert!(close(back.lon, start.lon, 1e-9));
        assert!(close(back.lat, start.lat, 1e-9));
    }

    #[test]
    fn test_mercator_clamps_poles() {
        let [_, y] = lon_lat_to_mercator(0.0, 90.0);
        assert!(y.is_finite());
        assert!(close(y, HALF_WORLD, 1e-3));
    }

    #[test]
    fn test_resolution_at_zoom() {
        assert!(close(resolution_at_zoom(0.0), 156_543.033_928_040_97, 1e-6));
        assert!(close(resolution_at_zoom(12.0), 38.218_514_142_588_134, 1e-9));
    }

    #[test]
    fn test_extent_normalises_corners() {
        let extent = Extent::new(10.0, 20.0, -5.0, -1.0);
        assert_eq!(extent, Extent { min_x: -5.0, min_y: -1.0, max_x: 10.0, max_y: 20.0 });
        assert_eq!(extent.width(), 15.0);
        assert_eq!(extent.height(), 21.0);
    }

    #[test]
    fn test_extent_around_whole_world() {
        let extent = Extent::around([0.0, 0.0], 0.0, 256.0, 256.0);
        assert!(close(extent.min_x, -HALF_WORLD, 1e-6));
        assert!(close(extent.max_y, HALF_WORLD, 1e-6));
    }

    #[test]
    fn test_extent_around_keeps_center() {
        let center = LonLat::new(-3.4, 54.9).to_mercator();
        let extent = Extent::around(center, 12.0, 800.0, 600.0);
        let [cx, cy] = extent.center();
        assert!(close(cx, center[0], 1e-6));
        assert!(close(cy, center[1], 1e-6));
        assert!(close(extent.width(), 800.0 * resolution_at_zoom(12.0), 1e-6));
    }

    #[test]
    fn test_extent_contains() {
        let extent = Extent::new(-2.0, -1.0, 4.0, 5.0);
        assert!(extent.contains([0.0, 0.0]));
        assert!(extent.contains([4.0, 5.0]));
        assert!(!extent.contains([5.0, 0.0]));
    }

    #[test]
    fn test_bbox_param() {
        let extent = Extent::new(-382_000.5, 7_300_000.0, -370_000.0, 7_310_000.25);
        assert_eq!(
            extent.to_bbox_param(EPSG_3857),
            "-382000.5,7300000,-370000,7310000.25,EPSG:3857"
        );
    }
}
