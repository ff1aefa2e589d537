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

//! GeoJSON feature decoding and screen-space hit testing.
//!
//! Geometries are kept as [`geo::Geometry`] in longitude/latitude degrees
//! (`x` is longitude, `y` is latitude).

use geo::{BoundingRect, Coord, EuclideanDistance, Intersects, MapCoords, Point};
use geojson::GeoJson;
use log::warn;
use serde_json::{Map, Value};

pub use geo::Geometry;

use super::WfsError;
use crate::extent::LonLat;

/// Screen-space tolerances for hit testing, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    /// Distance from a point at which it still counts as hit.
    pub point_radius: f32,
    /// Distance from a line segment at which it still counts as hit.
    pub line_width: f32,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            point_radius: 6.0,
            line_width: 4.0,
        }
    }
}

impl HitTolerance {
    fn slack(self) -> f32 {
        self.point_radius.max(self.line_width)
    }
}

/// Hit testing against a cursor in screen pixels.
pub trait HitTest {
    /// Whether `cursor` hits the geometry once projected with `project`.
    ///
    /// Points are hit within the marker radius, lines within the stroke
    /// tolerance, polygons when the cursor is inside the exterior and
    /// outside every hole. A collection is hit when any member is.
    fn hit_test<F>(&self, cursor: [f32; 2], tolerance: HitTolerance, project: &F) -> bool
    where
        F: Fn(LonLat) -> [f32; 2];
}

impl HitTest for Geometry {
    fn hit_test<F>(&self, cursor: [f32; 2], tolerance: HitTolerance, project: &F) -> bool
    where
        F: Fn(LonLat) -> [f32; 2],
    {
        let Some(bounds) = self.bounding_rect() else {
            return false;
        };

        // Projection is monotonic per axis, so the projected corners bound
        // the projected geometry.
        let [x1, y1] = project(bounds.min().into());
        let [x2, y2] = project(bounds.max().into());
        let slack = tolerance.slack();
        if cursor[0] < x1.min(x2) - slack
            || cursor[0] > x1.max(x2) + slack
            || cursor[1] < y1.min(y2) - slack
            || cursor[1] > y1.max(y2) + slack
        {
            return false;
        }

        let screen = self.map_coords(|c| {
            let [x, y] = project(c.into());
            Coord {
                x: f64::from(x),
                y: f64::from(y),
            }
        });
        screen_hit(
            &screen,
            Point::new(f64::from(cursor[0]), f64::from(cursor[1])),
            tolerance,
        )
    }
}

fn screen_hit(geometry: &Geometry, cursor: Point, tolerance: HitTolerance) -> bool {
    let point_radius = f64::from(tolerance.point_radius);
    let line_width = f64::from(tolerance.line_width);

    match geometry {
        Geometry::Point(p) => cursor.euclidean_distance(p) <= point_radius,
        Geometry::MultiPoint(points) => points
            .iter()
            .any(|p| cursor.euclidean_distance(p) <= point_radius),
        Geometry::Line(line) => cursor.euclidean_distance(line) <= line_width,
        Geometry::LineString(line) => cursor.euclidean_distance(line) <= line_width,
        Geometry::MultiLineString(lines) => lines
            .iter()
            .any(|line| cursor.euclidean_distance(line) <= line_width),
        Geometry::Polygon(polygon) => polygon.intersects(&cursor.0),
        Geometry::MultiPolygon(polygons) => polygons.intersects(&cursor.0),
        Geometry::Rect(rect) => rect.intersects(&cursor.0),
        Geometry::Triangle(triangle) => triangle.intersects(&cursor.0),
        Geometry::GeometryCollection(members) => members
            .iter()
            .any(|member| screen_hit(member, cursor, tolerance)),
    }
}

/// A decoded feature: optional id, optional geometry and its attributes in
/// server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl From<geojson::Feature> for Feature {
    fn from(feature: geojson::Feature) -> Self {
        let id = feature.id.map(|id| match id {
            geojson::feature::Id::String(s) => s,
            geojson::feature::Id::Number(n) => n.to_string(),
        });
        let geometry = feature
            .geometry
            .and_then(|g| match Geometry::try_from(g.value) {
                Ok(geometry) => Some(geometry),
                Err(e) => {
                    warn!("Dropping unusable geometry of feature {id:?}: {e}");
                    None
                }
            });
        Self {
            id,
            geometry,
            properties: feature.properties.unwrap_or_default(),
        }
    }
}

/// Decode a GetFeature response body.
///
/// Anything other than a `FeatureCollection` is rejected.
pub fn decode_feature_collection(body: &str) -> Result<Vec<Feature>, WfsError> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => {
            Ok(collection.features.into_iter().map(Feature::from).collect())
        }
        GeoJson::Feature(_) => Err(WfsError::NotAFeatureCollection("Feature")),
        GeoJson::Geometry(_) => Err(WfsError::NotAFeatureCollection("Geometry")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "all_sssi.12",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                                    [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]]
                },
                "geometry_name": "geom",
                "properties": { "name": "Moor House", "country": "england", "area_ha": 7400.5 }
            },
            {
                "type": "Feature",
                "id": 7,
                "geometry": { "type": "Point", "coordinates": [-3.4, 54.9] },
                "properties": { "description": "Oak" }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": null
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Point", "coordinates": [20, 20] },
                        { "type": "LineString", "coordinates": [[30, 0], [40, 0]] }
                    ]
                },
                "properties": {}
            }
        ]
    }"#;

    /// Identity-like projection: one degree maps to one pixel, y flipped.
    #[allow(clippy::cast_possible_truncation, reason = "test coordinates are small")]
    fn project(p: LonLat) -> [f32; 2] {
        [p.lon as f32, -p.lat as f32]
    }

    #[test]
    fn test_decode_collection() {
        let features = decode_feature_collection(COLLECTION).unwrap();
        assert_eq!(features.len(), 4);

        assert_eq!(features[0].id.as_deref(), Some("all_sssi.12"));
        let keys: Vec<&str> = features[0].properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "country", "area_ha"]);
        assert!(matches!(
            features[0].geometry,
            Some(Geometry::Polygon(ref polygon)) if polygon.interiors().len() == 1
        ));

        assert_eq!(features[1].id.as_deref(), Some("7"));
        assert_eq!(features[1].geometry, Some(Geometry::Point(Point::new(-3.4, 54.9))));

        assert!(features[2].geometry.is_none());
        assert!(features[2].properties.is_empty());

        assert!(matches!(
            features[3].geometry,
            Some(Geometry::GeometryCollection(ref members)) if members.len() == 2
        ));
    }

    #[test]
    fn test_decode_rejects_non_collections() {
        let single = r#"{"type": "Feature", "geometry": null, "properties": {}}"#;
        assert!(matches!(
            decode_feature_collection(single),
            Err(WfsError::NotAFeatureCollection("Feature"))
        ));
        assert!(matches!(
            decode_feature_collection("<ows:ExceptionReport/>"),
            Err(WfsError::GeoJson(_))
        ));
    }

    #[test]
    fn test_polygon_hit_respects_holes() {
        let features = decode_feature_collection(COLLECTION).unwrap();
        let geometry = features[0].geometry.as_ref().unwrap();
        let tol = HitTolerance::default();

        assert!(geometry.hit_test([2.0, -2.0], tol, &project));
        assert!(!geometry.hit_test([5.0, -5.0], tol, &project));
        assert!(!geometry.hit_test([20.0, -5.0], tol, &project));
    }

    #[test]
    fn test_point_and_line_hits() {
        let tol = HitTolerance {
            point_radius: 1.0,
            line_width: 0.5,
        };
        let point = Geometry::Point(Point::new(3.0, 3.0));
        assert!(point.hit_test([3.5, -3.5], tol, &project));
        assert!(!point.hit_test([5.0, -3.0], tol, &project));

        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]));
        assert!(line.hit_test([5.0, 0.4], tol, &project));
        assert!(!line.hit_test([5.0, 1.0], tol, &project));
        assert!(!line.hit_test([11.0, 0.0], tol, &project));
    }

    #[test]
    fn test_collection_hit_when_any_member_is() {
        let features = decode_feature_collection(COLLECTION).unwrap();
        let geometry = features[3].geometry.as_ref().unwrap();
        let tol = HitTolerance::default();

        assert!(geometry.hit_test([20.0, -20.0], tol, &project));
        assert!(geometry.hit_test([35.0, 2.0], tol, &project));
        assert!(!geometry.hit_test([25.0, -10.0], tol, &project));
    }
}
