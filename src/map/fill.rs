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

//! Polygon fill triangulation.
//!
//! egui only fills convex paths, so polygons are earcut into triangles once
//! per loaded layer. Triangulation runs in Web Mercator metres; the map
//! projects those to the screen with a scale and offset, so the triangles
//! stay valid at every zoom level. Holes are left unfilled.

use std::collections::HashMap;
use std::sync::Arc;

use geo::{Coord, MapCoords, Polygon, TriangulateEarcut};
use log::debug;
use wfs_client::{Feature, Geometry, LayerName, LonLat};

use crate::controller::LayerSlot;

/// Polygons with more vertices than this are outlined but not filled
const MAX_FILL_VERTICES: usize = 4096;

pub type Triangle = [LonLat; 3];

/// Fill triangles for every polygon in `geometry`
#[must_use]
pub fn fill_triangles(geometry: &Geometry) -> Vec<Triangle> {
    let mut out = Vec::new();
    collect_triangles(geometry, &mut out);
    out
}

fn collect_triangles(geometry: &Geometry, out: &mut Vec<Triangle>) {
    match geometry {
        Geometry::Polygon(polygon) => triangulate_polygon(polygon, out),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                triangulate_polygon(polygon, out);
            }
        }
        Geometry::Rect(rect) => triangulate_polygon(&rect.to_polygon(), out),
        Geometry::Triangle(triangle) => triangulate_polygon(&triangle.to_polygon(), out),
        Geometry::GeometryCollection(members) => {
            for member in members {
                collect_triangles(member, out);
            }
        }
        Geometry::Point(_)
        | Geometry::MultiPoint(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_) => {}
    }
}

fn vertex_count(polygon: &Polygon) -> usize {
    polygon.exterior().0.len() + polygon.interiors().iter().map(|ring| ring.0.len()).sum::<usize>()
}

fn triangulate_polygon(polygon: &Polygon, out: &mut Vec<Triangle>) {
    let vertices = vertex_count(polygon);
    if vertices > MAX_FILL_VERTICES {
        debug!("Skipping fill for polygon with {vertices} vertices");
        return;
    }

    let projected = polygon.map_coords(|c| {
        let [x, y] = LonLat::from(c).to_mercator();
        Coord { x, y }
    });
    out.extend(
        projected
            .earcut_triangles()
            .into_iter()
            .map(|triangle| triangle.to_array().map(|c| LonLat::from_mercator([c.x, c.y]))),
    );
}

#[derive(Debug)]
struct CachedFill {
    features: Arc<Vec<Feature>>,
    triangles: Arc<Vec<Triangle>>,
}

/// Fill triangles per layer, rebuilt when the layer's features change
#[derive(Debug, Default)]
pub struct FillCache {
    entries: HashMap<LayerName, CachedFill>,
}

impl FillCache {
    pub fn triangles(&mut self, slot: &LayerSlot) -> Arc<Vec<Triangle>> {
        if let Some(cached) = self.entries.get(&slot.layer) {
            if Arc::ptr_eq(&cached.features, &slot.features) {
                return Arc::clone(&cached.triangles);
            }
        }

        let triangles: Arc<Vec<Triangle>> = Arc::new(
            slot.features
                .iter()
                .filter_map(|feature| feature.geometry.as_ref())
                .flat_map(fill_triangles)
                .collect(),
        );
        self.entries.insert(
            slot.layer,
            CachedFill {
                features: Arc::clone(&slot.features),
                triangles: Arc::clone(&triangles),
            },
        );
        triangles
    }

    /// Drop entries for layers that are no longer active
    pub fn retain_active(&mut self, slots: &[LayerSlot]) {
        self.entries
            .retain(|layer, _| slots.iter().any(|slot| slot.layer == *layer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString, Point};
    use wfs_client::extent::lon_lat_to_mercator;

    /// Total area of the triangles in square Mercator metres
    fn mercator_area(triangles: &[Triangle]) -> f64 {
        triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(LonLat::to_mercator);
                ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs() / 2.0
            })
            .sum()
    }

    /// Area of the lon/lat box in square Mercator metres
    fn box_area(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
        let a = lon_lat_to_mercator(x1, y1);
        let b = lon_lat_to_mercator(x2, y2);
        ((b[0] - a[0]) * (b[1] - a[1])).abs()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= b.abs() * 1e-9
    }

    #[test]
    fn test_square() {
        let square = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ]);
        let triangles = fill_triangles(&square);
        assert_eq!(triangles.len(), 2);
        assert!(close(mercator_area(&triangles), box_area(0.0, 0.0, 4.0, 4.0)));
    }

    #[test]
    fn test_repeated_vertex_fills_whole_ring() {
        // Servers emit consecutive duplicate vertices
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
        ]);
        let triangles = fill_triangles(&Geometry::Polygon(Polygon::new(ring, vec![])));
        assert!(close(mercator_area(&triangles), box_area(0.0, 0.0, 4.0, 4.0)));
    }

    #[test]
    fn test_concave_l_shape() {
        // Clockwise L of three unit squares
        let l_shape = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 1.0, y: 2.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 0.0),
        ]);
        let triangles = fill_triangles(&l_shape);
        assert_eq!(triangles.len(), 4);
        let expected = box_area(0.0, 0.0, 2.0, 1.0) + box_area(0.0, 1.0, 1.0, 2.0);
        assert!(close(mercator_area(&triangles), expected));
    }

    #[test]
    fn test_hole_is_not_filled() {
        let with_hole = Geometry::Polygon(polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
            ],
            interiors: [[
                (x: 4.0, y: 4.0),
                (x: 6.0, y: 4.0),
                (x: 6.0, y: 6.0),
                (x: 4.0, y: 6.0),
            ]],
        ));
        let triangles = fill_triangles(&with_hole);
        let expected = box_area(0.0, 0.0, 10.0, 10.0) - box_area(4.0, 4.0, 6.0, 6.0);
        assert!(close(mercator_area(&triangles), expected));

    }

    #[test]
    fn test_points_have_no_fill() {
        assert!(fill_triangles(&Geometry::Point(Point::new(0.0, 0.0))).is_empty());
    }

    #[test]
    fn test_multipolygon_fills_each_polygon() {
        let square = |x: f64| {
            polygon![
                (x: x, y: 0.0),
                (x: x + 1.0, y: 0.0),
                (x: x + 1.0, y: 1.0),
                (x: x, y: 1.0),
            ]
        };
        let geometry = Geometry::MultiPolygon(vec![square(0.0), square(5.0)].into());
        assert_eq!(fill_triangles(&geometry).len(), 4);
    }

    #[test]
    fn test_cache_reuses_until_features_change() {
        use crate::controller::LayerStatus;
        use wfs_client::Extent;

        let features = Arc::new(vec![Feature {
            geometry: Some(Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 1.0),
            ])),
            ..Default::default()
        }]);
        let mut slot = LayerSlot {
            layer: LayerName::Sssi,
            generation: 1,
            extent: Extent::new(0.0, 0.0, 1.0, 1.0),
            status: LayerStatus::Ready,
            features,
        };

        let mut cache = FillCache::default();
        let first = cache.triangles(&slot);
        let second = cache.triangles(&slot);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);

        slot.features = Arc::new(Vec::new());
        assert!(cache.triangles(&slot).is_empty());

        cache.retain_active(&[]);
        assert!(cache.entries.is_empty());
    }
}
