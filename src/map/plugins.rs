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

//! Map plugins: data layer rendering with hover hit testing, and the box
//! drawing interaction.
//!
//! Plugins run inside the map widget, so results travel back to the app
//! through shared cells read after `ui.add(map)`.

use std::sync::{Arc, Mutex};

use egui::{Color32, Mesh, Pos2, Shape};
use geo::{LineString, Polygon};
use walkers::{MapMemory, Plugin, Projector};
use wfs_client::{Geometry, HitTolerance, LonLat};

use super::fill::Triangle;
use super::style::{LayerStyle, DRAW_BOX_FILL, DRAW_BOX_STROKE};
use super::{from_position, to_position};
use crate::controller::{describe_hits, LayerSlot};

/// Features under the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub pos: Pos2,
    pub lines: Vec<String>,
}

pub type SharedHover = Arc<Mutex<Option<Hover>>>;

/// Pointer input captured while drawing a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawInput {
    Move(LonLat),
    Click(LonLat),
}

pub type SharedDrawInputs = Arc<Mutex<Vec<DrawInput>>>;

/// Renders the active data layers and reports what the pointer is over
pub struct FeatureLayersPlugin {
    layers: Vec<(LayerSlot, Arc<Vec<Triangle>>)>,
    tolerance: HitTolerance,
    hover: SharedHover,
}

impl std::fmt::Debug for FeatureLayersPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureLayersPlugin")
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}

impl FeatureLayersPlugin {
    /// `layers` pairs each slot, in draw order, with its fill triangles.
    #[must_use]
    pub fn new(layers: Vec<(LayerSlot, Arc<Vec<Triangle>>)>, hover: SharedHover) -> Self {
        Self {
            layers,
            tolerance: HitTolerance::default(),
            hover,
        }
    }
}

impl Plugin for FeatureLayersPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let Self {
            layers,
            tolerance,
            hover,
        } = *self;

        let painter = ui.painter().with_clip_rect(response.rect);
        let project = |p: LonLat| {
            let v = projector.project(to_position(p));
            [v.x, v.y]
        };

        for (slot, triangles) in &layers {
            let style = LayerStyle::for_layer(slot.layer);
            paint_fill(&painter, triangles, style.fill, &project);
            for geometry in slot.features.iter().filter_map(|f| f.geometry.as_ref()) {
                paint_geometry(&painter, geometry, &style, &project);
            }
        }

        let slots: Vec<LayerSlot> = layers.into_iter().map(|(slot, _)| slot).collect();
        let hit = response.hover_pos().and_then(|pos| {
            let lines = describe_hits(&slots, [pos.x, pos.y], tolerance, &project);
            (!lines.is_empty()).then_some(Hover { pos, lines })
        });

        publish_hover(&hover, hit);
    }
}

/// Replace the shared hover cell's contents
fn publish_hover(hover: &SharedHover, hit: Option<Hover>) {
    if let Ok(mut cell) = hover.lock() {
        *cell = hit;
    };
}

fn pos2(xy: [f32; 2]) -> Pos2 {
    Pos2::new(xy[0], xy[1])
}

fn paint_fill<F>(painter: &egui::Painter, triangles: &[Triangle], color: Color32, project: &F)
where
    F: Fn(LonLat) -> [f32; 2],
{
    if triangles.is_empty() {
        return;
    }
    let mut mesh = Mesh::default();
    for triangle in triangles {
        let Ok(base) = u32::try_from(mesh.vertices.len()) else {
            break;
        };
        for corner in triangle {
            mesh.colored_vertex(pos2(project(*corner)), color);
        }
        mesh.add_triangle(base, base + 1, base + 2);
    }
    painter.add(Shape::mesh(mesh));
}

fn paint_geometry<F>(painter: &egui::Painter, geometry: &Geometry, style: &LayerStyle, project: &F)
where
    F: Fn(LonLat) -> [f32; 2],
{
    let screen = |line: &LineString| -> Vec<Pos2> {
        line.coords().map(|c| pos2(project(LonLat::from(*c)))).collect()
    };
    let outline = |polygon: &Polygon| {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            painter.add(Shape::closed_line(screen(ring), style.stroke));
        }
    };

    match geometry {
        Geometry::Point(p) => paint_point(painter, pos2(project(p.0.into())), style),
        Geometry::MultiPoint(points) => {
            for p in points {
                paint_point(painter, pos2(project(p.0.into())), style);
            }
        }
        Geometry::Line(line) => {
            let ends = [line.start, line.end].map(|c| pos2(project(c.into())));
            painter.add(Shape::line_segment(ends, style.stroke));
        }
        Geometry::LineString(line) => {
            painter.add(Shape::line(screen(line), style.stroke));
        }
        Geometry::MultiLineString(lines) => {
            for line in lines {
                painter.add(Shape::line(screen(line), style.stroke));
            }
        }
        Geometry::Polygon(polygon) => outline(polygon),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                outline(polygon);
            }
        }
        Geometry::Rect(rect) => outline(&rect.to_polygon()),
        Geometry::Triangle(triangle) => outline(&triangle.to_polygon()),
        Geometry::GeometryCollection(members) => {
            for member in members {
                paint_geometry(painter, member, style, project);
            }
        }
    }
}

fn paint_point(painter: &egui::Painter, center: Pos2, style: &LayerStyle) {
    painter.circle(center, style.point_radius, style.fill, style.stroke);
}

/// Captures clicks and pointer movement for box drawing, and previews the
/// rectangle being drawn
pub struct DrawBoxPlugin {
    preview: Option<(LonLat, LonLat)>,
    inputs: SharedDrawInputs,
}

impl std::fmt::Debug for DrawBoxPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawBoxPlugin")
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl DrawBoxPlugin {
    #[must_use]
    pub fn new(preview: Option<(LonLat, LonLat)>, inputs: SharedDrawInputs) -> Self {
        Self { preview, inputs }
    }
}

impl Plugin for DrawBoxPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let unproject = |pos: Pos2| from_position(projector.unproject(pos.to_vec2()));

        let mut captured = Vec::new();
        if let Some(pos) = response.hover_pos() {
            captured.push(DrawInput::Move(unproject(pos)));
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                captured.push(DrawInput::Click(unproject(pos)));
            }
        }
        if !captured.is_empty() {
            if let Ok(mut inputs) = self.inputs.lock() {
                inputs.extend(captured);
            }
        }

        if let Some((a, b)) = self.preview {
            let pa = projector.project(to_position(a));
            let pb = projector.project(to_position(b));
            let rect = egui::Rect::from_two_pos(pa.to_pos2(), pb.to_pos2());
            let painter = ui.painter().with_clip_rect(response.rect);
            painter.rect(
                rect,
                0.0,
                DRAW_BOX_FILL,
                DRAW_BOX_STROKE,
                egui::StrokeKind::Middle,
            );
        }

        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_hover_replaces_previous() {
        let hover: SharedHover = Arc::new(Mutex::new(None));
        let hit = Hover {
            pos: Pos2::new(3.0, 4.0),
            lines: vec!["SSSI: Moor House".to_string()],
        };

        publish_hover(&hover, Some(hit.clone()));
        assert_eq!(hover.lock().unwrap().as_ref(), Some(&hit));

        publish_hover(&hover, None);
        assert!(hover.lock().unwrap().is_none());
    }
}
