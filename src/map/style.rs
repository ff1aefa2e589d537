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

//! Per-layer render styles.

use egui::{Color32, Stroke};
use wfs_client::LayerName;

/// How features of one layer are painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub stroke: Stroke,
    /// Polygon and point fill
    pub fill: Color32,
    /// Marker radius for point geometries
    pub point_radius: f32,
}

/// Translucent fill used for the box being drawn
pub const DRAW_BOX_FILL: Color32 = Color32::from_rgba_premultiplied(40, 40, 40, 40);

/// Outline of the box being drawn
pub const DRAW_BOX_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::from_rgb(51, 153, 204),
};

impl LayerStyle {
    #[must_use]
    pub fn for_layer(layer: LayerName) -> Self {
        match layer {
            LayerName::Reserves => Self {
                stroke: Stroke::new(2.0, Color32::from_rgb(0, 0, 255)),
                fill: Color32::from_rgba_unmultiplied(0, 0, 255, 102),
                point_radius: 4.0,
            },
            LayerName::Sssi => Self {
                stroke: Stroke::new(2.0, Color32::from_rgb(0, 255, 0)),
                fill: Color32::from_rgba_unmultiplied(0, 255, 0, 102),
                point_radius: 4.0,
            },
            LayerName::Tpo => Self {
                stroke: Stroke::new(2.0, Color32::RED),
                fill: Color32::BLACK,
                point_radius: 4.0,
            },
            LayerName::Solr => Self {
                stroke: Stroke::new(2.0, Color32::from_rgb(0, 0, 255)),
                fill: Color32::from_rgba_unmultiplied(0, 0, 0, 77),
                point_radius: 4.0,
            },
        }
    }
}
