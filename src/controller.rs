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

//! Map view state: display mode, box drawing and the active data layers.
//!
//! [`MapViewController`] is a plain value owned by the app. It never talks to
//! the network itself; operations that need data return [`LoadRequest`]s for
//! the caller to hand to the loader, and completed loads come back through
//! [`MapViewController::apply`].

use std::sync::Arc;

use log::{debug, info, warn};
use wfs_client::{
    DisplayMode, Extent, Feature, HitTest, HitTolerance, LayerName, LoadEvent, LoadRequest, LonLat,
};

/// State of the box-drawing interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawMode {
    #[default]
    None,
    Box(BoxDraw),
}

/// An in-progress rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxDraw {
    /// Corner fixed by the first click
    pub anchor: Option<LonLat>,
    /// Corner following the pointer
    pub corner: Option<LonLat>,
}

impl BoxDraw {
    /// Both corners, once the anchor is set and the pointer has moved.
    #[must_use]
    pub fn rectangle(&self) -> Option<(LonLat, LonLat)> {
        Some((self.anchor?, self.corner?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerStatus {
    Loading,
    Ready,
    Failed(String),
}

/// One active data layer.
#[derive(Debug, Clone)]
pub struct LayerSlot {
    pub layer: LayerName,
    /// Generation of the request that owns this slot
    pub generation: u64,
    pub extent: Extent,
    pub status: LayerStatus,
    pub features: Arc<Vec<Feature>>,
}

/// What [`MapViewController::apply`] did with a load event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Ready { layer: LayerName, count: usize },
    Failed { layer: LayerName, error: String },
    /// The event belonged to a superseded request
    Stale,
}

/// Result of a click while drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawClick {
    /// No box interaction is attached
    Ignored,
    /// First corner placed
    Anchored,
    /// Rectangle finished; the extent and the loads it triggered
    Finished {
        extent: Extent,
        requests: Vec<LoadRequest>,
    },
}

#[derive(Debug)]
pub struct MapViewController {
    mode: DisplayMode,
    draw: DrawMode,
    slots: Vec<LayerSlot>,
    generation: u64,
    last_extent: Option<Extent>,
    reload_on_mode_change: bool,
}

impl Default for MapViewController {
    fn default() -> Self {
        Self::new(DisplayMode::default(), false)
    }
}

impl MapViewController {
    #[must_use]
    pub fn new(mode: DisplayMode, reload_on_mode_change: bool) -> Self {
        Self {
            mode,
            draw: DrawMode::None,
            slots: Vec::new(),
            generation: 0,
            last_extent: None,
            reload_on_mode_change,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.draw, DrawMode::Box(_))
    }

    /// Active data layers in draw order (bottom first).
    #[must_use]
    pub fn slots(&self) -> &[LayerSlot] {
        &self.slots
    }

    #[must_use]
    pub fn loading_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status == LayerStatus::Loading)
            .count()
    }

    /// Change the display mode.
    ///
    /// Layers are only rebuilt right away when reload-on-mode-change is set
    /// and an extent has been queried before; otherwise the new mode applies
    /// to the next extent.
    pub fn select_mode(&mut self, mode: DisplayMode) -> Vec<LoadRequest> {
        if mode == self.mode {
            return Vec::new();
        }
        info!("Display mode changed to {mode}");
        self.mode = mode;

        match self.last_extent {
            Some(extent) if self.reload_on_mode_change => self.compute_layers(extent),
            _ => Vec::new(),
        }
    }

    /// Replace every data layer with fresh `Loading` slots for the current
    /// mode and return the fetches to start.
    pub fn compute_layers(&mut self, extent: Extent) -> Vec<LoadRequest> {
        self.generation += 1;
        let generation = self.generation;

        self.slots = self
            .mode
            .layers()
            .iter()
            .map(|&layer| LayerSlot {
                layer,
                generation,
                extent,
                status: LayerStatus::Loading,
                features: Arc::new(Vec::new()),
            })
            .collect();
        self.last_extent = Some(extent);

        if let DrawMode::Box(draw) = &mut self.draw {
            *draw = BoxDraw::default();
        }

        info!(
            "Loading {} layers for extent {extent} (generation {generation})",
            self.slots.len()
        );

        self.slots
            .iter()
            .map(|slot| LoadRequest {
                layer: slot.layer,
                extent,
                generation,
            })
            .collect()
    }

    /// Attach the box interaction, dropping any one in progress.
    pub fn begin_box_draw(&mut self) {
        debug!("Box drawing started");
        self.draw = DrawMode::Box(BoxDraw::default());
    }

    /// Detach the box interaction without loading anything.
    pub fn cancel_draw(&mut self) {
        if self.is_drawing() {
            debug!("Box drawing cancelled");
        }
        self.draw = DrawMode::None;
    }

    /// Pointer moved over the map while drawing.
    pub fn draw_move(&mut self, pos: LonLat) {
        if let DrawMode::Box(draw) = &mut self.draw {
            if draw.anchor.is_some() {
                draw.corner = Some(pos);
            }
        }
    }

    /// Click on the map while drawing: the first click anchors a corner, the
    /// second finishes the rectangle and loads its extent.
    pub fn draw_click(&mut self, pos: LonLat) -> DrawClick {
        let DrawMode::Box(draw) = &mut self.draw else {
            return DrawClick::Ignored;
        };

        let Some(anchor) = draw.anchor else {
            *draw = BoxDraw {
                anchor: Some(pos),
                corner: Some(pos),
            };
            return DrawClick::Anchored;
        };

        let extent = Extent::from_lon_lat_corners(anchor, pos);
        let requests = self.compute_layers(extent);
        self.draw = DrawMode::None;
        DrawClick::Finished { extent, requests }
    }

    /// The rectangle to preview, if one is being drawn.
    #[must_use]
    pub fn preview_box(&self) -> Option<(LonLat, LonLat)> {
        match &self.draw {
            DrawMode::Box(draw) => draw.rectangle(),
            DrawMode::None => None,
        }
    }

    /// Finish a coordinate jump: switch to all data and load `extent`.
    pub fn complete_jump(&mut self, extent: Extent) -> Vec<LoadRequest> {
        if self.mode != DisplayMode::AllData {
            info!("Display mode changed to {} by coordinate jump", DisplayMode::AllData);
            self.mode = DisplayMode::AllData;
        }
        self.compute_layers(extent)
    }

    /// Apply a completed load if it still matches the slot it was made for.
    pub fn apply(&mut self, event: LoadEvent) -> Applied {
        let layer = event.layer();
        let generation = event.generation();

        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.layer == layer && slot.generation == generation)
        else {
            debug!("Discarding stale result for layer {layer} (generation {generation})");
            return Applied::Stale;
        };

        match event {
            LoadEvent::Loaded { features, .. } => {
                let count = features.len();
                slot.features = Arc::new(features);
                slot.status = LayerStatus::Ready;
                Applied::Ready { layer, count }
            }
            LoadEvent::Failed { error, .. } => {
                warn!("Layer {layer} failed: {error}");
                slot.status = LayerStatus::Failed(error.clone());
                Applied::Failed { layer, error }
            }
        }
    }
}

/// Describe every feature under `cursor`, top layer first.
///
/// `project` maps a geographic position to screen coordinates.
pub fn describe_hits<F>(
    slots: &[LayerSlot],
    cursor: [f32; 2],
    tolerance: HitTolerance,
    project: &F,
) -> Vec<String>
where
    F: Fn(LonLat) -> [f32; 2],
{
    let mut lines = Vec::new();
    for slot in slots.iter().rev() {
        for feature in slot.features.iter() {
            let hit = feature
                .geometry
                .as_ref()
                .is_some_and(|geometry| geometry.hit_test(cursor, tolerance, project));
            if hit {
                lines.push(slot.layer.describe(&feature.properties));
            }
        }
    }
    lines
}
