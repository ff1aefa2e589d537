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

//! Map rendering and interaction.
//!
//! This module provides the base tile source, layer styles, polygon fills,
//! the walkers plugins and the coordinate-jump animation.

pub mod animation;
pub mod fill;
pub mod plugins;
pub mod style;
pub mod tiles;

pub use animation::ViewAnimation;
pub use fill::FillCache;
pub use plugins::{DrawBoxPlugin, DrawInput, FeatureLayersPlugin, Hover, SharedDrawInputs, SharedHover};
pub use tiles::base_tiles;

use walkers::Position;
use wfs_client::LonLat;

#[must_use]
pub fn to_position(p: LonLat) -> Position {
    walkers::lat_lon(p.lat, p.lon)
}

#[must_use]
pub fn from_position(p: Position) -> LonLat {
    LonLat::new(p.x(), p.y())
}
