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

use std::path::PathBuf;

use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

use crate::config::APP_NAME;

/// Tile source for the standard OpenStreetMap raster tiles
#[derive(Debug, Clone, Copy, Default)]
pub struct OsmTileSource;

impl TileSource for OsmTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://tile.openstreetmap.org/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors",
            url: "https://www.openstreetmap.org/copyright",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// On-disk cache directory for base map tiles
#[must_use]
pub fn tile_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_NAME)
        .join("tiles")
        .join("osm")
}

/// Base map tiles, cached on disk
#[must_use]
pub fn base_tiles(ctx: &egui::Context) -> HttpTiles {
    let http_options = HttpOptions {
        cache: Some(tile_cache_dir()),
        ..Default::default()
    };
    HttpTiles::with_options(OsmTileSource, http_options, ctx.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url() {
        let url = OsmTileSource.tile_url(TileId { x: 63, y: 40, zoom: 7 });
        assert_eq!(url, "https://tile.openstreetmap.org/7/63/40.png");
    }

    #[test]
    fn test_cache_dir_is_app_scoped() {
        let dir = tile_cache_dir();
        assert!(dir.ends_with("epds-map/tiles/osm"));
    }
}
