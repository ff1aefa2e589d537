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

//! The eframe application: wires the controller, the loader and the map
//! widgets together once per frame.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio::runtime::Handle;
use walkers::{HttpTiles, Map, MapMemory};
use wfs_client::{DisplayMode, Extent, LayerLoader, LoadRequest, LoaderConfig, LonLat, WfsEndpoint, WfsError};

use crate::config::AppConfig;
use crate::controller::{Applied, DrawClick, MapViewController};
use crate::coords::{self, CoordinateError};
use crate::embed;
use crate::map::{
    self, base_tiles, DrawBoxPlugin, DrawInput, FeatureLayersPlugin, FillCache, SharedDrawInputs, SharedHover,
    ViewAnimation,
};
use crate::status::{DiagnosticLevel, SystemStatus};
use crate::ui::{tooltip, ControlAction, Controls, DataTableModal, StatusPane, ToolbarState};

/// Startup options resolved in `main`
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub config: AppConfig,
    pub endpoint: WfsEndpoint,
    /// Where the host came from, for the status pane
    pub host_source: &'static str,
    /// Mode given on the command line, overriding the config default
    pub mode: Option<DisplayMode>,
    /// Coordinates to jump to on the first frame
    pub jump_to: Option<LonLat>,
    /// Rejected deep link, reported in the status pane
    pub link_error: Option<CoordinateError>,
    /// Position arguments that were given but unusable
    pub link_warning: Option<&'static str>,
    pub embedded: bool,
}

/// Build the animation for a jump to `target`.
#[must_use]
pub fn plan_jump(from: LonLat, from_zoom: f64, target: LonLat, config: &AppConfig) -> ViewAnimation {
    ViewAnimation::new(from, from_zoom, target, config.jump_zoom, config.jump_duration())
}

/// Extent covered by a map viewport of `size` pixels centred on `center`.
#[must_use]
pub fn view_extent(center: LonLat, zoom: f64, size: egui::Vec2) -> Extent {
    Extent::around(center.to_mercator(), zoom, f64::from(size.x), f64::from(size.y))
}

/// Startup diagnostics: the server in use and any unusable deep link
fn report_launch(status: &mut SystemStatus, link_error: Option<&CoordinateError>, link_warning: Option<&str>) {
    status.add_diagnostic(
        DiagnosticLevel::Info,
        format!("Using feature server {}", status.server_url),
    );
    if let Some(warning) = link_warning {
        status.add_diagnostic(DiagnosticLevel::Warning, warning.to_string());
    }
    if let Some(e) = link_error {
        status.add_diagnostic(DiagnosticLevel::Error, format!("Deep link ignored: {e}"));
    }
}

/// A running jump
#[derive(Debug, Clone, Copy)]
struct ActiveJump {
    animation: ViewAnimation,
    started: Instant,
}

pub struct EpdsMapApp {
    config: AppConfig,
    controller: MapViewController,
    loader: LayerLoader,
    tiles: HttpTiles,
    map_memory: MapMemory,
    home: LonLat,
    fills: FillCache,
    status: SystemStatus,
    status_pane: StatusPane,
    controls: Controls,
    table: DataTableModal,
    jump: Option<ActiveJump>,
    pending_jump: Option<LonLat>,
    hover: SharedHover,
    draw_inputs: SharedDrawInputs,
    map_size: egui::Vec2,
    embedded: bool,
    first_frame: bool,
}

impl std::fmt::Debug for EpdsMapApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpdsMapApp")
            .field("controller", &self.controller)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl EpdsMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: LaunchOptions, runtime: Handle) -> Result<Self, WfsError> {
        let LaunchOptions {
            config,
            endpoint,
            host_source,
            mode,
            jump_to,
            link_error,
            link_warning,
            embedded,
        } = options;

        let mut status = SystemStatus::new(endpoint.base_url(), host_source);
        status.config_path = AppConfig::get_config_path()
            .ok()
            .map(|path| path.display().to_string());

        let ctx = cc.egui_ctx.clone();
        let loader = LayerLoader::new(
            LoaderConfig {
                endpoint,
                timeout: config.request_timeout(),
                ..Default::default()
            },
            runtime,
        )?
        .with_notifier(move || ctx.request_repaint());

        let home = config.center();
        let mut map_memory = MapMemory::default();
        if let Err(e) = map_memory.set_zoom(config.default_zoom) {
            warn!("Invalid default zoom {}: {e:?}", config.default_zoom);
        }

        report_launch(&mut status, link_error.as_ref(), link_warning);
        info!("EPDS Map started against {}", status.server_url);

        Ok(Self {
            controller: MapViewController::new(
                mode.unwrap_or(config.default_mode),
                config.reload_on_mode_change,
            ),
            loader,
            tiles: base_tiles(&cc.egui_ctx),
            map_memory,
            home,
            fills: FillCache::default(),
            status,
            status_pane: StatusPane::new(),
            controls: Controls::default(),
            table: DataTableModal::default(),
            jump: None,
            pending_jump: jump_to,
            hover: Arc::new(Mutex::new(None)),
            draw_inputs: Arc::new(Mutex::new(Vec::new())),
            map_size: egui::vec2(config.window_width, config.window_height),
            embedded,
            first_frame: true,
            config,
        })
    }

    fn send(&mut self, requests: Vec<LoadRequest>) {
        for request in requests {
            self.loader.request(request);
        }
    }

    fn current_center(&self) -> LonLat {
        map::from_position(self.map_memory.detached().unwrap_or_else(|| map::to_position(self.home)))
    }

    /// Move completed loads from the loader into the controller.
    fn drain_loads(&mut self) {
        while let Some(event) = self.loader.try_recv() {
            match self.controller.apply(event) {
                Applied::Ready { layer, count } => self.status.record_load(layer.display_name(), count),
                Applied::Failed { layer, error } => self.status.record_failure(layer.display_name(), &error),
                Applied::Stale => {}
            }
        }
        self.fills.retain_active(self.controller.slots());
    }

    fn start_jump(&mut self, target: LonLat) {
        info!("Jumping to {:.5}, {:.5}", target.lat, target.lon);
        let from = self.current_center();
        self.jump = Some(ActiveJump {
            animation: plan_jump(from, self.map_memory.zoom(), target, &self.config),
            started: Instant::now(),
        });
    }

    fn report_coordinate_error(&mut self, e: &CoordinateError) {
        warn!("Rejected coordinates: {e}");
        self.status.add_diagnostic(DiagnosticLevel::Error, e.to_string());
    }

    fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::SelectMode(mode) => {
                let requests = self.controller.select_mode(mode);
                self.send(requests);
            }
            ControlAction::BeginDraw => {
                self.jump = None;
                self.controller.begin_box_draw();
            }
            ControlAction::CancelDraw => self.controller.cancel_draw(),
            ControlAction::Jump(text) => match coords::parse_lat_lng(&text) {
                Ok(target) => self.start_jump(target),
                Err(e) => self.report_coordinate_error(&e),
            },
            ControlAction::OpenTable => self.table.open(self.controller.slots()),
            ControlAction::SaveView => self.save_view(),
        }
    }

    /// Store the current mode and view as startup defaults.
    fn save_view(&mut self) {
        let center = self.current_center();
        self.config.default_mode = self.controller.mode();
        self.config.center_latitude = center.lat;
        self.config.center_longitude = center.lon;
        self.config.default_zoom = self.map_memory.zoom();

        match self.config.save() {
            Ok(()) => {
                info!("Saved view settings");
                self.status
                    .add_diagnostic(DiagnosticLevel::Info, "Saved view as startup default".to_string());
            }
            Err(e) => {
                error!("Failed to save config: {e}");
                self.status
                    .add_diagnostic(DiagnosticLevel::Error, format!("Failed to save settings: {e}"));
            }
        }
    }

    /// First-frame work: embedding handshake and any deep-link jump.
    fn on_first_frame(&mut self, ctx: &egui::Context) {
        self.first_frame = false;

        if self.embedded {
            let height = ctx
                .input(|i| i.viewport().outer_rect)
                .map_or(self.config.window_height, |rect| rect.height());
            if let Err(e) = embed::announce_height(height) {
                warn!("Failed to announce height to host: {e}");
            }
        }

        if let Some(target) = self.pending_jump.take() {
            self.start_jump(target);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return;
        }
        if self.controller.is_drawing() {
            self.controller.cancel_draw();
        } else if self.table.is_open() {
            self.table.close();
        }
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let slots = self.controller.slots().to_vec();
        let layers = slots
            .into_iter()
            .map(|slot| {
                let triangles = self.fills.triangles(&slot);
                (slot, triangles)
            })
            .collect();

        let mut map = Map::new(Some(&mut self.tiles), &mut self.map_memory, map::to_position(self.home))
            .with_plugin(FeatureLayersPlugin::new(layers, self.hover.clone()));
        if self.controller.is_drawing() {
            map = map.with_plugin(DrawBoxPlugin::new(
                self.controller.preview_box(),
                self.draw_inputs.clone(),
            ));
        }

        let response = ui.add(map);
        self.map_size = response.rect.size();
    }

    /// Feed pointer input captured by the draw plugin to the controller.
    fn process_draw_inputs(&mut self) {
        let inputs = match self.draw_inputs.lock() {
            Ok(mut inputs) => std::mem::take(&mut *inputs),
            Err(_) => return,
        };

        for input in inputs {
            match input {
                DrawInput::Move(pos) => self.controller.draw_move(pos),
                DrawInput::Click(pos) => {
                    if let DrawClick::Finished { requests, .. } = self.controller.draw_click(pos) {
                        self.send(requests);
                    }
                }
            }
        }
    }

    fn enforce_min_zoom(&mut self) {
        if self.map_memory.zoom() < self.config.min_zoom {
            if let Err(e) = self.map_memory.set_zoom(self.config.min_zoom) {
                warn!("Invalid minimum zoom {}: {e:?}", self.config.min_zoom);
            }
        }
    }

    /// Advance a running jump, loading the final view when it lands.
    fn step_jump(&mut self, ctx: &egui::Context) {
        let Some(jump) = self.jump else {
            return;
        };

        let frame = jump.animation.frame(jump.started.elapsed());
        self.map_memory.center_at(map::to_position(frame.center));
        if let Err(e) = self.map_memory.set_zoom(frame.zoom) {
            warn!("Invalid zoom during jump: {e:?}");
        }

        if frame.finished {
            self.jump = None;
            let extent = view_extent(frame.center, frame.zoom, self.map_size);
            let requests = self.controller.complete_jump(extent);
            self.send(requests);
        } else {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

impl eframe::App for EpdsMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_loads();

        if self.first_frame {
            self.on_first_frame(ctx);
        }

        self.handle_keys(ctx);

        let state = ToolbarState {
            mode: self.controller.mode(),
            drawing: self.controller.is_drawing(),
            loading: self.controller.loading_count(),
        };
        let actions = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| self.controls.show(ui, state))
            .inner;
        for action in actions {
            self.handle_action(action);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });

        self.process_draw_inputs();
        self.step_jump(ctx);
        self.enforce_min_zoom();

        let hover = self.hover.lock().ok().and_then(|cell| cell.clone());
        if let Some(hover) = hover {
            tooltip::show_hover(ctx, &hover);
        }

        self.status_pane.render(ctx, &self.status, self.controller.slots());
        self.table.show(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfs_client::extent::resolution_at_zoom;

    #[test]
    fn test_jump_lands_on_projected_point() {
        let config = AppConfig::default();
        let target = coords::parse_lat_lng("54.9, -3.4").unwrap();
        let animation = plan_jump(config.center(), config.default_zoom, target, &config);

        let frame = animation.frame(config.jump_duration());
        assert!(frame.finished);
        assert_eq!(frame.zoom, config.jump_zoom);
        assert!((frame.center.lat - 54.9).abs() < 1e-9);
        assert!((frame.center.lon + 3.4).abs() < 1e-9);

        let halfway = animation.frame(config.jump_duration() / 2);
        assert!(!halfway.finished);
    }

    #[test]
    fn test_jump_then_complete_loads_all_layers() {
        let config = AppConfig::default();
        let target = coords::parse_lat_lng("54.9, -3.4").unwrap();
        let frame = plan_jump(config.center(), config.default_zoom, target, &config).frame(config.jump_duration());

        let mut controller = MapViewController::new(DisplayMode::SolrSssi, false);
        let requests = controller.complete_jump(view_extent(frame.center, frame.zoom, egui::vec2(800.0, 600.0)));
        assert_eq!(controller.mode(), DisplayMode::AllData);
        assert_eq!(requests.len(), 4);
    }

    #[test]
    fn test_malformed_input_does_not_plan_a_jump() {
        assert_eq!(coords::parse_lat_lng("54.9"), Err(CoordinateError::MissingLongitude));
    }

    #[test]
    fn test_view_extent_matches_resolution() {
        let center = LonLat::new(0.0, 0.0);
        let extent = view_extent(center, 12.0, egui::vec2(1024.0, 512.0));
        let resolution = resolution_at_zoom(12.0);
        assert!((extent.width() - 1024.0 * resolution).abs() < 1e-6);
        assert!((extent.height() - 512.0 * resolution).abs() < 1e-6);
        let mid = extent.center();
        assert!(mid[0].abs() < 1e-6 && mid[1].abs() < 1e-6);
    }

    #[test]
    fn test_launch_diagnostics_levels() {
        let mut status = SystemStatus::new("http://localhost:8080/geoserver/wfs".to_string(), "default");
        report_launch(
            &mut status,
            Some(&CoordinateError::MissingLongitude),
            Some("Link ignored: it needs both lat and lng parameters"),
        );

        let levels: Vec<DiagnosticLevel> = status.diagnostics.iter().map(|d| d.level).collect();
        assert_eq!(
            levels,
            [DiagnosticLevel::Info, DiagnosticLevel::Warning, DiagnosticLevel::Error]
        );
        assert!(status.diagnostics[0].message.ends_with("/geoserver/wfs"));
    }
}
