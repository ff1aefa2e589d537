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

mod app;
mod config;
mod controller;
mod coords;
mod embed;
mod map;
mod status;
mod ui;

use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use wfs_client::{DisplayMode, LonLat};

use app::{EpdsMapApp, LaunchOptions};
use config::AppConfig;
use coords::CoordinateError;

/// Desktop map of environmental planning data served over WFS
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "epds-map", version)]
struct Args {
    /// Latitude to jump to on startup (needs --lng)
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to jump to on startup (needs --lat)
    #[arg(long, allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Link whose query string carries lat and lng
    #[arg(long)]
    link: Option<String>,

    /// GeoServer host, overriding GEOSERVER_HOST and the config file
    #[arg(long)]
    host: Option<String>,

    /// Initial display mode: trees_reserves, solr_sssi or all_data
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// Announce the window height on stdout for an embedding host
    #[arg(long, default_value_t = false)]
    embedded: bool,
}

/// Startup jump target from `--lat`/`--lng`, falling back to `--link`.
///
/// Only one of `--lat`/`--lng` is treated like a link without both
/// parameters: ignored.
fn deep_link_target(args: &Args) -> Result<Option<LonLat>, CoordinateError> {
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        return coords::validate(lat, lng).map(Some);
    }

    match &args.link {
        Some(link) => coords::parse_deep_link(link),
        None => Ok(None),
    }
}

/// Startup position arguments that were given but could not be used.
fn ignored_position(args: &Args) -> Option<&'static str> {
    match (args.lat, args.lng, &args.link) {
        (Some(_), None, _) | (None, Some(_), _) => {
            Some("Startup coordinates ignored: both --lat and --lng are needed")
        }
        (None, None, Some(link)) if coords::parse_deep_link(link) == Ok(None) => {
            Some("Link ignored: it needs both lat and lng parameters")
        }
        _ => None,
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Starting EPDS Map...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    };

    let env_host = config::host_from_env();
    let host = config::resolve_host(
        args.host.as_deref(),
        env_host.as_deref(),
        config.geoserver_host.as_deref(),
    );
    let host_source = config::host_source(
        args.host.as_deref(),
        env_host.as_deref(),
        config.geoserver_host.as_deref(),
    );
    let endpoint = config.endpoint(host);
    info!("Feature server: {} (host from {host_source})", endpoint.base_url());

    let link_warning = ignored_position(&args);
    if let Some(warning) = link_warning {
        warn!("{warning}");
    }
    let (jump_to, link_error) = match deep_link_target(&args) {
        Ok(target) => (target, None),
        Err(e) => {
            warn!("Ignoring deep link: {e}");
            (None, Some(e))
        }
    };

    let runtime = tokio::runtime::Runtime::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_title("EPDS Map"),
        ..Default::default()
    };

    let launch = LaunchOptions {
        config,
        endpoint,
        host_source,
        mode: args.mode,
        jump_to,
        link_error,
        link_warning,
        embedded: args.embedded,
    };

    let result = eframe::run_native(
        "EPDS Map",
        options,
        Box::new(move |cc| {
            let app = EpdsMapApp::new(cc, launch, handle)?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    );

    runtime.shutdown_background();
    result
}
