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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It covers the GeoServer endpoint, the initial view, coordinate-jump
//! behaviour and window geometry. Every field has a serde default so older
//! or partial config files keep loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wfs_client::{DisplayMode, LonLat, WfsEndpoint};

/// Name used for the config directory and file
pub const APP_NAME: &str = "epds-map";

/// Environment variable holding the GeoServer host
pub const GEOSERVER_HOST_ENV: &str = "GEOSERVER_HOST";

/// Host used when neither the environment nor the config names one
pub const DEFAULT_GEOSERVER_HOST: &str = "localhost";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// GeoServer URL scheme
    #[serde(default = "default_scheme")]
    pub geoserver_scheme: String,

    /// GeoServer host (the GEOSERVER_HOST env var takes precedence)
    #[serde(default)]
    pub geoserver_host: Option<String>,

    /// GeoServer port
    #[serde(default = "default_port")]
    pub geoserver_port: u16,

    /// WFS service path
    #[serde(default = "default_path")]
    pub geoserver_path: String,

    /// Workspace prefix for feature types
    #[serde(default = "default_workspace")]
    pub geoserver_workspace: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Display mode selected at startup
    #[serde(default)]
    pub default_mode: DisplayMode,

    /// Initial map centre latitude
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,

    /// Initial map centre longitude
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,

    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// The map never zooms out past this level
    #[serde(default = "default_zoom")]
    pub min_zoom: f64,

    /// Zoom level a coordinate jump lands on
    #[serde(default = "default_jump_zoom")]
    pub jump_zoom: f64,

    /// Coordinate jump animation length in milliseconds
    #[serde(default = "default_jump_animation_ms")]
    pub jump_animation_ms: u64,

    /// Reload the last extent as soon as the display mode changes
    #[serde(default)]
    pub reload_on_mode_change: bool,

    /// Initial window width in points
    #[serde(default = "default_window_width")]
    pub window_width: f32,

    /// Initial window height in points
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/geoserver/wfs".to_string()
}

fn default_workspace() -> String {
    "EPDS".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_center_latitude() -> f64 {
    54.910
}

fn default_center_longitude() -> f64 {
    -3.432
}

fn default_zoom() -> f64 {
    6.0
}

fn default_jump_zoom() -> f64 {
    12.0
}

fn default_jump_animation_ms() -> u64 {
    1000
}

fn default_window_width() -> f32 {
    1280.0
}

fn default_window_height() -> f32 {
    800.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            geoserver_scheme: default_scheme(),
            geoserver_host: None,
            geoserver_port: default_port(),
            geoserver_path: default_path(),
            geoserver_workspace: default_workspace(),
            request_timeout_secs: default_request_timeout_secs(),
            default_mode: DisplayMode::default(),
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            default_zoom: default_zoom(),
            min_zoom: default_zoom(),
            jump_zoom: default_jump_zoom(),
            jump_animation_ms: default_jump_animation_ms(),
            reload_on_mode_change: false,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// Initial map centre
    #[must_use]
    pub fn center(&self) -> LonLat {
        LonLat::new(self.center_longitude, self.center_latitude)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn jump_duration(&self) -> Duration {
        Duration::from_millis(self.jump_animation_ms)
    }

    /// WFS endpoint for the given resolved host
    #[must_use]
    pub fn endpoint(&self, host: String) -> WfsEndpoint {
        WfsEndpoint {
            scheme: self.geoserver_scheme.clone(),
            host,
            port: self.geoserver_port,
            path: self.geoserver_path.clone(),
            workspace: self.geoserver_workspace.clone(),
        }
    }
}

/// Resolve the GeoServer host.
///
/// A command-line host wins, then the environment, then the config file,
/// then [`DEFAULT_GEOSERVER_HOST`]. Empty values are skipped.
#[must_use]
pub fn resolve_host(cli: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    [cli, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|host| !host.is_empty())
        .unwrap_or(DEFAULT_GEOSERVER_HOST)
        .to_string()
}

/// Name the source [`resolve_host`] takes its answer from
#[must_use]
pub fn host_source(cli: Option<&str>, env: Option<&str>, config: Option<&str>) -> &'static str {
    let present = |value: Option<&str>| value.is_some_and(|host| !host.trim().is_empty());
    if present(cli) {
        "command line"
    } else if present(env) {
        GEOSERVER_HOST_ENV
    } else if present(config) {
        "config file"
    } else {
        "default"
    }
}

/// Read the host from [`GEOSERVER_HOST_ENV`], if set
#[must_use]
pub fn host_from_env() -> Option<String> {
    std::env::var(GEOSERVER_HOST_ENV).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.default_mode, DisplayMode::TreesReserves);
        assert_eq!(config.center(), LonLat::new(-3.432, 54.910));
        assert_eq!(config.default_zoom, 6.0);
        assert_eq!(config.min_zoom, 6.0);
        assert_eq!(config.jump_zoom, 12.0);
        assert_eq!(config.jump_duration(), Duration::from_millis(1000));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.reload_on_mode_change);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "geoserver_port": 9090, "default_mode": "solr_sssi" }"#).unwrap();
        assert_eq!(config.geoserver_port, 9090);
        assert_eq!(config.default_mode, DisplayMode::SolrSssi);
        assert_eq!(config.geoserver_workspace, "EPDS");
        assert_eq!(config.jump_zoom, 12.0);
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = AppConfig {
            geoserver_port: 8600,
            ..Default::default()
        };
        let endpoint = config.endpoint("maps.example.org".to_string());
        assert_eq!(endpoint.base_url(), "http://maps.example.org:8600/geoserver/wfs");
        assert_eq!(endpoint.workspace, "EPDS");
    }

    #[test]
    fn test_host_precedence() {
        assert_eq!(resolve_host(None, None, None), "localhost");
        assert_eq!(resolve_host(None, None, Some("cfg-host")), "cfg-host");
        assert_eq!(resolve_host(None, Some("env-host"), Some("cfg-host")), "env-host");
        assert_eq!(
            resolve_host(Some("cli-host"), Some("env-host"), Some("cfg-host")),
            "cli-host"
        );
    }

    #[test]
    fn test_empty_hosts_are_skipped() {
        assert_eq!(resolve_host(None, Some(""), Some("cfg-host")), "cfg-host");
        assert_eq!(resolve_host(Some("  "), None, None), "localhost");
    }

    #[test]
    fn test_host_source_follows_precedence() {
        assert_eq!(host_source(None, None, None), "default");
        assert_eq!(host_source(None, Some(""), Some("cfg-host")), "config file");
        assert_eq!(host_source(None, Some("env-host"), Some("cfg-host")), "GEOSERVER_HOST");
        assert_eq!(host_source(Some("cli-host"), Some("env-host"), None), "command line");
    }
}
