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

use chrono::Utc;
use wfs_client::Extent;

use crate::controller::{LayerSlot, LayerStatus};
use crate::status::{DiagnosticLevel, SystemStatus};

/// Longest diagnostic shown before truncation
const MAX_MESSAGE_CHARS: usize = 40;

#[derive(Debug)]
pub struct StatusPane {
    pub visible: bool,
    pub collapsed: bool,
}

impl Default for StatusPane {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPane {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: true,
            collapsed: false,
        }
    }

    /// Render the status pane as a floating window
    pub fn render(&mut self, ctx: &egui::Context, status: &SystemStatus, slots: &[LayerSlot]) {
        if !self.visible {
            // Show a small button to re-open the status pane when hidden
            egui::Window::new("show_status")
                .title_bar(false)
                .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -24.0))
                .fixed_size(egui::vec2(140.0, 35.0))
                .resizable(false)
                .frame(egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 200))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                    .corner_radius(6.0))
                .show(ctx, |ui| {
                    if ui.button(egui::RichText::new("📊 Show Status")
                        .color(egui::Color32::from_rgb(150, 200, 220))
                        .size(11.0))
                        .clicked() {
                        self.visible = true;
                    }
                });
            return;
        }

        let screen_height = ctx.content_rect().height();

        egui::Window::new("System Status")
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -24.0))
            .fixed_size(egui::vec2(320.0, if self.collapsed { 40.0 } else { screen_height.min(420.0) }))
            .resizable(false)
            .collapsible(false)
            .frame(egui::Frame::window(&ctx.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0))
            .show(ctx, |ui| {
                // Header with collapse and close buttons
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("◈ STATUS")
                        .color(egui::Color32::from_rgb(100, 180, 220))
                        .size(12.0)
                        .strong());

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(egui::RichText::new("✕")
                            .size(12.0)
                            .color(egui::Color32::from_rgb(200, 100, 100)))
                            .on_hover_text("Hide status pane")
                            .clicked() {
                            self.visible = false;
                        }

                        ui.add_space(4.0);

                        let collapse_icon = if self.collapsed { "▼" } else { "▲" };
                        if ui.button(egui::RichText::new(collapse_icon).size(10.0))
                            .on_hover_text(if self.collapsed { "Expand" } else { "Collapse" })
                            .clicked() {
                            self.collapsed = !self.collapsed;
                        }
                    });
                });

                if self.collapsed {
                    return;
                }

                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(screen_height.min(380.0))
                    .show(ui, |ui| {
                        render_server_section(ui, status);
                        ui.add_space(6.0);
                        render_layers_section(ui, slots);
                        ui.add_space(6.0);
                        render_diagnostics_section(ui, status);
                    });
            });
    }
}

fn section_heading(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text)
        .color(egui::Color32::from_rgb(150, 150, 150))
        .size(10.0)
        .strong());
    ui.add_space(3.0);
}

fn key_value(ui: &mut egui::Ui, key: &str, value: String) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(key)
            .color(egui::Color32::from_rgb(130, 130, 130))
            .size(9.0));
        ui.label(egui::RichText::new(value)
            .color(egui::Color32::from_rgb(200, 200, 200))
            .size(9.0)
            .monospace());
    });
}

fn render_server_section(ui: &mut egui::Ui, status: &SystemStatus) {
    section_heading(ui, "SERVER");
    key_value(ui, "WFS:", status.server_url.clone());
    key_value(ui, "Host from:", status.host_source.to_string());
    if let Some(path) = &status.config_path {
        key_value(ui, "Config:", path.clone());
    }
    key_value(
        ui,
        "Loads:",
        format!("{} ok / {} failed", status.layers_loaded, status.layers_failed),
    );
    if let Some(at) = status.last_load_at {
        let age = (Utc::now() - at).num_seconds().max(0);
        key_value(
            ui,
            "Last load:",
            format!("{} features, {}", status.last_feature_count, format_age(age.unsigned_abs())),
        );
    }
}

fn render_layers_section(ui: &mut egui::Ui, slots: &[LayerSlot]) {
    section_heading(ui, "LAYERS");

    if slots.is_empty() {
        ui.label(egui::RichText::new("Draw a box or jump to coordinates to load data")
            .color(egui::Color32::from_rgb(100, 100, 100))
            .size(8.0)
            .italics());
        return;
    }

    // Top layer first, matching the hover popup
    for slot in slots.iter().rev() {
        ui.horizontal(|ui| {
            let (icon, color, detail) = match &slot.status {
                LayerStatus::Loading => ("⏳", egui::Color32::from_rgb(255, 200, 100), "Loading...".to_string()),
                LayerStatus::Ready => (
                    "✓",
                    egui::Color32::from_rgb(100, 255, 100),
                    format!("{} features", slot.features.len()),
                ),
                LayerStatus::Failed(error) => ("✕", egui::Color32::from_rgb(255, 100, 100), truncate(error)),
            };

            ui.label(egui::RichText::new(icon).color(color).size(10.0));
            ui.label(egui::RichText::new(format!("{}:", slot.layer.display_name()))
                .color(egui::Color32::from_rgb(130, 130, 130))
                .size(9.0));
            ui.label(egui::RichText::new(detail)
                .color(egui::Color32::from_rgb(200, 200, 200))
                .size(8.0)
                .monospace());
        });
    }

    ui.label(egui::RichText::new(format!("Request generation {}", slots[0].generation))
        .color(egui::Color32::from_rgb(100, 100, 100))
        .size(8.0));
    ui.label(egui::RichText::new(extent_label(&slots[0].extent))
        .color(egui::Color32::from_rgb(100, 100, 100))
        .size(8.0)
        .monospace());
}

/// Queried area as south-west and north-east `lat,lng` corners
fn extent_label(extent: &Extent) -> String {
    let (sw, ne) = extent.to_lon_lat_corners();
    format!("{:.4},{:.4} to {:.4},{:.4}", sw.lat, sw.lon, ne.lat, ne.lon)
}

fn render_diagnostics_section(ui: &mut egui::Ui, status: &SystemStatus) {
    section_heading(ui, "DIAGNOSTICS");

    if status.diagnostics.is_empty() {
        ui.label(egui::RichText::new("No messages")
            .color(egui::Color32::from_rgb(100, 100, 100))
            .size(8.0)
            .italics());
        return;
    }

    let line_height = 14.0;
    let max_visible_lines = 6.0;

    egui::ScrollArea::vertical()
        .id_salt("diagnostics_scroll")
        .max_height(line_height * max_visible_lines)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            // Newest first
            for diagnostic in status.diagnostics.iter().rev() {
                ui.horizontal(|ui| {
                    let (icon, color) = match diagnostic.level {
                        DiagnosticLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 180, 255)),
                        DiagnosticLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 200, 100)),
                        DiagnosticLevel::Error => ("✕", egui::Color32::from_rgb(255, 100, 100)),
                    };

                    ui.label(egui::RichText::new(icon).color(color).size(9.0));

                    let time_str = diagnostic.timestamp.format("%H:%M:%S").to_string();
                    ui.label(egui::RichText::new(time_str)
                        .color(egui::Color32::from_rgb(100, 100, 100))
                        .size(8.0)
                        .monospace());

                    ui.label(egui::RichText::new(truncate(&diagnostic.message))
                        .color(egui::Color32::from_rgb(180, 180, 180))
                        .size(8.0))
                        .on_hover_text(&diagnostic.message);
                });
            }
        });
}

/// Shorten a message to [`MAX_MESSAGE_CHARS`] characters
fn truncate(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_CHARS {
        let head: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

fn format_age(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s ago")
    } else {
        format!("{secs}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfs_client::LonLat;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short"), "short");
        let long = "é".repeat(50);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_extent_label() {
        let extent = Extent::from_lon_lat_corners(LonLat::new(-3.6, 54.8), LonLat::new(-3.3, 55.0));
        assert_eq!(extent_label(&extent), "54.8000,-3.6000 to 55.0000,-3.3000");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(5), "5s ago");
        assert_eq!(format_age(125), "2m 5s ago");
        assert_eq!(format_age(7300), "2h 1m ago");
    }
}
