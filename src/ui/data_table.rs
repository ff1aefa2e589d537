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

//! Attribute table modal.
//!
//! Every active layer becomes one table whose columns are the union of the
//! attribute keys of its features, in the order they were first seen.

use std::io::Write;
use std::path::PathBuf;

use egui::RichText;
use egui_extras::{Column, TableBuilder};
use log::{info, warn};
use serde_json::Value;
use wfs_client::LayerName;

use crate::controller::LayerSlot;

/// One layer's attributes as text
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroup {
    pub layer: LayerName,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableGroup {
    #[must_use]
    pub fn heading(&self) -> &'static str {
        self.layer.display_name()
    }
}

/// Cell text: strings verbatim, missing empty, anything else as JSON
#[must_use]
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Build one table per slot, in slot order.
#[must_use]
pub fn build_groups(slots: &[LayerSlot]) -> Vec<TableGroup> {
    slots
        .iter()
        .map(|slot| {
            let mut columns: Vec<String> = Vec::new();
            for feature in slot.features.iter() {
                for key in feature.properties.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }

            let rows = slot
                .features
                .iter()
                .map(|feature| {
                    columns
                        .iter()
                        .map(|column| cell_text(feature.properties.get(column)))
                        .collect()
                })
                .collect();

            TableGroup {
                layer: slot.layer,
                columns,
                rows,
            }
        })
        .collect()
}

/// Write a group as CSV: a header row, then one row per feature.
pub fn write_csv<W: Write>(group: &TableGroup, writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&group.columns)?;
    for row in &group.rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Modal showing the attribute tables
#[derive(Debug, Default)]
pub struct DataTableModal {
    groups: Option<Vec<TableGroup>>,
    /// Result of the last export, shown under the tables
    last_export: Option<Result<PathBuf, String>>,
}

impl DataTableModal {
    /// Open the modal over a snapshot of the active layers
    pub fn open(&mut self, slots: &[LayerSlot]) {
        self.groups = Some(build_groups(slots));
        self.last_export = None;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.groups.is_some()
    }

    pub fn close(&mut self) {
        self.groups = None;
    }

    /// Render the modal if open. Closes on the Close button, a click
    /// outside or Escape.
    pub fn show(&mut self, ctx: &egui::Context) {
        let Some(groups) = &self.groups else {
            return;
        };

        let mut export = None;
        let mut close_clicked = false;
        let max_size = modal_max_size(ctx.content_rect());

        let response = egui::Modal::new(egui::Id::new("data_table_modal")).show(ctx, |ui| {
            ui.set_max_size(max_size);
            ui.heading("Layer data");
            ui.separator();

            egui::ScrollArea::both()
                .max_height(max_size.y - 80.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    if groups.is_empty() {
                        ui.label(
                            RichText::new("No layers loaded yet. Draw a box or jump to coordinates.")
                                .italics(),
                        );
                    }
                    for group in groups {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(group.heading()).strong().size(15.0));
                            ui.label(format!("({} features)", group.rows.len()));
                            if !group.rows.is_empty() && ui.small_button("Export CSV").clicked() {
                                export = Some(group.clone());
                            }
                        });
                        render_table(ui, group);
                        ui.add_space(12.0);
                    }
                });

            if let Some(result) = &self.last_export {
                match result {
                    Ok(path) => ui.label(format!("Saved {}", path.display())),
                    Err(e) => ui.colored_label(egui::Color32::from_rgb(255, 100, 100), e),
                };
            }

            ui.separator();
            if ui.button("Close").clicked() {
                close_clicked = true;
            }
        });

        if let Some(group) = export {
            self.last_export = export_group(&group);
        }
        if close_clicked || response.should_close() {
            self.close();
        }
    }
}

fn render_table(ui: &mut egui::Ui, group: &TableGroup) {
    if group.columns.is_empty() {
        ui.label(RichText::new("No attributes").italics());
        return;
    }

    ui.push_id(group.layer.as_str(), |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0).clip(true), group.columns.len())
            .header(20.0, |mut header| {
                for column in &group.columns {
                    header.col(|ui| {
                        ui.strong(column);
                    });
                }
            })
            .body(|mut body| {
                for row in &group.rows {
                    body.row(18.0, |mut table_row| {
                        for cell in row {
                            table_row.col(|ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

/// Ask for a destination and write the group. `None` when the dialog was
/// dismissed.
fn export_group(group: &TableGroup) -> Option<Result<PathBuf, String>> {
    let path = rfd::FileDialog::new()
        .set_file_name(format!("{}.csv", group.layer.as_str()))
        .add_filter("CSV", &["csv"])
        .save_file()?;

    let result = std::fs::File::create(&path)
        .map_err(csv::Error::from)
        .and_then(|file| write_csv(group, file));

    Some(match result {
        Ok(()) => {
            info!("Exported {} rows to {}", group.rows.len(), path.display());
            Ok(path)
        }
        Err(e) => {
            warn!("CSV export to {} failed: {e}", path.display());
            Err(format!("Export failed: {e}"))
        }
    })
}

/// Largest size the modal may take within the visible content area
fn modal_max_size(content: egui::Rect) -> egui::Vec2 {
    content.size() * 0.85
}
