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

//! Toolbar above the map.

use egui::{Color32, RichText};
use wfs_client::DisplayMode;

/// Something the user asked for from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    SelectMode(DisplayMode),
    BeginDraw,
    CancelDraw,
    Jump(String),
    OpenTable,
    SaveView,
}

/// Toolbar state that outlives a frame
#[derive(Debug, Default)]
pub struct Controls {
    /// Coordinate input buffer
    pub coordinate_input: String,
}

/// Per-frame facts the toolbar displays
#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub mode: DisplayMode,
    pub drawing: bool,
    pub loading: usize,
}

impl Controls {
    /// Render the toolbar and return the actions triggered this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, state: ToolbarState) -> Vec<ControlAction> {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            ui.label(RichText::new("Layers").strong());

            let mut selected = state.mode;
            egui::ComboBox::from_id_salt("display_mode")
                .selected_text(selected.display_name())
                .show_ui(ui, |ui| {
                    for mode in DisplayMode::ALL {
                        ui.selectable_value(&mut selected, mode, mode.display_name());
                    }
                });
            if selected != state.mode {
                actions.push(ControlAction::SelectMode(selected));
            }

            ui.separator();

            if state.drawing {
                if ui
                    .button(RichText::new("✕ Cancel box").color(Color32::from_rgb(255, 200, 100)))
                    .on_hover_text("Escape also cancels")
                    .clicked()
                {
                    actions.push(ControlAction::CancelDraw);
                }
                ui.label(
                    RichText::new("Click two corners on the map")
                        .italics()
                        .color(Color32::from_rgb(150, 150, 150)),
                );
            } else if ui
                .button("▭ Draw box")
                .on_hover_text("Load the selected layers inside a rectangle")
                .clicked()
            {
                actions.push(ControlAction::BeginDraw);
            }

            ui.separator();

            ui.label("Lat, lng:");
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.coordinate_input)
                    .hint_text("54.9, -3.4")
                    .desired_width(140.0),
            );
            let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Go").clicked() || submitted {
                actions.push(ControlAction::Jump(self.coordinate_input.clone()));
            }

            ui.separator();

            if ui.button("☰ Table view").clicked() {
                actions.push(ControlAction::OpenTable);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .small_button("💾")
                    .on_hover_text("Save current view and layers as startup defaults")
                    .clicked()
                {
                    actions.push(ControlAction::SaveView);
                }
                if state.loading > 0 {
                    ui.spinner();
                    ui.label(
                        RichText::new(format!("Loading {} layers", state.loading))
                            .color(Color32::from_rgb(100, 200, 200)),
                    );
                }
            });
        });

        actions
    }
}
