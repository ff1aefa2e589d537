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

use egui::{Color32, RichText};

use crate::map::Hover;

/// Popup offset from the pointer
pub const POPUP_OFFSET: egui::Vec2 = egui::vec2(9.0, 9.0);

/// Show the hover popup next to the pointer
pub fn show_hover(ctx: &egui::Context, hover: &Hover) {
    egui::Area::new(egui::Id::new("feature_hover_popup"))
        .order(egui::Order::Tooltip)
        .fixed_pos(hover.pos + POPUP_OFFSET)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .show(ui, |ui| {
                    for line in &hover.lines {
                        ui.label(RichText::new(line).color(Color32::from_rgb(220, 220, 220)).size(12.0));
                    }
                });
        });
}
