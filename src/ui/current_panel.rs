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

use owm_client::{ApiConfig, CurrentConditions};

use super::{detail_row, remote_image, ACCENT_COLOR, LABEL_COLOR};
use crate::image_cache::ImageCache;

/// Current conditions: location, temperature, description and details
pub struct CurrentPanel;

impl CurrentPanel {
    pub fn render(
        ui: &mut egui::Ui,
        current: &CurrentConditions,
        api: &ApiConfig,
        icons: Option<&ImageCache>,
    ) {
        let temp_unit = api.units.temperature_suffix();

        ui.vertical(|ui| {
            ui.label(egui::RichText::new(current.location_label())
                .size(20.0)
                .strong());
            ui.label(egui::RichText::new(current.coordinate.to_string())
                .color(LABEL_COLOR)
                .size(10.0)
                .monospace());

            ui.horizontal(|ui| {
                if !current.icon_id.is_empty() {
                    let url = api.icon_url_2x(&current.icon_id);
                    remote_image(ui, icons, &url, &url, egui::vec2(72.0, 72.0));
                }
                ui.label(egui::RichText::new(format!("{}{}", current.rounded_temperature(), temp_unit))
                    .size(44.0)
                    .color(ACCENT_COLOR)
                    .strong());
            });

            ui.label(egui::RichText::new(&current.description)
                .size(15.0)
                .italics());

            ui.add_space(8.0);

            detail_row(ui, "💨", "Wind", format!("{} {}", current.wind_speed, api.units.speed_suffix()));
            detail_row(ui, "💧", "Humidity", format!("{}%", current.humidity));
            detail_row(ui, "🌡", "Feels like", format!("{}{}", current.feels_like, temp_unit));
            detail_row(ui, "👁", "Visibility", visibility_text(current));
        });
    }
}

fn visibility_text(current: &CurrentConditions) -> String {
    current
        .visibility_km()
        .map_or_else(|| "n/a".to_string(), |km| format!("{km:.1} km"))
}
