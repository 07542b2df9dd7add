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

use owm_client::{ApiConfig, ForecastEntry};

use super::{remote_image, LABEL_COLOR, VALUE_COLOR};
use crate::image_cache::ImageCache;

const CARD_WIDTH: f32 = 64.0;
const SPARKLINE_HEIGHT: f32 = 28.0;

/// Hourly forecast cards with a temperature sparkline underneath
pub struct ForecastStrip {
    // Normalized sparkline values (0.0 bottom .. 1.0 top), rebuilt only
    // when the forecast changes
    cached_for: Vec<ForecastEntry>,
    cached_levels: Vec<f32>,
}

impl ForecastStrip {
    pub fn new() -> Self {
        Self {
            cached_for: Vec::new(),
            cached_levels: Vec::new(),
        }
    }

    pub fn render(
        &mut self,
        ui: &mut egui::Ui,
        forecast: &[ForecastEntry],
        api: &ApiConfig,
        icons: Option<&ImageCache>,
    ) {
        ui.label(egui::RichText::new("Hourly Forecast")
            .size(15.0)
            .strong());

        if forecast.is_empty() {
            ui.label(egui::RichText::new("No forecast available").color(LABEL_COLOR));
            return;
        }

        let temp_unit = api.units.temperature_suffix();

        egui::ScrollArea::horizontal()
            .id_salt("hourly_forecast")
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        for entry in forecast {
                            egui::Frame::group(ui.style()).show(ui, |ui| {
                                ui.set_width(CARD_WIDTH);
                                ui.vertical_centered(|ui| {
                                    ui.label(egui::RichText::new(entry.hour_label())
                                        .color(LABEL_COLOR)
                                        .size(11.0)
                                        .monospace());
                                    if !entry.icon_id.is_empty() {
                                        let url = api.icon_url(&entry.icon_id);
                                        remote_image(ui, icons, &url, &url, egui::vec2(40.0, 40.0));
                                    }
                                    ui.label(egui::RichText::new(format!("{}{}", entry.rounded_temperature(), temp_unit))
                                        .color(VALUE_COLOR)
                                        .size(13.0)
                                        .strong());
                                });
                            });
                        }
                    });

                    self.render_sparkline(ui, forecast);
                });
            });
    }

    fn render_sparkline(&mut self, ui: &mut egui::Ui, forecast: &[ForecastEntry]) {
        if forecast.len() < 2 {
            return;
        }

        if self.cached_for != forecast {
            self.cached_levels = sparkline_levels(forecast);
            self.cached_for = forecast.to_vec();
        }

        let width = ui.min_rect().width().max(CARD_WIDTH * 2.0);
        let (rect, _response) = ui.allocate_exact_size(
            egui::vec2(width, SPARKLINE_HEIGHT),
            egui::Sense::hover(),
        );

        let last = (self.cached_levels.len() - 1) as f32;
        let points: Vec<egui::Pos2> = self
            .cached_levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let x = rect.min.x + (i as f32 / last) * rect.width();
                let y = rect.max.y - level * rect.height();
                egui::pos2(x, y)
            })
            .collect();

        ui.painter().add(egui::Shape::line(
            points,
            egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 170, 80)),
        ));
    }
}

impl Default for ForecastStrip {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize temperatures to `0.0..=1.0`; a flat forecast sits mid-height
pub fn sparkline_levels(forecast: &[ForecastEntry]) -> Vec<f32> {
    let min = forecast.iter().map(|e| e.temperature).fold(f64::INFINITY, f64::min);
    let max = forecast.iter().map(|e| e.temperature).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    forecast
        .iter()
        .map(|e| {
            if span > f64::EPSILON {
                ((e.temperature - min) / span) as f32
            } else {
                0.5
            }
        })
        .collect()
}
