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

//! Main dashboard window.

use std::sync::Arc;

use log::{info, warn};
use owm_client::{ApiConfig, HttpWeatherApi, Phase, ViewState, WeatherLayer};
use tokio::runtime::Runtime;

use crate::config::{ApiKeySource, AppConfig};
use crate::image_cache::{ImageCache, ICON_MAX_AGE, OVERLAY_MAX_AGE};
use crate::search::{Notify, SearchController};
use crate::ui::{CurrentPanel, ForecastStrip, OverlayPanel, ACCENT_COLOR, ERROR_COLOR, LABEL_COLOR};

const MIN_ZOOM: u8 = 2;
const MAX_ZOOM: u8 = 10;

pub struct SkyGlassApp {
    config: AppConfig,
    api_config: ApiConfig,
    key_source: ApiKeySource,
    search: SearchController<HttpWeatherApi>,
    state: ViewState,
    query: String,
    icons: Option<ImageCache>,
    overlays: Option<ImageCache>,
    forecast_strip: ForecastStrip,
    show_settings: bool,
    // Dropped last: the search controller and image caches spawn onto it
    _runtime: Runtime,
}

impl SkyGlassApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        api_config: ApiConfig,
        key_source: ApiKeySource,
        runtime: Runtime,
        initial_city: String,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let ctx = cc.egui_ctx.clone();
        let notify: Notify = Arc::new(move || ctx.request_repaint());

        let api = HttpWeatherApi::new(api_config.clone())?;
        let mut search = SearchController::new(api, runtime.handle().clone(), notify);

        let icons = ImageCache::new("icons", ICON_MAX_AGE, runtime.handle().clone())
            .map_err(|e| warn!("Icon cache unavailable: {}", e))
            .ok();
        let overlays = ImageCache::new("overlays", OVERLAY_MAX_AGE, runtime.handle().clone())
            .map_err(|e| warn!("Overlay cache unavailable: {}", e))
            .ok();

        info!("Using OpenWeatherMap API key from {}", key_source.describe());

        // Initial load
        search.submit(&initial_city);

        Ok(Self {
            state: ViewState::new(config.zoom),
            config,
            api_config,
            key_source,
            search,
            query: initial_city,
            icons,
            overlays,
            forecast_strip: ForecastStrip::new(),
            show_settings: false,
            _runtime: runtime,
        })
    }

    fn visible_layers(&self) -> Vec<WeatherLayer> {
        WeatherLayer::ALL
            .into_iter()
            .filter(|layer| self.config.is_layer_visible(*layer))
            .collect()
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!("Failed to save configuration: {}", e);
        }
    }

    fn draw_search_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("◈ SKYGLASS")
                .color(ACCENT_COLOR)
                .strong());

            let response = ui.add(egui::TextEdit::singleline(&mut self.query)
                .hint_text("Enter city")
                .desired_width(240.0));
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if ui.button("Search").clicked() || enter {
                self.search.submit(&self.query);
            }

            if let Some(city) = self.state.loading_city() {
                ui.spinner();
                ui.label(egui::RichText::new(format!("Loading {city}…")).color(LABEL_COLOR));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙").on_hover_text("Settings").clicked() {
                    self.show_settings = !self.show_settings;
                }
            });
        });

        if let Some(error) = &self.state.error {
            ui.label(egui::RichText::new(error).color(ERROR_COLOR));
        }
    }

    fn draw_dashboard(&mut self, ui: &mut egui::Ui) {
        let Some(current) = self.state.current.clone() else {
            if !self.state.is_loading() {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Search for a city to see its weather").color(LABEL_COLOR));
                });
            }
            return;
        };

        ui.horizontal_top(|ui| {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_min_width(280.0);
                CurrentPanel::render(ui, &current, &self.api_config, self.icons.as_ref());
            });

            egui::Frame::group(ui.style()).show(ui, |ui| {
                self.forecast_strip.render(ui, &self.state.forecast, &self.api_config, self.icons.as_ref());
            });
        });

        ui.add_space(12.0);

        if let Some(tile) = self.state.tile() {
            let layers = self.visible_layers();
            OverlayPanel::render(ui, tile, &layers, &self.api_config, self.overlays.as_ref());
        }
    }

    fn draw_settings(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut changed = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                let mut zoom = self.state.zoom;
                if ui.add(egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM).text("Map zoom")).changed() {
                    self.state = self.state.with_zoom(zoom);
                    self.config.zoom = zoom;
                    changed = true;
                }

                ui.separator();
                for layer in WeatherLayer::ALL {
                    let visible = self.config.layer_visibility_mut(layer);
                    if ui.checkbox(visible, layer.display_name()).changed() {
                        changed = true;
                    }
                }

                ui.separator();
                ui.label(egui::RichText::new(format!("API key: {}", self.key_source.describe()))
                    .color(LABEL_COLOR)
                    .size(11.0));
                ui.label(egui::RichText::new(format!("Units: {}", self.api_config.units))
                    .color(LABEL_COLOR)
                    .size(11.0));
                if let Ok(path) = AppConfig::get_config_path() {
                    ui.label(egui::RichText::new(path.display().to_string())
                        .color(LABEL_COLOR)
                        .size(10.0)
                        .monospace());
                }

                if ui.button("Retry failed images").clicked() {
                    for cache in [self.icons.as_ref(), self.overlays.as_ref()].into_iter().flatten() {
                        cache.retry_failed();
                    }
                }
            });

        self.show_settings = open;
        if changed {
            self.save_config();
        }
    }
}

impl eframe::App for SkyGlassApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let next = self.search.drain(&self.state);
        if search_completed(&self.state, &next) {
            if let Some(overlays) = &self.overlays {
                overlays.invalidate();
            }
        }
        self.state = next;

        egui::TopBottomPanel::top("search_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.draw_search_bar(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_dashboard(ui);
            });
        });

        if self.show_settings {
            self.draw_settings(ctx);
        }
    }
}

/// True when `next` holds the result of a search that `previous` did not
fn search_completed(previous: &ViewState, next: &ViewState) -> bool {
    next.phase == Phase::Loaded && (previous.phase != Phase::Loaded || previous.latest != next.latest)
}
