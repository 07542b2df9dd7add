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

use owm_client::{ApiConfig, TileIndex, WeatherLayer};

use super::{remote_image, LABEL_COLOR};
use crate::image_cache::ImageCache;

const TILE_DISPLAY_SIZE: f32 = 256.0;

/// Weather map overlay cards, one per visible layer, all showing the tile
/// that contains the loaded city
pub struct OverlayPanel;

impl OverlayPanel {
    pub fn render(
        ui: &mut egui::Ui,
        tile: TileIndex,
        layers: &[WeatherLayer],
        api: &ApiConfig,
        overlays: Option<&ImageCache>,
    ) {
        if layers.is_empty() {
            ui.label(egui::RichText::new("All map layers are hidden").color(LABEL_COLOR));
            return;
        }

        let center = tile.center();
        ui.label(egui::RichText::new(format!("Tile {tile} · centered on {center}"))
            .color(LABEL_COLOR)
            .size(10.0)
            .monospace());

        ui.horizontal_wrapped(|ui| {
            for layer in layers {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(format!("{} {}", layer.emoji(), layer.display_name()))
                            .size(13.0)
                            .strong());
                        let url = api.overlay_url(*layer, tile);
                        let cache_key = api.redact(&url);
                        remote_image(
                            ui,
                            overlays,
                            &url,
                            &cache_key,
                            egui::vec2(TILE_DISPLAY_SIZE, TILE_DISPLAY_SIZE),
                        );
                    });
                });
            }
        });
    }
}
