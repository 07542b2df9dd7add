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

//! Weather map overlay layers and icon images.

use reqwest::Url;

use crate::api::ApiConfig;
use crate::tiles::TileIndex;

/// Zoom used for the overlay tiles (country/city scale).
pub const DEFAULT_ZOOM: u8 = 6;

/// Available weather overlay layers from OpenWeatherMap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherLayer {
    Clouds,
    Precipitation,
    Temperature,
}

impl WeatherLayer {
    /// All layers in display order
    pub const ALL: [WeatherLayer; 3] = [
        WeatherLayer::Clouds,
        WeatherLayer::Precipitation,
        WeatherLayer::Temperature,
    ];

    /// Get the OpenWeatherMap layer name for URL construction
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherLayer::Clouds => "clouds_new",
            WeatherLayer::Precipitation => "precipitation_new",
            WeatherLayer::Temperature => "temp_new",
        }
    }

    /// Get human-readable display name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            WeatherLayer::Clouds => "Clouds",
            WeatherLayer::Precipitation => "Precipitation",
            WeatherLayer::Temperature => "Temperature",
        }
    }

    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            WeatherLayer::Clouds => "☁",
            WeatherLayer::Precipitation => "🌧",
            WeatherLayer::Temperature => "🌡",
        }
    }
}

impl ApiConfig {
    /// `GET /map/{layer}/{zoom}/{x}/{y}.png?appid={key}`
    #[must_use]
    pub fn overlay_url(&self, layer: WeatherLayer, tile: TileIndex) -> String {
        let path = format!(
            "{}/map/{}/{}/{}/{}.png",
            self.tile_base_url.trim_end_matches('/'),
            layer.as_str(),
            tile.zoom,
            tile.x,
            tile.y,
        );
        match Url::parse_with_params(&path, &[("appid", self.api_key.as_str())]) {
            Ok(url) => url.into(),
            // Unparseable base URL; the download reports the failure
            Err(_) => format!("{path}?appid={}", self.api_key),
        }
    }

    /// `GET /img/wn/{icon}.png`
    #[must_use]
    pub fn icon_url(&self, icon: &str) -> String {
        format!("{}/img/wn/{icon}.png", self.icon_base_url.trim_end_matches('/'))
    }

    /// Double-resolution icon, used for the large current-conditions icon.
    #[must_use]
    pub fn icon_url_2x(&self, icon: &str) -> String {
        format!("{}/img/wn/{icon}@2x.png", self.icon_base_url.trim_end_matches('/'))
    }
}
