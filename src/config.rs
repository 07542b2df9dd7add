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
//! Configuration is stored as TOML in the platform config directory. The
//! OpenWeatherMap API key may live here, but the `OPENWEATHERMAP_API_KEY`
//! environment variable always takes precedence.

use std::time::Duration;

use owm_client::{ApiConfig, Units, WeatherLayer, DEFAULT_ZOOM};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "skyglass";
const CONFIG_NAME: &str = "config";

/// Environment variable consulted before the config file for the API key
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

/// Where the active API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    CommandLine,
    Environment,
    ConfigFile,
}

impl ApiKeySource {
    pub fn describe(&self) -> &'static str {
        match self {
            ApiKeySource::CommandLine => "command line",
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::ConfigFile => "config file",
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// City searched on startup
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Overlay tile zoom level
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Unit system: "metric", "imperial" or "standard"
    #[serde(default)]
    pub units: Units,

    /// OpenWeatherMap API key (optional, env var takes precedence)
    #[serde(default)]
    pub openweathermap_api_key: Option<String>,

    /// Show cloud coverage overlay
    #[serde(default = "default_true")]
    pub show_clouds: bool,

    /// Show precipitation overlay
    #[serde(default = "default_true")]
    pub show_precipitation: bool,

    /// Show temperature overlay
    #[serde(default = "default_true")]
    pub show_temperature: bool,

    /// Per-request timeout in seconds (0 disables)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_city() -> String {
    "Dhaka".to_string()
}

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            default_city: default_city(),
            zoom: default_zoom(),
            units: Units::default(),
            openweathermap_api_key: None,
            show_clouds: true,
            show_precipitation: true,
            show_temperature: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating the default file on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve the API key: command line, then environment, then config file
    pub fn resolve_api_key(&self, cli_key: Option<&str>) -> Option<(String, ApiKeySource)> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        resolve_api_key_from(cli_key, env_key.as_deref(), self.openweathermap_api_key.as_deref())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Build the client configuration around a resolved key
    pub fn api_config(&self, api_key: String) -> ApiConfig {
        ApiConfig::new(api_key)
            .with_units(self.units)
            .with_timeout(self.request_timeout())
    }

    pub fn is_layer_visible(&self, layer: WeatherLayer) -> bool {
        match layer {
            WeatherLayer::Clouds => self.show_clouds,
            WeatherLayer::Precipitation => self.show_precipitation,
            WeatherLayer::Temperature => self.show_temperature,
        }
    }

    pub fn layer_visibility_mut(&mut self, layer: WeatherLayer) -> &mut bool {
        match layer {
            WeatherLayer::Clouds => &mut self.show_clouds,
            WeatherLayer::Precipitation => &mut self.show_precipitation,
            WeatherLayer::Temperature => &mut self.show_temperature,
        }
    }
}

fn resolve_api_key_from(
    cli_key: Option<&str>,
    env_key: Option<&str>,
    config_key: Option<&str>,
) -> Option<(String, ApiKeySource)> {
    let candidates = [
        (cli_key, ApiKeySource::CommandLine),
        (env_key, ApiKeySource::Environment),
        (config_key, ApiKeySource::ConfigFile),
    ];
    candidates.into_iter().find_map(|(key, source)| {
        key.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| (k.to_string(), source))
    })
}
