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

//! Plain-text dashboard for `--headless` runs.

use std::fmt::Write as _;
use std::process::ExitCode;

use log::error;
use owm_client::{fetch_city, tile_index, ApiConfig, CityWeather, HttpWeatherApi, WeatherLayer};

/// Fetch `city` once and print the dashboard to stdout.
pub fn run(api_config: ApiConfig, city: &str, zoom: u8, layers: &[WeatherLayer]) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let api = match HttpWeatherApi::new(api_config.clone()) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(fetch_city(&api, city)) {
        Ok(weather) => {
            print!("{}", render(&weather, &api_config, zoom, layers));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Search for '{}' failed: {}", city, e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Render current conditions, forecast and overlay URLs as text
pub fn render(weather: &CityWeather, config: &ApiConfig, zoom: u8, layers: &[WeatherLayer]) -> String {
    let current = &weather.current;
    let temp_unit = config.units.temperature_suffix();
    let mut out = String::new();

    let _ = writeln!(out, "{}  ({})", current.location_label(), current.coordinate);
    let _ = writeln!(out, "{}{}  {}", current.rounded_temperature(), temp_unit, current.description);
    let _ = writeln!(out, "  Wind:       {} {}", current.wind_speed, config.units.speed_suffix());
    let _ = writeln!(out, "  Humidity:   {}%", current.humidity);
    let _ = writeln!(out, "  Feels like: {}{}", current.feels_like, temp_unit);
    match current.visibility_km() {
        Some(km) => {
            let _ = writeln!(out, "  Visibility: {km:.1} km");
        }
        None => {
            let _ = writeln!(out, "  Visibility: n/a");
        }
    }

    let _ = writeln!(out, "\nHourly forecast");
    if weather.forecast.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for entry in &weather.forecast {
        let _ = writeln!(
            out,
            "  {}  {:>4}{}  {}",
            entry.hour_label(),
            entry.rounded_temperature(),
            temp_unit,
            entry.icon_id
        );
    }

    if !layers.is_empty() {
        let tile = tile_index(current.coordinate.lat, current.coordinate.lon, zoom);
        let _ = writeln!(out, "\nMap overlays (tile {tile})");
        for layer in layers {
            let url = config.redact(&config.overlay_url(*layer, tile));
            let _ = writeln!(out, "  {:<14} {}", format!("{}:", layer.display_name()), url);
        }
    }

    out
}
