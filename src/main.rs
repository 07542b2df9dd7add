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

mod app;
mod config;
mod image_cache;
mod report;
mod search;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use owm_client::{ApiConfig, Units, WeatherLayer};

use app::SkyGlassApp;
use config::{ApiKeySource, AppConfig, API_KEY_ENV};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Weather dashboard: current conditions, hourly forecast and map overlays
#[derive(Parser, Debug)]
#[command(name = "skyglass", version, about)]
struct Args {
    /// City to look up on startup (defaults to the configured city)
    #[arg(short, long)]
    city: Option<String>,

    /// Overlay tile zoom level
    #[arg(short, long)]
    zoom: Option<u8>,

    /// Unit system: metric, imperial or standard
    #[arg(short, long)]
    units: Option<Units>,

    /// OpenWeatherMap API key (overrides the environment and config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Print the dashboard to stdout instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Print the configuration file path and exit
    #[arg(long)]
    config_path: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.config_path {
        return match AppConfig::get_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Could not determine config path: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    if let Some(zoom) = args.zoom {
        config.zoom = zoom;
    }
    if let Some(units) = args.units {
        config.units = units;
    }

    let Some((api_key, key_source)) = config.resolve_api_key(args.api_key.as_deref()) else {
        error!(
            "No OpenWeatherMap API key: pass --api-key, set {} or add openweathermap_api_key to {}",
            API_KEY_ENV,
            AppConfig::get_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the config file".to_string())
        );
        return ExitCode::FAILURE;
    };

    let api_config = config.api_config(api_key);
    let city = args.city.unwrap_or_else(|| config.default_city.clone());

    if args.headless {
        let layers: Vec<WeatherLayer> = WeatherLayer::ALL
            .into_iter()
            .filter(|layer| config.is_layer_visible(*layer))
            .collect();
        return report::run(api_config, &city, config.zoom, &layers);
    }

    run_window(config, api_config, key_source, city)
}

fn run_window(config: AppConfig, api_config: ApiConfig, key_source: ApiKeySource, city: String) -> ExitCode {
    info!("Starting SkyGlass...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("skyglass-io")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title("SkyGlass"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "SkyGlass",
        options,
        Box::new(move |cc| {
            let app = SkyGlassApp::new(cc, config, api_config, key_source, runtime, city)?;
            Ok(Box::new(app))
        }),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Window error: {}", e);
            ExitCode::FAILURE
        }
    }
}
