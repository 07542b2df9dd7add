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

//! OpenWeatherMap client library for city weather dashboards.
//!
//! This library has no UI dependencies. It is organised in layers that can be
//! used independently:
//!
//! - **Tiles**: Web Mercator conversion from coordinates to slippy-map tile
//!   indices
//! - **Model**: parsing of the current-weather and forecast payloads
//! - **API**: async HTTP lookups keyed by city name
//! - **Layers**: overlay tile and icon URLs
//! - **State**: an immutable dashboard view state driven by search actions
//!
//! # Quick Start
//!
//! ```no_run
//! use owm_client::{fetch_city, ApiConfig, HttpWeatherApi, WeatherLayer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::new(std::env::var("OPENWEATHERMAP_API_KEY")?);
//!     let api = HttpWeatherApi::new(config.clone())?;
//!
//!     let weather = fetch_city(&api, "Dhaka").await?;
//!     println!("{}: {}°C", weather.current.location_label(), weather.current.rounded_temperature());
//!
//!     let c = weather.current.coordinate;
//!     let tile = owm_client::tile_index(c.lat, c.lon, 6);
//!     println!("{}", config.overlay_url(WeatherLayer::Clouds, tile));
//!     Ok(())
//! }
//! ```
//!
//! ## Tile math only
//!
//! ```
//! use owm_client::tiles::{tile_index, TileIndex};
//!
//! assert_eq!(tile_index(23.8103, 90.4125, 6), TileIndex::new(48, 27, 6));
//! ```

pub mod api;
pub mod layers;
pub mod model;
pub mod state;
pub mod tiles;

pub use api::{fetch_city, ApiConfig, FetchError, HttpWeatherApi, Units, WeatherApi};
pub use layers::{WeatherLayer, DEFAULT_ZOOM};
pub use model::{CityWeather, CurrentConditions, ForecastEntry, FORECAST_STEPS};
pub use state::{Action, Phase, RequestId, RequestIds, ViewState};
pub use tiles::{tile_index, try_tile_index, Coordinate, TileError, TileIndex};
