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

//! Weather data model.
//!
//! Wire structs mirror the OpenWeatherMap 2.5 JSON payloads; the public
//! domain types keep only what the dashboard renders.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::api::FetchError;
use crate::tiles::Coordinate;

/// Number of forecast entries kept (3-hour steps, roughly the next 24 hours).
pub const FORECAST_STEPS: usize = 8;

const HTTP_OK: u16 = 200;
const FORECAST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Status code reported inside the response body.
    pub status: u16,
    /// Temperature in the requested units.
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    pub wind_speed: f64,
    /// Visibility in meters, when reported.
    pub visibility_meters: Option<u32>,
    pub description: String,
    /// Icon code such as `"04d"`.
    pub icon_id: String,
    pub coordinate: Coordinate,
    pub location_name: String,
    /// ISO 3166 country code.
    pub country_code: String,
}

impl CurrentConditions {
    /// Temperature rounded half-up to a whole degree.
    #[must_use]
    pub fn rounded_temperature(&self) -> i64 {
        round_half_up(self.temperature)
    }

    /// Visibility in kilometers.
    #[must_use]
    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility_meters.map(|m| f64::from(m) / 1000.0)
    }

    /// `"Dhaka, BD"` style heading.
    #[must_use]
    pub fn location_label(&self) -> String {
        if self.country_code.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country_code)
        }
    }
}

/// One forecast step.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    /// Forecast time (UTC, as reported by the service).
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub icon_id: String,
}

impl ForecastEntry {
    #[must_use]
    pub fn rounded_temperature(&self) -> i64 {
        round_half_up(self.temperature)
    }

    /// `HH:MM` label for the hourly strip.
    #[must_use]
    pub fn hour_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Result of one completed city search.
#[derive(Debug, Clone, PartialEq)]
pub struct CityWeather {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
}

/// Round to the nearest integer with halves going up (`-2.5` becomes `-2`).
#[allow(clippy::cast_possible_truncation, reason = "temperatures are far inside i64 range")]
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

// `cod` is a number on the weather endpoint and a string on the forecast
// endpoint and on error bodies.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusCode {
    Number(u16),
    Text(String),
}

impl StatusCode {
    fn value(&self) -> Option<u16> {
        match self {
            StatusCode::Number(n) => Some(*n),
            StatusCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    cod: Option<StatusCode>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl Envelope {
    fn status(&self) -> Option<u16> {
        self.cod.as_ref().and_then(StatusCode::value)
    }

    fn message(&self) -> String {
        match &self.message {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WireMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WireWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct WireCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    coord: WireCoord,
    main: WireMain,
    #[serde(default)]
    wind: Option<WireWind>,
    #[serde(default)]
    visibility: Option<u32>,
    #[serde(default)]
    weather: Vec<WireCondition>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: Option<WireSys>,
}

#[derive(Debug, Deserialize)]
struct WireForecastItem {
    #[serde(default)]
    dt: Option<i64>,
    #[serde(default)]
    dt_txt: Option<String>,
    main: WireMain,
    #[serde(default)]
    weather: Vec<WireCondition>,
}

#[derive(Debug, Deserialize)]
struct WireForecast {
    list: Vec<WireForecastItem>,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Parse a `/data/2.5/weather` body.
///
/// Any body whose `cod` is not 200 (including a missing `cod`) is reported
/// as [`FetchError::CityNotFound`].
pub fn parse_current(body: &[u8]) -> Result<CurrentConditions, FetchError> {
    let envelope: Envelope = decode(body)?;
    let status = envelope.status();
    if status != Some(HTTP_OK) {
        log::debug!("weather lookup rejected: cod={status:?} message={:?}", envelope.message());
        return Err(FetchError::CityNotFound);
    }

    let wire: WireCurrent = decode(body)?;
    let (description, icon_id) = wire
        .weather
        .into_iter()
        .next()
        .map(|c| (c.description, c.icon))
        .unwrap_or_default();

    Ok(CurrentConditions {
        status: HTTP_OK,
        temperature: wire.main.temp,
        feels_like: wire.main.feels_like.unwrap_or(wire.main.temp),
        humidity: wire.main.humidity.unwrap_or(0),
        wind_speed: wire.wind.map_or(0.0, |w| w.speed),
        visibility_meters: wire.visibility,
        description,
        icon_id,
        coordinate: Coordinate::new(wire.coord.lat, wire.coord.lon),
        location_name: wire.name,
        country_code: wire.sys.unwrap_or_default().country,
    })
}

/// Parse a `/data/2.5/forecast` body into the next [`FORECAST_STEPS`]
/// entries, ordered by ascending time.
pub fn parse_forecast(body: &[u8]) -> Result<Vec<ForecastEntry>, FetchError> {
    let envelope: Envelope = decode(body)?;
    if let Some(status) = envelope.status() {
        if status != HTTP_OK {
            log::debug!("forecast lookup rejected: cod={status} message={:?}", envelope.message());
            return Err(FetchError::CityNotFound);
        }
    }

    let wire: WireForecast = decode(body)?;
    let mut entries = wire
        .list
        .into_iter()
        .map(|item| {
            let timestamp = forecast_time(&item)?;
            let icon_id = item.weather.into_iter().next().map(|c| c.icon).unwrap_or_default();
            Ok(ForecastEntry {
                timestamp,
                temperature: item.main.temp,
                icon_id,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    entries.sort_by_key(|e| e.timestamp);
    entries.truncate(FORECAST_STEPS);
    Ok(entries)
}

fn forecast_time(item: &WireForecastItem) -> Result<NaiveDateTime, FetchError> {
    if let Some(text) = &item.dt_txt {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, FORECAST_TIME_FORMAT) {
            return Ok(ts);
        }
    }
    item.dt
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| FetchError::Decode("forecast entry without a usable timestamp".to_string()))
}
