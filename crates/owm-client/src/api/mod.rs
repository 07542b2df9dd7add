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

//! OpenWeatherMap REST client.
//!
//! Two read-only lookups keyed by a free-text city name: current conditions
//! and the 5 day / 3 hour forecast. A city search runs them sequentially and
//! the first failure aborts the search. There are no retries.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{self, CityWeather, CurrentConditions, ForecastEntry};

pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TILE_BASE_URL: &str = "https://tile.openweathermap.org";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Stand-in for the API key in redacted URLs.
pub const REDACTED_KEY: &str = "REDACTED";

/// Errors from a weather lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("City not found")]
    CityNotFound,

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("search superseded")]
    Cancelled,
}

impl FetchError {
    /// Message shown to the user.
    ///
    /// Only two categories are surfaced: an unknown city, and everything
    /// else collapsed into a generic failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::CityNotFound => "City not found",
            _ => "Failed to fetch weather",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key
        FetchError::Request(e.without_url().to_string())
    }
}

/// Unit system requested from the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Value of the `units` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    #[must_use]
    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => " K",
        }
    }

    #[must_use]
    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" | "kelvin" => Ok(Units::Standard),
            other => Err(format!("unknown units '{other}' (expected metric, imperial or standard)")),
        }
    }
}

/// Endpoint and credential configuration.
///
/// The API key is always injected by the caller; nothing in this crate
/// carries a default key.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub tile_base_url: String,
    pub icon_base_url: String,
    pub units: Units,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("tile_base_url", &self.tile_base_url)
            .field("icon_base_url", &self.icon_base_url)
            .field("units", &self.units)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration against the public OpenWeatherMap endpoints.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            tile_base_url: DEFAULT_TILE_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            units: Units::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    #[must_use]
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `GET /data/2.5/weather?q={city}&units={units}&appid={key}`
    pub fn weather_url(&self, city: &str) -> Result<Url, FetchError> {
        self.data_url("weather", city)
    }

    /// `GET /data/2.5/forecast?q={city}&units={units}&appid={key}`
    pub fn forecast_url(&self, city: &str) -> Result<Url, FetchError> {
        self.data_url("forecast", city)
    }

    fn data_url(&self, endpoint: &str, city: &str) -> Result<Url, FetchError> {
        let base = format!("{}/data/2.5/{endpoint}", self.api_base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[("q", city), ("units", self.units.as_str()), ("appid", self.api_key.as_str())],
        )
        .map_err(|e| FetchError::Request(format!("invalid API base URL '{}': {e}", self.api_base_url)))
    }

    /// Replace the `appid` value in `url` so it can be logged or printed.
    ///
    /// The query is decoded and re-encoded, so keys that needed
    /// percent-encoding are removed as well.
    #[must_use]
    pub fn redact(&self, url: &str) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            if self.api_key.is_empty() {
                return url.to_string();
            }
            return url.replace(self.api_key.as_str(), REDACTED_KEY);
        };
        if !parsed.query_pairs().any(|(name, _)| name == "appid") {
            return url.to_string();
        }

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(name, value)| {
                let value = if name == "appid" { REDACTED_KEY.to_string() } else { value.into_owned() };
                (name.into_owned(), value)
            })
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
        parsed.into()
    }
}

/// Read-only weather lookups.
///
/// Implemented over HTTP by [`HttpWeatherApi`]; tests substitute in-memory
/// fakes.
pub trait WeatherApi {
    fn current_conditions(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<CurrentConditions, FetchError>> + Send;

    fn forecast(&self, city: &str) -> impl Future<Output = Result<Vec<ForecastEntry>, FetchError>> + Send;
}

/// [`WeatherApi`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpWeatherApi {
    config: ApiConfig,
    http: reqwest::Client,
}

impl HttpWeatherApi {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("skyglass/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Fetch a body. 404 responses are passed through because the service
    /// reports unknown cities there with a JSON body carrying `cod`.
    /// Only 404 bodies are read for `cod`; every other non-2xx status,
    /// including 401 for a rejected key and 429 for rate limiting, is a
    /// [`FetchError::Request`].
    async fn get_body(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", self.config.redact(url.as_str()));
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(FetchError::Request(format!("HTTP {status}")));
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

impl WeatherApi for HttpWeatherApi {
    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        let url = self.config.weather_url(city)?;
        let body = self.get_body(url).await?;
        model::parse_current(&body)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, FetchError> {
        let url = self.config.forecast_url(city)?;
        let body = self.get_body(url).await?;
        model::parse_forecast(&body)
    }
}

/// Look up a city: current conditions first, then the forecast.
///
/// The forecast request is only issued once the current-conditions lookup
/// succeeded.
pub async fn fetch_city<A>(api: &A, city: &str) -> Result<CityWeather, FetchError>
where
    A: WeatherApi + Sync,
{
    info!("Fetching weather for '{city}'");
    let current = api.current_conditions(city).await?;
    let forecast = api.forecast(city).await?;
    info!(
        "Weather for {} loaded ({} forecast steps)",
        current.location_label(),
        forecast.len()
    );
    Ok(CityWeather { current, forecast })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tiles::Coordinate;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    pub(crate) fn sample_current(name: &str) -> CurrentConditions {
        CurrentConditions {
            status: 200,
            temperature: 31.2,
            feels_like: 36.0,
            humidity: 70,
            wind_speed: 3.1,
            visibility_meters: Some(4000),
            description: "haze".to_string(),
            icon_id: "50d".to_string(),
            coordinate: Coordinate::new(23.8103, 90.4125),
            location_name: name.to_string(),
            country_code: "BD".to_string(),
        }
    }

    pub(crate) fn sample_forecast(steps: u32) -> Vec<ForecastEntry> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        (0..steps)
            .map(|i| ForecastEntry {
                timestamp: start + chrono::Duration::hours(3 * i64::from(i)),
                temperature: 28.0 + f64::from(i),
                icon_id: "01d".to_string(),
            })
            .collect()
    }

    /// In-memory API that records which lookups were made.
    pub(crate) struct FakeApi {
        pub(crate) known: Vec<String>,
        pub(crate) forecast_error: Option<FetchError>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub(crate) fn knowing(cities: &[&str]) -> Self {
            Self {
                known: cities.iter().map(|c| (*c).to_string()).collect(),
                forecast_error: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl WeatherApi for FakeApi {
        async fn current_conditions(&self, city: &str) -> Result<CurrentConditions, FetchError> {
            self.calls.lock().unwrap().push(format!("weather:{city}"));
            if self.known.iter().any(|c| c == city) {
                Ok(sample_current(city))
            } else {
                Err(FetchError::CityNotFound)
            }
        }

        async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, FetchError> {
            self.calls.lock().unwrap().push(format!("forecast:{city}"));
            match &self.forecast_error {
                Some(e) => Err(e.clone()),
                None => Ok(sample_forecast(8)),
            }
        }
    }

    #[test]
    fn test_weather_url() {
        let config = ApiConfig::new("secret");
        let url = config.weather_url("Dhaka").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?q=Dhaka&units=metric&appid=secret"
        );
    }

    #[test]
    fn test_forecast_url_encodes_city() {
        let config = ApiConfig::new("secret").with_units(Units::Imperial);
        let url = config.forecast_url("São Paulo").unwrap();
        assert!(url.as_str().starts_with("https://api.openweathermap.org/data/2.5/forecast?q=S%C3%A3o+Paulo"));
        assert!(url.as_str().contains("units=imperial"));
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let mut config = ApiConfig::new("k");
        config.api_base_url = "http://localhost:8080/".to_string();
        let url = config.weather_url("Oslo").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/data/2.5/weather?q=Oslo&units=metric&appid=k");
    }

    #[test]
    fn test_redact_and_debug_hide_key() {
        let config = ApiConfig::new("abc123");
        let url = config.weather_url("Paris").unwrap();
        assert!(!config.redact(url.as_str()).contains("abc123"));
        assert!(!format!("{config:?}").contains("abc123"));
    }

    #[test]
    fn test_redact_encoded_key() {
        let config = ApiConfig::new("k+y&z 1");
        let url = config.weather_url("Paris").unwrap();
        assert!(url.as_str().contains("appid=k%2By%26z+1"));

        let redacted = config.redact(url.as_str());
        assert_eq!(
            redacted,
            "https://api.openweathermap.org/data/2.5/weather?q=Paris&units=metric&appid=REDACTED"
        );
    }

    #[test]
    fn test_redact_leaves_keyless_urls() {
        let config = ApiConfig::new("abc123");
        let icon = config.icon_url("01d");
        assert_eq!(config.redact(&icon), icon);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(FetchError::CityNotFound.user_message(), "City not found");
        assert_eq!(FetchError::Request("dns".into()).user_message(), "Failed to fetch weather");
        assert_eq!(FetchError::Decode("eof".into()).user_message(), "Failed to fetch weather");
    }

    #[test]
    fn test_units_parse() {
        assert_eq!("Metric".parse::<Units>(), Ok(Units::Metric));
        assert_eq!("kelvin".parse::<Units>(), Ok(Units::Standard));
        assert!("furlongs".parse::<Units>().is_err());
        assert_eq!(Units::Imperial.temperature_suffix(), "°F");
    }

    #[tokio::test]
    async fn test_fetch_city_is_sequential() {
        let api = FakeApi::knowing(&["Dhaka"]);
        let weather = fetch_city(&api, "Dhaka").await.unwrap();

        assert_eq!(weather.current.location_name, "Dhaka");
        assert_eq!(weather.forecast.len(), 8);
        assert_eq!(*api.calls.lock().unwrap(), vec!["weather:Dhaka", "forecast:Dhaka"]);
    }

    #[tokio::test]
    async fn test_unknown_city_skips_forecast() {
        let api = FakeApi::knowing(&["Dhaka"]);
        let result = fetch_city(&api, "Atlantis").await;

        assert_eq!(result, Err(FetchError::CityNotFound));
        assert_eq!(*api.calls.lock().unwrap(), vec!["weather:Atlantis"]);
    }

    /// Serve canned HTTP responses on a local port. Each route is matched
    /// by path prefix against the request line.
    async fn serve(routes: Vec<(&'static str, &'static str, String)>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("");

                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| path.starts_with(prefix))
                    .map_or(("404 Not Found", String::new()), |(_, status, body)| (*status, body.clone()));
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}")
    }

    fn local_api(base_url: String) -> HttpWeatherApi {
        let mut config = ApiConfig::new("test-key");
        config.api_base_url = base_url;
        HttpWeatherApi::new(config).unwrap()
    }

    fn current_body(name: &str) -> String {
        serde_json::json!({
            "coord": { "lon": 90.4125, "lat": 23.8103 },
            "weather": [{ "description": "haze", "icon": "50d" }],
            "main": { "temp": 31.2, "feels_like": 36.0, "humidity": 70 },
            "visibility": 4000,
            "wind": { "speed": 3.1 },
            "name": name,
            "sys": { "country": "BD" },
            "cod": 200
        })
        .to_string()
    }

    fn forecast_body() -> String {
        let list: Vec<serde_json::Value> = (0..10)
            .map(|i| {
                serde_json::json!({
                    "dt_txt": format!("2024-06-0{} 12:00:00", 9 - i % 9),
                    "main": { "temp": 25.0 + f64::from(i) },
                    "weather": [{ "icon": "02d" }]
                })
            })
            .collect();
        serde_json::json!({ "cod": "200", "cnt": 10, "list": list }).to_string()
    }

    #[tokio::test]
    async fn test_http_not_found_body_is_city_not_found() {
        let base = serve(vec![(
            "/data/2.5/weather",
            "404 Not Found",
            r#"{"cod":"404","message":"city not found"}"#.to_string(),
        )])
        .await;

        let result = local_api(base).current_conditions("Atlantis").await;
        assert_eq!(result, Err(FetchError::CityNotFound));
    }

    #[tokio::test]
    async fn test_http_server_error_is_request_failure() {
        let base = serve(vec![("/data/2.5/weather", "500 Internal Server Error", "oops".to_string())]).await;

        let result = local_api(base).current_conditions("Dhaka").await;
        let Err(FetchError::Request(message)) = &result else {
            panic!("expected a request failure, got {result:?}");
        };
        assert!(message.contains("500"));
        assert!(!message.contains("test-key"));
    }

    #[tokio::test]
    async fn test_http_unauthorized_is_request_failure() {
        let base = serve(vec![(
            "/data/2.5/weather",
            "401 Unauthorized",
            r#"{"cod":401,"message":"Invalid API key"}"#.to_string(),
        )])
        .await;

        let result = local_api(base).current_conditions("Dhaka").await;
        assert!(matches!(result, Err(FetchError::Request(_))));
        assert_eq!(result.unwrap_err().user_message(), "Failed to fetch weather");
    }

    #[tokio::test]
    async fn test_http_fetch_city() {
        let base = serve(vec![
            ("/data/2.5/weather", "200 OK", current_body("Dhaka")),
            ("/data/2.5/forecast", "200 OK", forecast_body()),
        ])
        .await;

        let weather = fetch_city(&local_api(base), "Dhaka").await.unwrap();
        assert_eq!(weather.current.location_name, "Dhaka");
        assert_eq!(weather.current.humidity, 70);
        assert_eq!(weather.forecast.len(), 8);
        assert!(weather.forecast.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_forecast_failure_aborts_search() {
        let mut api = FakeApi::knowing(&["Dhaka"]);
        api.forecast_error = Some(FetchError::Request("timeout".into()));
        let result = fetch_city(&api, "Dhaka").await;
        assert_eq!(result, Err(FetchError::Request("timeout".into())));
    }
}
