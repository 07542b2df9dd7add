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

//! Dashboard view state.
//!
//! The view state is an immutable value. Every search event is an [`Action`]
//! folded through [`ViewState::reduce`], which returns the next state. Each
//! search carries a [`RequestId`]; completions from anything but the most
//! recently started search are dropped, so overlapping searches can never
//! commit out of order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::api::FetchError;
use crate::layers::DEFAULT_ZOOM;
use crate::model::{CityWeather, CurrentConditions, ForecastEntry};
use crate::tiles::{tile_index, TileIndex, MAX_ZOOM};

/// Identifier of one search, increasing in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues increasing [`RequestId`]s.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: AtomicU64,
}

impl RequestIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> RequestId {
        RequestId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Lifecycle of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing searched yet.
    #[default]
    Idle,
    /// A search is in flight.
    Loading { request: RequestId, city: String },
    /// The latest search completed.
    Loaded,
    /// The latest search failed.
    Errored,
}

/// Search events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SearchStarted { request: RequestId, city: String },
    FetchSucceeded { request: RequestId, weather: CityWeather },
    FetchFailed { request: RequestId, error: FetchError },
}

impl Action {
    #[must_use]
    pub fn request(&self) -> RequestId {
        match self {
            Action::SearchStarted { request, .. }
            | Action::FetchSucceeded { request, .. }
            | Action::FetchFailed { request, .. } => *request,
        }
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<ForecastEntry>,
    /// User-facing error of the latest search.
    pub error: Option<String>,
    /// Most recently started search.
    pub latest: Option<RequestId>,
    /// Zoom level of the overlay tiles.
    pub zoom: u8,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM)
    }
}

impl ViewState {
    #[must_use]
    pub fn new(zoom: u8) -> Self {
        Self {
            phase: Phase::Idle,
            current: None,
            forecast: Vec::new(),
            error: None,
            latest: None,
            zoom: zoom.min(MAX_ZOOM),
        }
    }

    /// Apply `action`, returning the next state.
    ///
    /// A failed search leaves previously loaded conditions and forecast in
    /// place and only sets the error.
    #[must_use]
    pub fn reduce(&self, action: Action) -> ViewState {
        let request = action.request();
        match action {
            Action::SearchStarted { request, city } => {
                if self.latest.is_some_and(|latest| request <= latest) {
                    debug!("Ignoring out-of-order search start {request}");
                    return self.clone();
                }
                ViewState {
                    phase: Phase::Loading { request, city },
                    error: None,
                    latest: Some(request),
                    ..self.clone()
                }
            }
            _ if self.latest != Some(request) => {
                debug!("Dropping stale result for search {request}");
                self.clone()
            }
            Action::FetchSucceeded { weather, .. } => ViewState {
                phase: Phase::Loaded,
                current: Some(weather.current),
                forecast: weather.forecast,
                error: None,
                ..self.clone()
            },
            Action::FetchFailed { error: FetchError::Cancelled, .. } => self.clone(),
            Action::FetchFailed { error, .. } => ViewState {
                phase: Phase::Errored,
                error: Some(error.user_message().to_string()),
                ..self.clone()
            },
        }
    }

    /// Copy of this state at a different overlay zoom.
    #[must_use]
    pub fn with_zoom(&self, zoom: u8) -> ViewState {
        ViewState {
            zoom: zoom.min(MAX_ZOOM),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// City of the in-flight search, if any.
    #[must_use]
    pub fn loading_city(&self) -> Option<&str> {
        match &self.phase {
            Phase::Loading { city, .. } => Some(city),
            _ => None,
        }
    }

    /// Overlay tile for the loaded city.
    #[must_use]
    pub fn tile(&self) -> Option<TileIndex> {
        self.current
            .as_ref()
            .map(|c| tile_index(c.coordinate.lat, c.coordinate.lon, self.zoom))
    }
}
