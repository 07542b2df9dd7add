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

//! City search controller.
//!
//! Runs each search as a background task on the shared tokio runtime and
//! hands the outcome back to the UI thread as [`Action`]s. Starting a new
//! search cancels the one in flight; the view-state reducer additionally
//! drops any result that is not from the latest search.

use std::sync::Arc;

use log::{debug, info, warn};
use owm_client::{fetch_city, Action, FetchError, RequestId, RequestIds, ViewState, WeatherApi};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Callback used to wake the UI when a search finishes
pub type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct SearchController<A> {
    api: Arc<A>,
    runtime: Handle,
    ids: RequestIds,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Cancellation token of the search in flight
    in_flight: Option<CancellationToken>,
    notify: Notify,
}

impl<A> std::fmt::Debug for SearchController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("ids", &self.ids)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl<A> SearchController<A>
where
    A: WeatherApi + Send + Sync + 'static,
{
    pub fn new(api: A, runtime: Handle, notify: Notify) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            runtime,
            ids: RequestIds::new(),
            action_tx,
            action_rx,
            in_flight: None,
            notify,
        }
    }

    /// Start a search for `city`. Blank input is ignored.
    pub fn submit(&mut self, city: &str) -> Option<RequestId> {
        let city = city.trim();
        if city.is_empty() {
            debug!("Ignoring empty search");
            return None;
        }

        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }

        let request = self.ids.next();
        let cancel_token = CancellationToken::new();
        self.in_flight = Some(cancel_token.clone());

        info!("Starting search {} for '{}'", request, city);
        self.send(Action::SearchStarted {
            request,
            city: city.to_string(),
        });

        let api = Arc::clone(&self.api);
        let action_tx = self.action_tx.clone();
        let notify = Arc::clone(&self.notify);
        let city = city.to_string();

        self.runtime.spawn(async move {
            let action = tokio::select! {
                () = cancel_token.cancelled() => {
                    debug!("Search {} for '{}' superseded", request, city);
                    Action::FetchFailed { request, error: FetchError::Cancelled }
                }
                result = fetch_city(api.as_ref(), &city) => match result {
                    Ok(weather) => Action::FetchSucceeded { request, weather },
                    Err(error) => {
                        warn!("Search {} for '{}' failed: {}", request, city, error);
                        Action::FetchFailed { request, error }
                    }
                },
            };

            if action_tx.send(action).is_ok() {
                notify();
            }
        });

        Some(request)
    }

    /// Fold every pending action into `state`.
    pub fn drain(&mut self, state: &ViewState) -> ViewState {
        let mut next = state.clone();
        while let Ok(action) = self.action_rx.try_recv() {
            next = next.reduce(action);
        }
        if !next.is_loading() {
            self.in_flight = None;
        }
        next
    }

    fn send(&self, action: Action) {
        // The receiver lives in `self`, so the channel cannot be closed here
        let _ = self.action_tx.send(action);
        (self.notify)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use owm_client::{Coordinate, CurrentConditions, ForecastEntry, Phase};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers after a per-city delay; unknown cities are not found.
    struct SlowApi;

    fn delay_for(city: &str) -> Duration {
        match city {
            "Slowtown" => Duration::from_millis(200),
            _ => Duration::from_millis(5),
        }
    }

    impl WeatherApi for SlowApi {
        async fn current_conditions(&self, city: &str) -> Result<CurrentConditions, FetchError> {
            tokio::time::sleep(delay_for(city)).await;
            if city == "Atlantis" {
                return Err(FetchError::CityNotFound);
            }
            Ok(CurrentConditions {
                status: 200,
                temperature: 12.4,
                feels_like: 11.0,
                humidity: 80,
                wind_speed: 5.5,
                visibility_meters: Some(10_000),
                description: "light rain".to_string(),
                icon_id: "10d".to_string(),
                coordinate: Coordinate::new(59.91, 10.75),
                location_name: city.to_string(),
                country_code: "NO".to_string(),
            })
        }

        async fn forecast(&self, _city: &str) -> Result<Vec<ForecastEntry>, FetchError> {
            let timestamp = NaiveDate::from_ymd_opt(2024, 6, 1)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap();
            Ok(vec![ForecastEntry {
                timestamp,
                temperature: 13.0,
                icon_id: "10d".to_string(),
            }])
        }
    }

    fn controller() -> (SearchController<SlowApi>, Arc<AtomicUsize>) {
        let wakeups = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakeups);
        let notify: Notify = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (SearchController::new(SlowApi, Handle::current(), notify), wakeups)
    }

    async fn settle(search: &mut SearchController<SlowApi>, mut state: ViewState) -> ViewState {
        for _ in 0..200 {
            state = search.drain(&state);
            if !state.is_loading() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("search did not finish");
    }

    #[tokio::test]
    async fn test_search_loads_city() {
        let (mut search, wakeups) = controller();
        assert!(search.submit("  Oslo ").is_some());

        let state = settle(&mut search, ViewState::default()).await;
        assert_eq!(state.phase, Phase::Loaded);
        assert_eq!(state.current.map(|c| c.location_name), Some("Oslo".to_string()));
        assert_eq!(state.forecast.len(), 1);
        assert!(wakeups.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_blank_search_is_ignored() {
        let (mut search, _) = controller();
        assert!(search.submit("   ").is_none());
        let state = search.drain(&ViewState::default());
        assert_eq!(state.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_latest_search_wins() {
        let (mut search, _) = controller();
        search.submit("Slowtown");
        search.submit("Oslo");

        let state = settle(&mut search, ViewState::default()).await;
        assert_eq!(state.current.as_ref().map(|c| c.location_name.as_str()), Some("Oslo"));

        // The superseded search never overwrites the result
        tokio::time::sleep(Duration::from_millis(250)).await;
        let state = search.drain(&state);
        assert_eq!(state.current.map(|c| c.location_name), Some("Oslo".to_string()));
    }

    #[tokio::test]
    async fn test_not_found_keeps_previous_city() {
        let (mut search, _) = controller();
        search.submit("Oslo");
        let loaded = settle(&mut search, ViewState::default()).await;

        search.submit("Atlantis");
        let failed = settle(&mut search, loaded.clone()).await;

        assert_eq!(failed.phase, Phase::Errored);
        assert_eq!(failed.error.as_deref(), Some("City not found"));
        assert_eq!(failed.current, loaded.current);
        assert_eq!(failed.forecast, loaded.forecast);
    }
}
