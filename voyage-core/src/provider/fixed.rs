//! Deterministic provider for offline use and tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::ProviderError,
    geo::Coordinate,
    model::{DailyForecast, WeatherCondition},
};

use super::ForecastProvider;

/// A moderate day at sea: no alert thresholds breached, adverse current.
pub fn calm_day() -> DailyForecast {
    DailyForecast {
        temperature_c: 22.0,
        wind_speed_mps: 8.5,
        wind_direction_deg: 245.0,
        wave_height_m: 2.1,
        wave_period_s: 6.5,
        wave_direction_deg: 230.0,
        current_speed_mps: 0.8,
        current_direction_deg: 180.0,
        visibility_km: 15.0,
        pressure_hpa: 1013.0,
        humidity_pct: 75.0,
        precipitation_mm: 0.0,
        condition: WeatherCondition::PartlyCloudy,
    }
}

/// Serves the same records on every call, optionally after queued failures
/// or an artificial delay.
#[derive(Debug)]
pub struct StaticProvider {
    days: Vec<DailyForecast>,
    failures: Mutex<VecDeque<ProviderError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(days: Vec<DailyForecast>) -> Self {
        Self {
            days,
            failures: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Ten days building from calm weather towards a storm on the last days.
    pub fn sample() -> Self {
        let days = (0..10u8)
            .map(|day| {
                let d = f64::from(day);
                DailyForecast {
                    temperature_c: 22.0 + (d * 0.5).sin() * 3.0,
                    wind_speed_mps: 8.5 + d * 1.5,
                    wave_height_m: 2.1 + d * 0.2,
                    visibility_km: 15.0 - d,
                    condition: match day {
                        0..=3 => WeatherCondition::PartlyCloudy,
                        4..=6 => WeatherCondition::Cloudy,
                        _ => WeatherCondition::Rain,
                    },
                    ..calm_day()
                }
            })
            .collect();

        Self::new(days)
    }

    /// Queue errors returned, in order, by the next calls.
    pub fn failing_with(mut self, errors: impl IntoIterator<Item = ProviderError>) -> Self {
        self.failures = Mutex::new(errors.into_iter().collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `daily_forecast` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for StaticProvider {
    async fn daily_forecast(
        &self,
        _at: Coordinate,
        days: u8,
    ) -> Result<Vec<DailyForecast>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }

        Ok(self.days.iter().take(usize::from(days)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Coordinate {
        Coordinate::new(59.44, 24.75).unwrap()
    }

    #[tokio::test]
    async fn sample_is_deterministic() {
        let a = StaticProvider::sample().daily_forecast(here(), 10).await.unwrap();
        let b = StaticProvider::sample().daily_forecast(here(), 10).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0], DailyForecast { temperature_c: 22.0, ..calm_day() });
        assert_eq!(a[9].wind_speed_mps, 22.0);
    }

    #[tokio::test]
    async fn honours_requested_day_count() {
        let days = StaticProvider::sample().daily_forecast(here(), 3).await.unwrap();
        assert_eq!(days.len(), 3);
    }

    #[tokio::test]
    async fn queued_failures_come_first() {
        let provider = StaticProvider::new(vec![calm_day()])
            .failing_with([ProviderError::Transient("HTTP 503".into())]);

        assert!(provider.daily_forecast(here(), 10).await.is_err());
        assert_eq!(provider.daily_forecast(here(), 10).await.unwrap().len(), 1);
        assert_eq!(provider.calls(), 2);
    }
}
