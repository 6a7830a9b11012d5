//! Forecast lookup by rounded position and day, with on-demand ingestion.

use std::sync::Arc;

use chrono::Days;
use tracing::{debug, info, warn};

use crate::alert::{AlertRules, derive_alerts};
use crate::clock::Clock;
use crate::config::FetchSettings;
use crate::error::{AdvisoryError, ProviderError};
use crate::geo::Coordinate;
use crate::model::{DailyForecast, ForecastKey, ForecastSnapshot, HazardAlert, MAX_FORECAST_DAY};
use crate::provider::ForecastProvider;
use crate::store::Storage;

/// Days a provider may deliver in one response.
const MAX_PROVIDER_DAYS: u8 = MAX_FORECAST_DAY + 1;

pub struct ForecastAdapter {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn ForecastProvider>,
    clock: Arc<dyn Clock>,
    rules: AlertRules,
    fetch: FetchSettings,
}

impl ForecastAdapter {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn ForecastProvider>,
        clock: Arc<dyn Clock>,
        rules: AlertRules,
        fetch: FetchSettings,
    ) -> Self {
        Self {
            storage,
            provider,
            clock,
            rules,
            fetch,
        }
    }

    /// Stored snapshot for the rounded position, if any.
    pub async fn snapshot(
        &self,
        at: Coordinate,
        day: u8,
    ) -> Result<Option<ForecastSnapshot>, AdvisoryError> {
        check_day(day)?;
        Ok(self.storage.snapshot(ForecastKey::new(at, day)).await?)
    }

    /// True when the snapshot describes `today + day` rather than a day
    /// that has already passed.
    pub fn is_current(&self, snapshot: &ForecastSnapshot) -> bool {
        let today = self.clock.now().date_naive();
        today
            .checked_add_days(Days::new(u64::from(snapshot.key.day)))
            .is_some_and(|date| snapshot.source_date() == date)
    }

    /// Replaces any snapshot stored under the same key.
    pub async fn upsert_snapshot(&self, snapshot: ForecastSnapshot) -> Result<(), AdvisoryError> {
        check_day(snapshot.key.day)?;
        self.storage.replace_snapshot(snapshot).await?;
        Ok(())
    }

    /// Pulls a fresh forecast, stores every day and derives its alerts.
    pub async fn fetch_and_ingest(
        &self,
        at: Coordinate,
    ) -> Result<Vec<ForecastSnapshot>, AdvisoryError> {
        let days = self.fetch.max_days.min(MAX_PROVIDER_DAYS);
        let records = self
            .fetch_bounded(at, days)
            .await
            .map_err(AdvisoryError::ProviderUnavailable)?;

        let now = self.clock.now();
        let mut snapshots = Vec::with_capacity(records.len());
        let mut raised = 0usize;

        for (day, weather) in (0..days).zip(records) {
            let snapshot = ForecastSnapshot::new(at, day, weather, now);
            self.storage.replace_snapshot(snapshot.clone()).await?;

            let candidates = derive_alerts(&snapshot, at, &self.rules, now);
            raised += self.store_alerts(candidates).await?.len();
            snapshots.push(snapshot);
        }

        info!(
            lat = at.lat,
            lon = at.lon,
            days = snapshots.len(),
            alerts = raised,
            "Ingested forecast"
        );

        Ok(snapshots)
    }

    /// Stored snapshot, or a fetch when the key is missing or the stored
    /// row was ingested on an earlier date.
    ///
    /// A transient provider failure is retried once before surfacing.
    pub async fn get_or_fetch(
        &self,
        at: Coordinate,
        day: u8,
    ) -> Result<ForecastSnapshot, AdvisoryError> {
        match self.snapshot(at, day).await? {
            Some(snapshot) if self.is_current(&snapshot) => {
                debug!(lat = at.lat, lon = at.lon, day, "Forecast cache hit");
                return Ok(snapshot);
            }
            Some(stale) => {
                debug!(
                    lat = at.lat,
                    lon = at.lon,
                    day,
                    source_date = %stale.source_date(),
                    "Stored forecast is out of date, refetching"
                );
            }
            None => {}
        }

        match self.fetch_and_ingest(at).await {
            Err(AdvisoryError::ProviderUnavailable(err)) if err.is_transient() => {
                warn!(error = %err, "Forecast fetch failed, retrying once");
                self.fetch_and_ingest(at).await?;
            }
            other => {
                other?;
            }
        }

        self.snapshot(at, day)
            .await?
            .filter(|snapshot| self.is_current(snapshot))
            .ok_or(AdvisoryError::NoForecastAvailable {
                lat: at.rounded().lat,
                lon: at.rounded().lon,
                day,
            })
    }

    /// Dedup-inserts candidates; returns the stored version of each.
    pub async fn store_alerts(
        &self,
        candidates: Vec<HazardAlert>,
    ) -> Result<Vec<HazardAlert>, AdvisoryError> {
        let now = self.clock.now();
        let mut stored = Vec::with_capacity(candidates.len());

        for mut candidate in candidates {
            candidate.refresh_activity(now);
            let (mut alert, inserted) = self.storage.insert_alert_if_absent(candidate).await?;
            if inserted {
                info!(id = %alert.id, severity = %alert.severity, "Raised hazard alert");
            }
            alert.refresh_activity(now);
            stored.push(alert);
        }

        Ok(stored)
    }

    pub fn rules(&self) -> &AlertRules {
        &self.rules
    }

    async fn fetch_bounded(
        &self,
        at: Coordinate,
        days: u8,
    ) -> Result<Vec<DailyForecast>, ProviderError> {
        let timeout = self.fetch.timeout();
        match tokio::time::timeout(timeout, self.provider.daily_forecast(at, days)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }
}

fn check_day(day: u8) -> Result<(), AdvisoryError> {
    if day > MAX_FORECAST_DAY {
        return Err(AdvisoryError::InvalidForecastDay(day));
    }
    Ok(())
}
