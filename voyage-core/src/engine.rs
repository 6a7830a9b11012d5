//! The library boundary consumed by the enclosing application.

use std::sync::Arc;

use tracing::{debug, info};

use crate::advisory::{Disposition, RecencyPolicy, SpeedAdvisoryResult, recommend_speed};
use crate::alert::derive_alerts;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::AdvisoryError;
use crate::forecast::ForecastAdapter;
use crate::geo::{Coordinate, distance_km};
use crate::model::{
    AdvisoryDraft, ForecastSnapshot, HazardAlert, MAX_FORECAST_DAY, SpeedAdvisory, UserId, Vessel,
    VesselId,
};
use crate::provider::ForecastProvider;
use crate::severity::sort_by_severity;
use crate::store::Storage;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// A query circle for [`AdvisoryEngine::list_active_alerts`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl SearchArea {
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Result<Self, AdvisoryError> {
        let center = Coordinate::new(lat, lon)?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(AdvisoryError::InvalidRadius(radius_km));
        }
        Ok(Self { center, radius_km })
    }

    /// True when the alert footprint intersects this circle.
    pub fn overlaps(&self, alert: &HazardAlert) -> bool {
        distance_km(self.center, alert.center) <= self.radius_km + alert.radius_km
    }
}

pub struct AdvisoryEngine {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    forecasts: ForecastAdapter,
    recency: RecencyPolicy,
    baseline_knots: f64,
}

impl AdvisoryEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn ForecastProvider>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let forecasts = ForecastAdapter::new(
            storage.clone(),
            provider,
            clock.clone(),
            config.alerts.clone(),
            config.fetch.clone(),
        );

        Self {
            storage,
            clock,
            forecasts,
            recency: RecencyPolicy::from(&config.advisory),
            baseline_knots: config.advisory.baseline_speed_knots,
        }
    }

    pub fn forecasts(&self) -> &ForecastAdapter {
        &self.forecasts
    }

    /// Snapshot for the rounded position and day, fetched upstream if absent.
    pub async fn get_or_fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        day: u8,
    ) -> Result<ForecastSnapshot, AdvisoryError> {
        let at = Coordinate::new(lat, lon)?;
        self.forecasts.get_or_fetch(at, day).await
    }

    /// Stored days `0..=days` for the rounded position, ascending.
    ///
    /// Fetches upstream when today's snapshot is missing or out of date.
    /// Rows left over from an earlier ingestion date are never listed.
    /// `days` defaults to the full horizon.
    pub async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        days: Option<u8>,
    ) -> Result<Vec<ForecastSnapshot>, AdvisoryError> {
        let at = Coordinate::new(lat, lon)?;
        let days = days.unwrap_or(MAX_FORECAST_DAY + 1);

        self.forecasts.get_or_fetch(at, 0).await?;

        let (lat_e2, lon_e2) = at.hundredths();
        let mut snapshots: Vec<ForecastSnapshot> = self
            .storage
            .snapshots_at(lat_e2, lon_e2)
            .await?
            .into_iter()
            .filter(|s| s.key.day <= days && self.forecasts.is_current(s))
            .collect();
        snapshots.sort_by_key(|s| s.key.day);

        Ok(snapshots)
    }

    /// Computes a speed recommendation for today's weather at the position
    /// and persists it under the recency policy.
    ///
    /// The latest-advisory read and the following write are not atomic.
    /// Concurrent calls for one vessel inside the coalescing window may
    /// append duplicate rows or lose an update; neither is reported.
    pub async fn compute_advisory(
        &self,
        requester: &UserId,
        vessel_id: VesselId,
        lat: f64,
        lon: f64,
        baseline_knots: Option<f64>,
    ) -> Result<SpeedAdvisoryResult, AdvisoryError> {
        let position = Coordinate::new(lat, lon)?;
        let baseline = baseline_knots.unwrap_or(self.baseline_knots);
        if !baseline.is_finite() || baseline < 0.0 {
            return Err(AdvisoryError::InvalidBaseline(baseline));
        }

        self.owned_vessel(requester, vessel_id).await?;

        let snapshot = self.forecasts.get_or_fetch(position, 0).await?;
        let recommendation = recommend_speed(baseline, &snapshot.conditions())?;

        let now = self.clock.now();
        let position = position.rounded();

        if let Some(mut last) = self.storage.latest_advisory(vessel_id).await? {
            if self.recency.should_coalesce(&last, position, now) {
                last.timestamp = now;
                last.recommendation = recommendation;
                self.storage.update_advisory(last.clone()).await?;

                info!(
                    vessel = %vessel_id,
                    advisory = last.id.0,
                    knots = last.recommendation.recommended_knots,
                    "Refreshed speed advisory"
                );
                return Ok(SpeedAdvisoryResult {
                    advisory: last,
                    disposition: Disposition::Refreshed,
                });
            }
        }

        let advisory = self
            .storage
            .insert_advisory(AdvisoryDraft {
                vessel_id,
                position,
                timestamp: now,
                recommendation,
            })
            .await?;

        info!(
            vessel = %vessel_id,
            advisory = advisory.id.0,
            knots = advisory.recommendation.recommended_knots,
            "Stored speed advisory"
        );
        Ok(SpeedAdvisoryResult {
            advisory,
            disposition: Disposition::Created,
        })
    }

    /// The vessel's advisories, newest first.
    pub async fn advisory_history(
        &self,
        requester: &UserId,
        vessel_id: VesselId,
        limit: Option<usize>,
    ) -> Result<Vec<SpeedAdvisory>, AdvisoryError> {
        self.owned_vessel(requester, vessel_id).await?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(self.storage.advisories(vessel_id, limit).await?)
    }

    /// Runs the alert rules over a stored snapshot, centred on its rounded
    /// position, and dedup-inserts the results.
    pub async fn derive_and_store_alerts(
        &self,
        snapshot: &ForecastSnapshot,
    ) -> Result<Vec<HazardAlert>, AdvisoryError> {
        let candidates = derive_alerts(
            snapshot,
            snapshot.key.coordinate(),
            self.forecasts.rules(),
            self.clock.now(),
        );
        self.forecasts.store_alerts(candidates).await
    }

    /// Active alerts, optionally limited to those overlapping `area`, most
    /// severe first.
    pub async fn list_active_alerts(
        &self,
        area: Option<SearchArea>,
    ) -> Result<Vec<HazardAlert>, AdvisoryError> {
        let now = self.clock.now();

        let mut alerts: Vec<HazardAlert> = self
            .storage
            .alerts()
            .await?
            .into_iter()
            .map(|mut alert| {
                alert.refresh_activity(now);
                alert
            })
            .filter(|alert| alert.is_active)
            .filter(|alert| area.is_none_or(|area| area.overlaps(alert)))
            .collect();

        sort_by_severity(&mut alerts);
        debug!(count = alerts.len(), "Listed active alerts");

        Ok(alerts)
    }

    async fn owned_vessel(
        &self,
        requester: &UserId,
        vessel_id: VesselId,
    ) -> Result<Vessel, AdvisoryError> {
        let vessel = self
            .storage
            .vessel(vessel_id)
            .await?
            .ok_or(AdvisoryError::NotFound(vessel_id))?;

        if vessel.owner != *requester {
            return Err(AdvisoryError::AccessDenied(vessel_id));
        }

        Ok(vessel)
    }
}
