use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::error::StoreError;
use crate::model::{
    AdvisoryDraft, AdvisoryId, AlertId, ForecastKey, ForecastSnapshot, HazardAlert, NewVessel,
    SpeedAdvisory, Vessel, VesselId,
};

use super::{AdvisoryStore, AlertStore, ForecastStore, VesselStore};

/// Process-local storage backed by sharded maps.
///
/// Per-key operations are atomic. Advisory rows for one vessel live in a
/// single map entry, so concurrent writers for that vessel serialize.
#[derive(Debug, Default)]
pub struct MemoryStore {
    forecasts: DashMap<ForecastKey, ForecastSnapshot>,
    /// Value carries the insertion sequence number for ordered reads.
    alerts: DashMap<AlertId, (u64, HazardAlert)>,
    advisories: DashMap<VesselId, Vec<SpeedAdvisory>>,
    vessels: DashMap<VesselId, Vessel>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Registers a vessel. Fleet management proper lives outside the engine.
    pub fn add_vessel(&self, vessel: NewVessel) -> Vessel {
        let vessel = Vessel::from_new(VesselId(self.next_id()), vessel);
        self.vessels.insert(vessel.id, vessel.clone());
        vessel
    }

    pub fn forecast_count(&self) -> usize {
        self.forecasts.len()
    }

    pub fn advisory_count(&self, vessel: VesselId) -> usize {
        self.advisories.get(&vessel).map_or(0, |rows| rows.len())
    }
}

#[async_trait]
impl ForecastStore for MemoryStore {
    async fn snapshot(&self, key: ForecastKey) -> Result<Option<ForecastSnapshot>, StoreError> {
        Ok(self.forecasts.get(&key).map(|entry| entry.value().clone()))
    }

    async fn replace_snapshot(&self, snapshot: ForecastSnapshot) -> Result<(), StoreError> {
        self.forecasts.insert(snapshot.key, snapshot);
        Ok(())
    }

    async fn snapshots_at(
        &self,
        lat_e2: i32,
        lon_e2: i32,
    ) -> Result<Vec<ForecastSnapshot>, StoreError> {
        Ok(self
            .forecasts
            .iter()
            .filter(|entry| entry.key().lat_e2 == lat_e2 && entry.key().lon_e2 == lon_e2)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alert_if_absent(
        &self,
        alert: HazardAlert,
    ) -> Result<(HazardAlert, bool), StoreError> {
        match self.alerts.entry(alert.id.clone()) {
            Entry::Occupied(existing) => Ok((existing.get().1.clone(), false)),
            Entry::Vacant(slot) => {
                let seq = self.next_id();
                slot.insert((seq, alert.clone()));
                Ok((alert, true))
            }
        }
    }

    async fn alerts(&self) -> Result<Vec<HazardAlert>, StoreError> {
        let mut rows: Vec<(u64, HazardAlert)> =
            self.alerts.iter().map(|entry| entry.value().clone()).collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, alert)| alert).collect())
    }
}

#[async_trait]
impl AdvisoryStore for MemoryStore {
    async fn latest_advisory(
        &self,
        vessel: VesselId,
    ) -> Result<Option<SpeedAdvisory>, StoreError> {
        Ok(self.advisories.get(&vessel).and_then(|rows| {
            rows.iter()
                .max_by_key(|row| (row.timestamp, row.id))
                .cloned()
        }))
    }

    async fn insert_advisory(&self, draft: AdvisoryDraft) -> Result<SpeedAdvisory, StoreError> {
        let advisory = SpeedAdvisory::from_draft(AdvisoryId(self.next_id()), draft);
        self.advisories
            .entry(advisory.vessel_id)
            .or_default()
            .push(advisory.clone());
        Ok(advisory)
    }

    async fn update_advisory(&self, advisory: SpeedAdvisory) -> Result<(), StoreError> {
        let missing = || StoreError::MissingRecord(format!("advisory {}", advisory.id.0));

        let mut rows = self.advisories.get_mut(&advisory.vessel_id).ok_or_else(missing)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == advisory.id)
            .ok_or_else(missing)?;
        *row = advisory;
        Ok(())
    }

    async fn advisories(
        &self,
        vessel: VesselId,
        limit: usize,
    ) -> Result<Vec<SpeedAdvisory>, StoreError> {
        let mut rows = self
            .advisories
            .get(&vessel)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl VesselStore for MemoryStore {
    async fn vessel(&self, id: VesselId) -> Result<Option<Vessel>, StoreError> {
        Ok(self.vessels.get(&id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::model::{AlertKind, SpeedRecommendation, UserId, WeatherConditions};
    use crate::provider::fixed::calm_day;
    use crate::severity::Severity;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap()
    }

    fn alert(id: &str, severity: Severity) -> HazardAlert {
        HazardAlert {
            id: AlertId(id.to_string()),
            kind: AlertKind::Storm,
            severity,
            title: "Storm Warning".into(),
            description: String::new(),
            center: Coordinate { lat: 59.44, lon: 24.75 },
            radius_km: 50.0,
            starts_at: t0(),
            ends_at: t0() + Duration::days(1),
            wind_speed_mps: Some(22.0),
            wave_height_m: None,
            visibility_km: None,
            is_active: true,
        }
    }

    fn draft(vessel: VesselId, at: DateTime<Utc>, knots: f64) -> AdvisoryDraft {
        AdvisoryDraft {
            vessel_id: vessel,
            position: Coordinate { lat: 59.44, lon: 24.75 },
            timestamp: at,
            recommendation: SpeedRecommendation {
                baseline_knots: 12.0,
                recommended_knots: knots,
                fuel_savings_pct: 0,
                time_impact_hours: 0.0,
                reasoning: "Normal conditions".into(),
                conditions: WeatherConditions {
                    wind_speed_mps: 10.0,
                    wave_height_m: 1.0,
                    current_speed_mps: 0.0,
                    current_direction_deg: 0.0,
                },
            },
        }
    }

    #[tokio::test]
    async fn replace_snapshot_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let at = Coordinate::new(59.4437, 24.7536).unwrap();

        let first = ForecastSnapshot::new(at, 0, calm_day(), t0());
        let mut second = first.clone();
        second.weather.wind_speed_mps = 18.0;
        second.ingested_at = t0() + Duration::hours(3);

        store.replace_snapshot(first.clone()).await.unwrap();
        store.replace_snapshot(second.clone()).await.unwrap();

        assert_eq!(store.forecast_count(), 1);
        assert_eq!(store.snapshot(first.key).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn snapshots_at_filters_by_position() {
        let store = MemoryStore::new();
        let here = Coordinate::new(59.44, 24.75).unwrap();
        let there = Coordinate::new(60.17, 24.94).unwrap();

        for day in 0..3 {
            store.replace_snapshot(ForecastSnapshot::new(here, day, calm_day(), t0())).await.unwrap();
        }
        store.replace_snapshot(ForecastSnapshot::new(there, 0, calm_day(), t0())).await.unwrap();

        let rows = store.snapshots_at(5944, 2475).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn first_alert_insert_wins() {
        let store = MemoryStore::new();

        let (stored, inserted) =
            store.insert_alert_if_absent(alert("storm_x", Severity::High)).await.unwrap();
        assert!(inserted);
        assert_eq!(stored.severity, Severity::High);

        let (stored, inserted) =
            store.insert_alert_if_absent(alert("storm_x", Severity::Critical)).await.unwrap();
        assert!(!inserted);
        assert_eq!(stored.severity, Severity::High);
        assert_eq!(store.alerts().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_id_inserts_store_one_alert() {
        let store = Arc::new(MemoryStore::new());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_alert_if_absent(alert("storm_x", Severity::High))
                        .await
                        .unwrap()
                        .1
                })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.alerts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn alerts_come_back_in_insertion_order() {
        let store = MemoryStore::new();
        for id in ["c", "a", "d", "b"] {
            store.insert_alert_if_absent(alert(id, Severity::Medium)).await.unwrap();
        }

        let ids: Vec<String> = store.alerts().await.unwrap().into_iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec!["c", "a", "d", "b"]);
    }

    #[tokio::test]
    async fn advisories_latest_update_and_history() {
        let store = MemoryStore::new();
        let vessel = store.add_vessel(NewVessel::named(UserId::from("captain"), "Aurora")).id;

        let first = store.insert_advisory(draft(vessel, t0(), 12.0)).await.unwrap();
        let second = store
            .insert_advisory(draft(vessel, t0() + Duration::hours(2), 10.2))
            .await
            .unwrap();

        let latest = store.latest_advisory(vessel).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        let mut patched = latest.clone();
        patched.recommendation.recommended_knots = 9.5;
        store.update_advisory(patched).await.unwrap();

        let history = store.advisories(vessel, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].recommendation.recommended_knots, 9.5);
        assert_eq!(history[1].id, first.id);

        assert_eq!(store.advisories(vessel, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updating_unknown_advisory_fails() {
        let store = MemoryStore::new();
        let ghost = SpeedAdvisory::from_draft(AdvisoryId(99), draft(VesselId(5), t0(), 12.0));

        let err = store.update_advisory(ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord(_)));
    }

    #[tokio::test]
    async fn vessels_are_looked_up_by_id() {
        let store = MemoryStore::new();
        let vessel = store.add_vessel(NewVessel::named(UserId::from("captain"), "Aurora"));

        let found = store.vessel(vessel.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Aurora");
        assert!(store.vessel(VesselId(404)).await.unwrap().is_none());
    }
}
