//! Threshold rules that turn a forecast day into hazard alert candidates.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::model::{AlertId, AlertKind, ForecastSnapshot, HazardAlert};
use crate::severity::Severity;

/// Alert thresholds and footprint.
///
/// Example TOML:
/// [alerts]
/// storm_wind_mps = 20.0
/// radius_km = 50.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRules {
    pub storm_wind_mps: f64,
    pub storm_critical_wind_mps: f64,
    pub swell_wave_m: f64,
    pub swell_critical_wave_m: f64,
    pub fog_visibility_km: f64,
    pub fog_high_visibility_km: f64,
    pub radius_km: f64,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            storm_wind_mps: 20.0,
            storm_critical_wind_mps: 28.0,
            swell_wave_m: 3.0,
            swell_critical_wave_m: 5.0,
            fog_visibility_km: 5.0,
            fog_high_visibility_km: 2.0,
            radius_km: 50.0,
        }
    }
}

impl AlertRules {
    /// Matching (kind, severity) pairs, one per breached threshold.
    pub fn evaluate(&self, snapshot: &ForecastSnapshot) -> Vec<(AlertKind, Severity)> {
        let w = &snapshot.weather;
        let mut hits = Vec::new();

        if w.wind_speed_mps >= self.storm_wind_mps {
            let severity = if w.wind_speed_mps >= self.storm_critical_wind_mps {
                Severity::Critical
            } else {
                Severity::High
            };
            hits.push((AlertKind::Storm, severity));
        }

        if w.wave_height_m >= self.swell_wave_m {
            let severity = if w.wave_height_m >= self.swell_critical_wave_m {
                Severity::Critical
            } else {
                Severity::High
            };
            hits.push((AlertKind::Swell, severity));
        }

        if w.visibility_km <= self.fog_visibility_km {
            let severity = if w.visibility_km <= self.fog_high_visibility_km {
                Severity::High
            } else {
                Severity::Medium
            };
            hits.push((AlertKind::Fog, severity));
        }

        hits
    }
}

/// Builds alert candidates for one forecast day.
///
/// Identity comes from the snapshot's rounded key and source date; `center`
/// is the footprint centre and may be a raw, unrounded position.
pub fn derive_alerts(
    snapshot: &ForecastSnapshot,
    center: Coordinate,
    rules: &AlertRules,
    now: DateTime<Utc>,
) -> Vec<HazardAlert> {
    let source_date = snapshot.source_date();
    let starts_at = source_date.and_time(NaiveTime::MIN).and_utc();
    let ends_at = starts_at + Duration::days(1);
    let w = &snapshot.weather;

    rules
        .evaluate(snapshot)
        .into_iter()
        .map(|(kind, severity)| {
            let detail = match kind {
                AlertKind::Storm => format!("Wind speeds of {:.1} m/s", w.wind_speed_mps),
                AlertKind::Swell => format!("Wave heights of {:.1} m", w.wave_height_m),
                AlertKind::Fog => format!("Visibility down to {:.1} km", w.visibility_km),
                AlertKind::Cyclone | AlertKind::Current => kind.label().to_string(),
            };

            let mut alert = HazardAlert {
                id: AlertId::new(kind, source_date, &snapshot.key),
                kind,
                severity,
                title: title_for(kind, severity),
                description: format!("{detail} forecast for {source_date}."),
                center,
                radius_km: rules.radius_km,
                starts_at,
                ends_at,
                wind_speed_mps: Some(w.wind_speed_mps),
                wave_height_m: Some(w.wave_height_m),
                visibility_km: Some(w.visibility_km),
                is_active: false,
            };
            alert.refresh_activity(now);
            alert
        })
        .collect()
}

fn title_for(kind: AlertKind, severity: Severity) -> String {
    match severity {
        Severity::Critical => format!("Severe {} Warning", kind.label()),
        Severity::High => format!("{} Warning", kind.label()),
        Severity::Medium => format!("{} Advisory", kind.label()),
        Severity::Low => format!("{} Watch", kind.label()),
    }
}
