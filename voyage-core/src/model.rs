use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::severity::Severity;

/// Highest forecast day offset kept in the store (today is day 0).
pub const MAX_FORECAST_DAY: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u64);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Registration data for a vessel, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVessel {
    pub owner: UserId,
    pub name: String,
    /// International Maritime Organization number.
    pub imo: Option<String>,
    /// Maritime Mobile Service Identity.
    pub mmsi: Option<String>,
    pub vessel_type: Option<String>,
    pub heading_deg: Option<f64>,
    pub position: Option<Coordinate>,
}

impl NewVessel {
    pub fn named(owner: UserId, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            imo: None,
            mmsi: None,
            vessel_type: None,
            heading_deg: None,
            position: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub id: VesselId,
    pub owner: UserId,
    pub name: String,
    pub imo: Option<String>,
    pub mmsi: Option<String>,
    pub vessel_type: Option<String>,
    /// Not used by the speed calculation, which assumes a 0 deg heading.
    pub heading_deg: Option<f64>,
    pub position: Option<Coordinate>,
}

impl Vessel {
    pub fn from_new(id: VesselId, new: NewVessel) -> Self {
        Self {
            id,
            owner: new.owner,
            name: new.name,
            imo: new.imo,
            mmsi: new.mmsi,
            vessel_type: new.vessel_type,
            heading_deg: new.heading_deg,
            position: new.position,
        }
    }
}

/// Categorical weather, mapped from WMO weather interpretation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    #[serde(rename = "Light Rain")]
    LightRain,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51..=57 => Self::Drizzle,
            61 | 80 => Self::LightRain,
            63..=67 | 81 | 82 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::LightRain => "Light Rain",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One day of forecast values as delivered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub temperature_c: f64,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: f64,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub wave_direction_deg: f64,
    pub current_speed_mps: f64,
    pub current_direction_deg: f64,
    pub visibility_km: f64,
    pub pressure_hpa: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub condition: WeatherCondition,
}

/// Canonical forecast lookup key: rounded position plus day offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForecastKey {
    pub lat_e2: i32,
    pub lon_e2: i32,
    pub day: u8,
}

impl ForecastKey {
    pub fn new(at: Coordinate, day: u8) -> Self {
        let (lat_e2, lon_e2) = at.hundredths();
        Self { lat_e2, lon_e2, day }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::from_hundredths(self.lat_e2, self.lon_e2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub key: ForecastKey,
    pub ingested_at: DateTime<Utc>,
    pub weather: DailyForecast,
}

impl ForecastSnapshot {
    pub fn new(at: Coordinate, day: u8, weather: DailyForecast, ingested_at: DateTime<Utc>) -> Self {
        Self {
            key: ForecastKey::new(at, day),
            ingested_at,
            weather,
        }
    }

    /// Calendar date (UTC) the forecast day refers to.
    pub fn source_date(&self) -> NaiveDate {
        let ingested = self.ingested_at.date_naive();
        ingested
            .checked_add_days(Days::new(u64::from(self.key.day)))
            .unwrap_or(ingested)
    }

    pub fn conditions(&self) -> WeatherConditions {
        WeatherConditions {
            wind_speed_mps: self.weather.wind_speed_mps,
            wave_height_m: self.weather.wave_height_m,
            current_speed_mps: self.weather.current_speed_mps,
            current_direction_deg: self.weather.current_direction_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Storm,
    Swell,
    Fog,
    Cyclone,
    Current,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Storm => "storm",
            AlertKind::Swell => "swell",
            AlertKind::Fog => "fog",
            AlertKind::Cyclone => "cyclone",
            AlertKind::Current => "current",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Storm => "Storm",
            AlertKind::Swell => "Swell",
            AlertKind::Fog => "Fog",
            AlertKind::Cyclone => "Cyclone",
            AlertKind::Current => "Current",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic alert identity: `{kind}_{date}_{lat_e2}_{lon_e2}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    pub fn new(kind: AlertKind, source_date: NaiveDate, key: &ForecastKey) -> Self {
        Self(format!(
            "{}_{}_{}_{}",
            kind.as_str(),
            source_date.format("%Y-%m-%d"),
            key.lat_e2,
            key.lon_e2
        ))
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardAlert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub center: Coordinate,
    pub radius_km: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub wind_speed_mps: Option<f64>,
    pub wave_height_m: Option<f64>,
    pub visibility_km: Option<f64>,
    /// `ends_at > now` as of the last insert or read.
    pub is_active: bool,
}

impl HazardAlert {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.ends_at > now
    }

    pub fn refresh_activity(&mut self, now: DateTime<Utc>) {
        self.is_active = self.is_active_at(now);
    }
}

/// The subset of forecast values the speed calculation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub wind_speed_mps: f64,
    pub wave_height_m: f64,
    pub current_speed_mps: f64,
    pub current_direction_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedRecommendation {
    pub baseline_knots: f64,
    pub recommended_knots: f64,
    /// Negative means a fuel cost increase.
    pub fuel_savings_pct: i32,
    /// Negative means time saved.
    pub time_impact_hours: f64,
    pub reasoning: String,
    pub conditions: WeatherConditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdvisoryId(pub u64);

/// An advisory not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryDraft {
    pub vessel_id: VesselId,
    /// Rounded to 2 decimals.
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub recommendation: SpeedRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedAdvisory {
    pub id: AdvisoryId,
    pub vessel_id: VesselId,
    /// Rounded to 2 decimals.
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub recommendation: SpeedRecommendation,
}

impl SpeedAdvisory {
    pub fn from_draft(id: AdvisoryId, draft: AdvisoryDraft) -> Self {
        Self {
            id,
            vessel_id: draft.vessel_id,
            position: draft.position,
            timestamp: draft.timestamp,
            recommendation: draft.recommendation,
        }
    }
}
