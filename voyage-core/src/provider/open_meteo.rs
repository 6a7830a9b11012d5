use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::ProviderError,
    geo::Coordinate,
    model::{DailyForecast, WeatherCondition},
};

use super::ForecastProvider;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

const FORECAST_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,pressure_msl,\
                               visibility,wind_speed_10m,wind_direction_10m,weather_code";
const MARINE_FIELDS: &str =
    "wave_height,wave_direction,wave_period,ocean_current_velocity,ocean_current_direction";

/// Hour of day (UTC) sampled to represent a whole forecast day.
const SAMPLE_HOUR: usize = 12;
const HOURS_PER_DAY: usize = 24;

/// Open-Meteo weather + marine APIs, merged into daily records.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    api_key: Option<String>,
    forecast_url: String,
    marine_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Permanent(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            forecast_url: FORECAST_URL.to_string(),
            marine_url: MARINE_URL.to_string(),
            http,
        })
    }

    pub fn with_forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_url = url.into();
        self
    }

    pub fn with_marine_url(mut self, url: impl Into<String>) -> Self {
        self.marine_url = url.into();
        self
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        at: Coordinate,
        fields: &str,
        days: u8,
        extra: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let mut query: Vec<(&str, String)> = vec![
            ("latitude", at.lat.to_string()),
            ("longitude", at.lon.to_string()),
            ("hourly", fields.to_string()),
            ("forecast_days", days.to_string()),
            ("timezone", "GMT".to_string()),
        ];
        query.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }

        let res = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        if !status.is_success() {
            let message = format!(
                "Open-Meteo request to {url} failed with status {status}: {}",
                truncate_body(&body)
            );
            return Err(if is_transient_status(status) {
                ProviderError::Transient(message)
            } else {
                ProviderError::Permanent(message)
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::Permanent(format!("Failed to parse Open-Meteo JSON from {url}: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    hourly: OmForecastHourly,
}

#[derive(Debug, Default, Deserialize)]
struct OmForecastHourly {
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pressure_msl: Vec<Option<f64>>,
    /// Metres.
    #[serde(default)]
    visibility: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
}

#[derive(Debug, Deserialize)]
struct OmMarineResponse {
    hourly: OmMarineHourly,
}

#[derive(Debug, Default, Deserialize)]
struct OmMarineHourly {
    #[serde(default)]
    wave_height: Vec<Option<f64>>,
    #[serde(default)]
    wave_direction: Vec<Option<f64>>,
    #[serde(default)]
    wave_period: Vec<Option<f64>>,
    /// km/h.
    #[serde(default)]
    ocean_current_velocity: Vec<Option<f64>>,
    #[serde(default)]
    ocean_current_direction: Vec<Option<f64>>,
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn daily_forecast(
        &self,
        at: Coordinate,
        days: u8,
    ) -> Result<Vec<DailyForecast>, ProviderError> {
        let forecast = self.fetch::<OmForecastResponse>(
            &self.forecast_url,
            at,
            FORECAST_FIELDS,
            days,
            &[("wind_speed_unit", "ms")],
        );
        let marine = self.fetch::<OmMarineResponse>(&self.marine_url, at, MARINE_FIELDS, days, &[]);

        let (forecast, marine) = tokio::try_join!(forecast, marine)?;

        let records = merge_daily(&forecast.hourly, &marine.hourly, days);
        if records.is_empty() {
            return Err(ProviderError::Permanent(format!(
                "Open-Meteo returned no complete daily records for ({}, {})",
                at.lat, at.lon
            )));
        }

        Ok(records)
    }
}

/// Samples each day at [`SAMPLE_HOUR`]. Records are positional, so the
/// series ends at the first day with a missing value.
fn merge_daily(
    forecast: &OmForecastHourly,
    marine: &OmMarineHourly,
    days: u8,
) -> Vec<DailyForecast> {
    (0..usize::from(days))
        .map_while(|day| {
            let record = sample(forecast, marine, day * HOURS_PER_DAY + SAMPLE_HOUR);
            if record.is_none() {
                debug!(day, "Open-Meteo day incomplete, truncating forecast");
            }
            record
        })
        .collect()
}

fn sample(forecast: &OmForecastHourly, marine: &OmMarineHourly, i: usize) -> Option<DailyForecast> {
    let at = |series: &[Option<f64>]| series.get(i).copied().flatten();

    Some(DailyForecast {
        temperature_c: at(&forecast.temperature_2m)?,
        wind_speed_mps: at(&forecast.wind_speed_10m)?,
        wind_direction_deg: at(&forecast.wind_direction_10m)?,
        wave_height_m: at(&marine.wave_height)?,
        wave_period_s: at(&marine.wave_period)?,
        wave_direction_deg: at(&marine.wave_direction)?,
        current_speed_mps: at(&marine.ocean_current_velocity)? / 3.6,
        current_direction_deg: at(&marine.ocean_current_direction)?,
        visibility_km: at(&forecast.visibility)? / 1000.0,
        pressure_hpa: at(&forecast.pressure_msl)?,
        humidity_pct: at(&forecast.relative_humidity_2m)?,
        precipitation_mm: at(&forecast.precipitation)?,
        condition: forecast
            .weather_code
            .get(i)
            .copied()
            .flatten()
            .map(WeatherCondition::from_wmo_code)
            .unwrap_or(WeatherCondition::Unknown),
    })
}

fn classify_request_error(url: &str, e: reqwest::Error) -> ProviderError {
    let message = format!("Open-Meteo request to {url} failed: {e}");
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        ProviderError::Transient(message)
    } else {
        ProviderError::Permanent(message)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
