use crate::{
    Config,
    error::ProviderError,
    geo::Coordinate,
    model::DailyForecast,
    provider::{fixed::StaticProvider, open_meteo::OpenMeteoProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod fixed;
pub mod open_meteo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    Static,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Static => "static",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::Static]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "static" => Ok(ProviderId::Static),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: open-meteo, static."
            )),
        }
    }
}

/// Upstream source of daily marine forecasts.
///
/// Implementations return at most `days` records ordered by day, today first.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn daily_forecast(
        &self,
        at: Coordinate,
        days: u8,
    ) -> Result<Vec<DailyForecast>, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    let settings = config.provider_config(id).cloned().unwrap_or_default();

    let provider: Arc<dyn ForecastProvider> = match id {
        ProviderId::OpenMeteo => {
            let mut provider = OpenMeteoProvider::new(settings.api_key, config.fetch.timeout())?;
            if let Some(url) = settings.base_url {
                provider = provider.with_forecast_url(url);
            }
            if let Some(url) = settings.marine_url {
                provider = provider.with_marine_url(url);
            }
            Arc::new(provider)
        }
        ProviderId::Static => Arc::new(StaticProvider::sample()),
    };

    Ok(provider)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parsing_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("OpenMeteo").unwrap(), ProviderId::OpenMeteo);
        assert_eq!(ProviderId::try_from("STATIC").unwrap(), ProviderId::Static);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn open_meteo_needs_no_api_key() {
        let cfg = Config::default();
        assert!(provider_from_config(ProviderId::OpenMeteo, &cfg).is_ok());
    }

    #[test]
    fn default_provider_from_config_errors_on_bad_name() {
        let cfg = Config {
            default_provider: Some("nope".into()),
            ..Config::default()
        };
        assert!(default_provider_from_config(&cfg).is_err());
    }

    #[tokio::test]
    async fn default_provider_from_config_uses_configured_provider() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::Static);

        let provider = default_provider_from_config(&cfg).unwrap();
        let at = Coordinate::new(59.44, 24.75).unwrap();
        let days = provider.daily_forecast(at, 10).await.unwrap();

        assert_eq!(days.len(), 10);
    }
}
