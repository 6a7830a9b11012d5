use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{advisory::DEFAULT_BASELINE_KNOTS, alert::AlertRules, provider::ProviderId};

/// Configuration for a single forecast provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's weather endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Overrides the provider's marine endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marine_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorySettings {
    pub baseline_speed_knots: f64,
    pub coalesce_window_secs: u64,
    pub coalesce_tolerance_deg: f64,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            baseline_speed_knots: DEFAULT_BASELINE_KNOTS,
            coalesce_window_secs: 3600,
            coalesce_tolerance_deg: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Upper bound for one provider call, retries excluded.
    pub timeout_secs: u64,
    /// Daily records kept from one provider response (at most 10).
    pub max_days: u8,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_days: 10,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "open-meteo" or "static".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.open-meteo]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub advisory: AdvisorySettings,

    #[serde(default)]
    pub alerts: AlertRules,

    #[serde(default)]
    pub fetch: FetchSettings,
}

impl Config {
    /// Default provider as a strongly-typed ProviderId; Open-Meteo when unset.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match &self.default_provider {
            Some(s) => ProviderId::try_from(s.as_str()).with_context(|| {
                "Invalid `default_provider` in config.\n\
                 Hint: run `voyage configure` to pick a supported provider."
            }),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from the platform config directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "voyage", "voyage-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key; an empty key clears it.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let entry = self.providers.entry(provider_id.as_str().to_string()).or_default();
        entry.api_key = Some(api_key).filter(|key| !key.trim().is_empty());
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).and_then(|cfg| cfg.api_key.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_falls_back_to_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn unknown_default_provider_is_an_error() {
        let cfg = Config {
            default_provider: Some("doesnotexist".into()),
            ..Config::default()
        };
        let err = cfg.default_provider_id().unwrap_err();

        assert!(format!("{err:#}").contains("Unknown provider"));
        assert!(err.to_string().contains("Hint: run `voyage configure`"));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::Static);

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::Static);
    }

    #[test]
    fn empty_api_key_clears_existing_key() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "KEY".into());
        assert_eq!(cfg.provider_api_key(ProviderId::OpenMeteo), Some("KEY"));

        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "  ".into());
        assert_eq!(cfg.provider_api_key(ProviderId::OpenMeteo), None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let cfg: Config = toml::from_str(
            r#"
            default_provider = "static"

            [advisory]
            baseline_speed_knots = 14.5

            [providers.open-meteo]
            base_url = "http://localhost:8080/v1/forecast"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.advisory.baseline_speed_knots, 14.5);
        assert_eq!(cfg.advisory.coalesce_window_secs, 3600);
        assert_eq!(cfg.alerts, AlertRules::default());
        assert_eq!(cfg.fetch, FetchSettings::default());
        assert_eq!(
            cfg.provider_config(ProviderId::OpenMeteo).and_then(|p| p.base_url.as_deref()),
            Some("http://localhost:8080/v1/forecast")
        );
    }

    #[test]
    fn save_and_load_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::Static);
        cfg.advisory.baseline_speed_knots = 10.0;
        cfg.alerts.radius_km = 75.0;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_provider_id().unwrap(), ProviderId::Static);
        assert_eq!(loaded.advisory.baseline_speed_knots, 10.0);
        assert_eq!(loaded.alerts.radius_km, 75.0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(cfg.default_provider.is_none());
        assert_eq!(cfg.advisory, AdvisorySettings::default());
    }
}
