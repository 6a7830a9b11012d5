use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use tracing::debug;

use voyage_core::{
    AdvisoryEngine, Config, MemoryStore, NewVessel, ProviderId, SearchArea, SystemClock, UserId,
    provider::{ForecastProvider, default_provider_from_config, provider_from_config},
};

use crate::output;

/// Owner of the vessels this process registers for itself.
const LOCAL_USER: &str = "local";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "voyage", version, about = "Weather-aware speed advisories for vessels")]
pub struct Cli {
    /// Forecast provider for this run, e.g. "open-meteo" or "static".
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose the default provider and its credentials.
    Configure {
        /// Provider short name; prompted for when absent.
        provider: Option<String>,
    },

    /// Show the daily marine forecast for a position.
    #[command(allow_negative_numbers = true)]
    Forecast {
        lat: f64,
        lon: f64,

        /// Last forecast day to show (0 is today).
        #[arg(long)]
        days: Option<u8>,
    },

    /// Recommend a speed for today's weather at a position.
    #[command(allow_negative_numbers = true)]
    Advise {
        lat: f64,
        lon: f64,

        /// Planned speed in knots; the configured baseline when absent.
        #[arg(long)]
        baseline: Option<f64>,

        /// Vessel name shown in the output.
        #[arg(long, default_value = "Unnamed vessel")]
        vessel: String,
    },

    /// List active hazard alerts whose footprint reaches a position.
    #[command(allow_negative_numbers = true)]
    Alerts {
        lat: f64,
        lon: f64,

        /// Search radius around the position, in km.
        #[arg(long, default_value_t = 0.0)]
        radius: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { ref provider } => configure(&mut config, provider.as_deref()),
            Command::Forecast { lat, lon, days } => {
                let (engine, _) = self.engine(&config)?;
                let snapshots = engine.forecast(lat, lon, days).await?;
                output::forecast(&snapshots, self.json)
            }
            Command::Advise {
                lat,
                lon,
                baseline,
                ref vessel,
            } => {
                let (engine, store) = self.engine(&config)?;
                let owner = UserId::from(LOCAL_USER);
                let vessel = store.add_vessel(NewVessel::named(owner.clone(), vessel.as_str()));
                debug!(vessel = %vessel.id, name = %vessel.name, "Registered local vessel");

                let result = engine
                    .compute_advisory(&owner, vessel.id, lat, lon, baseline)
                    .await?;
                output::advisory(&vessel, &result, self.json)
            }
            Command::Alerts { lat, lon, radius } => {
                let area = SearchArea::new(lat, lon, radius)?;
                let (engine, _) = self.engine(&config)?;
                engine.forecast(lat, lon, None).await?;

                let alerts = engine.list_active_alerts(Some(area)).await?;
                output::alerts(&alerts, self.json)
            }
        }
    }

    /// Engine over a fresh in-process store.
    fn engine(&self, config: &Config) -> Result<(AdvisoryEngine, Arc<MemoryStore>)> {
        let provider = self.forecast_provider(config)?;
        let store = Arc::new(MemoryStore::new());
        let engine = AdvisoryEngine::new(store.clone(), provider, Arc::new(SystemClock), config);
        Ok((engine, store))
    }

    fn forecast_provider(&self, config: &Config) -> Result<Arc<dyn ForecastProvider>> {
        match &self.provider {
            Some(name) => {
                let id = ProviderId::try_from(name.as_str())?;
                provider_from_config(id, config)
            }
            None => default_provider_from_config(config),
        }
    }
}

fn configure(config: &mut Config, provider: Option<&str>) -> Result<()> {
    let id = match provider {
        Some(name) => ProviderId::try_from(name)?,
        None => Select::new("Default forecast provider:", ProviderId::all().to_vec())
            .prompt()
            .context("Provider selection aborted")?,
    };
    config.set_default_provider(id);

    if id == ProviderId::OpenMeteo {
        let current = config.provider_api_key(id).unwrap_or_default().to_string();
        let api_key = Text::new("Open-Meteo API key (leave empty for the free tier):")
            .with_default(&current)
            .prompt()
            .context("API key prompt aborted")?;
        config.upsert_provider_api_key(id, api_key);
    }

    config.advisory.baseline_speed_knots = CustomType::<f64>::new("Baseline speed (knots):")
        .with_default(config.advisory.baseline_speed_knots)
        .with_error_message("Please enter a number, e.g. 12.5")
        .prompt()
        .context("Baseline speed prompt aborted")?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}
