//! Core library for the `voyage` speed advisory CLI.
//!
//! This crate defines:
//! - Forecast ingestion and lookup keyed by rounded position and day
//! - Hazard alert derivation, dedup and severity ranking
//! - Weather-aware speed recommendations with recency coalescing
//! - Configuration, forecast providers and storage seams
//!
//! It is used by `voyage-cli`, but the [`AdvisoryEngine`] can be embedded in
//! any service that supplies a [`store::Storage`] backend.

pub mod advisory;
pub mod alert;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod model;
pub mod provider;
pub mod severity;
pub mod store;

pub use advisory::{Disposition, SpeedAdvisoryResult};
pub use alert::AlertRules;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ProviderConfig};
pub use engine::{AdvisoryEngine, SearchArea};
pub use error::{AdvisoryError, ProviderError, StoreError};
pub use geo::Coordinate;
pub use model::{
    ForecastSnapshot, HazardAlert, NewVessel, SpeedAdvisory, UserId, Vessel, VesselId,
};
pub use provider::{ForecastProvider, ProviderId};
pub use severity::Severity;
pub use store::MemoryStore;
