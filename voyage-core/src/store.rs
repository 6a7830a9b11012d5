//! Storage seams consumed by the engine.
//!
//! Each method is one atomic operation against the backend. The engine never
//! composes two calls where atomicity matters: snapshot replacement and alert
//! dedup are single calls here. Advisory coalescing is the exception, see
//! [`crate::AdvisoryEngine::compute_advisory`].

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    AdvisoryDraft, ForecastKey, ForecastSnapshot, HazardAlert, SpeedAdvisory, Vessel, VesselId,
};

#[async_trait]
pub trait ForecastStore: Send + Sync {
    async fn snapshot(&self, key: ForecastKey) -> Result<Option<ForecastSnapshot>, StoreError>;

    /// Replaces whatever is stored under `snapshot.key`. Readers see either
    /// the old or the new snapshot, never neither.
    async fn replace_snapshot(&self, snapshot: ForecastSnapshot) -> Result<(), StoreError>;

    /// All days stored for one rounded position, in any order.
    async fn snapshots_at(&self, lat_e2: i32, lon_e2: i32)
    -> Result<Vec<ForecastSnapshot>, StoreError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Inserts unless an alert with the same id exists. Returns the stored
    /// alert and whether this call inserted it.
    async fn insert_alert_if_absent(
        &self,
        alert: HazardAlert,
    ) -> Result<(HazardAlert, bool), StoreError>;

    /// Every alert ever stored, in insertion order.
    async fn alerts(&self) -> Result<Vec<HazardAlert>, StoreError>;
}

#[async_trait]
pub trait AdvisoryStore: Send + Sync {
    async fn latest_advisory(&self, vessel: VesselId)
    -> Result<Option<SpeedAdvisory>, StoreError>;

    async fn insert_advisory(&self, draft: AdvisoryDraft) -> Result<SpeedAdvisory, StoreError>;

    async fn update_advisory(&self, advisory: SpeedAdvisory) -> Result<(), StoreError>;

    /// Newest first.
    async fn advisories(
        &self,
        vessel: VesselId,
        limit: usize,
    ) -> Result<Vec<SpeedAdvisory>, StoreError>;
}

#[async_trait]
pub trait VesselStore: Send + Sync {
    async fn vessel(&self, id: VesselId) -> Result<Option<Vessel>, StoreError>;
}

/// Everything the engine needs from one backend.
pub trait Storage: ForecastStore + AlertStore + AdvisoryStore + VesselStore {}

impl<T> Storage for T where T: ForecastStore + AlertStore + AdvisoryStore + VesselStore {}
