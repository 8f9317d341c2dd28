//! Read-through reference-data service over the collector API and the
//! local cache.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{Error, Result};
use crate::events::EventSink;
use crate::masterdata::{Assignment, MasterDataBundle};

/// Collector-side fetches consumed by the service.
#[async_trait]
pub trait ReferenceDataApi: Send + Sync {
    async fn fetch_master_data(&self, token: &str) -> Result<MasterDataBundle>;
    async fn fetch_assignments(&self, token: &str) -> Result<Vec<Assignment>>;
}

/// Local persistence for reference data. Reads return `None`/empty when the
/// cache is cold or corrupted; consumers render empty dropdowns.
#[async_trait]
pub trait ReferenceCacheTrait: Send + Sync {
    async fn put_master_data(&self, bundle: &MasterDataBundle) -> Result<()>;
    async fn master_data(&self) -> Option<MasterDataBundle>;

    async fn put_assignments(&self, assignments: &[Assignment]) -> Result<()>;
    async fn assignments(&self) -> Vec<Assignment>;

    /// Persist the primary-assignment pointer as its own cache entry.
    async fn set_primary_assignment_id(&self, assignment_id: &str) -> Result<()>;
    async fn primary_assignment_id(&self) -> Option<String>;
}

/// Populates and serves the master-data and assignment caches.
pub struct ReferenceDataService {
    api: Arc<dyn ReferenceDataApi>,
    cache: Arc<dyn ReferenceCacheTrait>,
    events: Arc<dyn EventSink>,
}

impl ReferenceDataService {
    pub fn new(
        api: Arc<dyn ReferenceDataApi>,
        cache: Arc<dyn ReferenceCacheTrait>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { api, cache, events }
    }

    /// Fetch both bundles and overwrite the cached blobs wholesale. Runs on
    /// login; requires connectivity.
    pub async fn refresh(&self, token: &str) -> Result<()> {
        let bundle = self.api.fetch_master_data(token).await?;
        self.cache.put_master_data(&bundle).await?;

        let assignments = self.api.fetch_assignments(token).await?;
        self.cache.put_assignments(&assignments).await?;

        self.events.emit(
            "reference_data_refreshed",
            serde_json::json!({
                "tables": bundle.tables.len(),
                "assignments": assignments.len(),
            }),
        );
        Ok(())
    }

    pub async fn master_data(&self) -> Option<MasterDataBundle> {
        self.cache.master_data().await
    }

    pub async fn assignments(&self) -> Vec<Assignment> {
        self.cache.assignments().await
    }

    /// Select the assignment whose scope pre-fills new surveys. The id must
    /// reference a cached assignment.
    pub async fn set_primary_assignment(&self, assignment_id: &str) -> Result<()> {
        let known = self
            .cache
            .assignments()
            .await
            .iter()
            .any(|a| a.id == assignment_id);
        if !known {
            return Err(Error::validation(format!(
                "unknown assignment id '{assignment_id}'"
            )));
        }
        self.cache.set_primary_assignment_id(assignment_id).await
    }

    /// The currently selected primary assignment, resolved against the
    /// cached list.
    pub async fn primary_assignment(&self) -> Option<Assignment> {
        let id = self.cache.primary_assignment_id().await?;
        self.cache
            .assignments()
            .await
            .into_iter()
            .find(|a| a.id == id)
    }
}
