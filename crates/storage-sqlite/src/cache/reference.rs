//! Local persistence for master data and surveyor assignments.

use std::sync::Arc;

use async_trait::async_trait;

use patwari_core::errors::Result;
use patwari_core::masterdata::{Assignment, MasterDataBundle, ReferenceCacheTrait};

use crate::kv::CompressedKvStore;

pub const MASTER_DATA_KEY: &str = "master_data";
pub const USER_ASSIGNMENTS_KEY: &str = "user_assignments";
pub const PRIMARY_ASSIGNMENT_KEY: &str = "primary_assignment";

/// Reference-data blobs are overwritten wholesale on refresh; reads return
/// `None`/empty when cold or corrupted so forms render empty dropdowns.
pub struct ReferenceCache {
    kv: Arc<CompressedKvStore>,
}

impl ReferenceCache {
    pub fn new(kv: Arc<CompressedKvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl ReferenceCacheTrait for ReferenceCache {
    async fn put_master_data(&self, bundle: &MasterDataBundle) -> Result<()> {
        self.kv.save(MASTER_DATA_KEY, bundle).await
    }

    async fn master_data(&self) -> Option<MasterDataBundle> {
        self.kv.load(MASTER_DATA_KEY).await
    }

    async fn put_assignments(&self, assignments: &[Assignment]) -> Result<()> {
        self.kv.save(USER_ASSIGNMENTS_KEY, &assignments).await
    }

    async fn assignments(&self) -> Vec<Assignment> {
        self.kv
            .load::<Vec<Assignment>>(USER_ASSIGNMENTS_KEY)
            .await
            .unwrap_or_default()
    }

    async fn set_primary_assignment_id(&self, assignment_id: &str) -> Result<()> {
        self.kv.save(PRIMARY_ASSIGNMENT_KEY, &assignment_id).await
    }

    async fn primary_assignment_id(&self) -> Option<String> {
        self.kv.load(PRIMARY_ASSIGNMENT_KEY).await
    }
}
