//! Sync contracts and reporting types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Aggregate outcome of one `sync_all` batch, displayed by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success_count: usize,
    pub failed_count: usize,
}

/// One confirmed upload in the synced-surveys audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedSurveyRecord {
    pub id: String,
    pub user_id: String,
    pub synced_at: String,
}

/// Append-only, deduplicated audit log of confirmed uploads.
#[async_trait]
pub trait SyncedSurveyLogTrait: Send + Sync {
    /// Record a confirmed upload. Re-logging the same `(survey_id,
    /// user_id)` pair is a no-op; returns whether an entry was appended.
    async fn record(&self, survey_id: &str, user_id: &str) -> Result<bool>;

    async fn entries(&self) -> Vec<SyncedSurveyRecord>;

    /// Survey ids this user has synced, in log order.
    async fn synced_ids_for_user(&self, user_id: &str) -> Vec<String> {
        self.entries()
            .await
            .into_iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.id)
            .collect()
    }
}

/// Remote collector endpoint consumed by the sync engine.
#[async_trait]
pub trait SurveyCollectorApi: Send + Sync {
    /// Upload one survey body. The endpoint is all-or-nothing per survey;
    /// any error leaves the local record untouched for a later retry.
    async fn submit_survey(
        &self,
        token: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value>;
}
