//! Audit log of confirmed uploads.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use patwari_core::errors::Result;
use patwari_core::sync::{SyncedSurveyLogTrait, SyncedSurveyRecord};

use crate::kv::CompressedKvStore;

pub const SYNCED_SURVEYS_LOG_KEY: &str = "synced_surveys_log";

/// CKV-backed, deduplicated append log. The log is one blob, so appends are
/// serialized through a mutex like the survey collection.
pub struct SyncedSurveyLog {
    kv: Arc<CompressedKvStore>,
    write_lock: Mutex<()>,
}

impl SyncedSurveyLog {
    pub fn new(kv: Arc<CompressedKvStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Vec<SyncedSurveyRecord> {
        self.kv
            .load::<Vec<SyncedSurveyRecord>>(SYNCED_SURVEYS_LOG_KEY)
            .await
            .unwrap_or_default()
    }
}

#[async_trait]
impl SyncedSurveyLogTrait for SyncedSurveyLog {
    async fn record(&self, survey_id: &str, user_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;

        let already_logged = entries
            .iter()
            .any(|entry| entry.id == survey_id && entry.user_id == user_id);
        if already_logged {
            return Ok(false);
        }

        entries.push(SyncedSurveyRecord {
            id: survey_id.to_string(),
            user_id: user_id.to_string(),
            synced_at: Utc::now().to_rfc3339(),
        });
        self.kv.save(SYNCED_SURVEYS_LOG_KEY, &entries).await?;
        Ok(true)
    }

    async fn entries(&self) -> Vec<SyncedSurveyRecord> {
        self.load().await
    }
}
