//! The unsynced-surveys collection.
//!
//! The whole collection is persisted as one compressed blob under a
//! well-known key, so every mutation is a read-modify-write cycle guarded
//! by a single in-process mutex. Image cleanup runs before a record is
//! dropped so a failure later in the sequence never strands files.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use patwari_core::errors::{Error, Result};
use patwari_core::events::EventSink;
use patwari_core::ids::new_survey_id;
use patwari_core::images::ImageStoreTrait;
use patwari_core::surveys::{
    LocalSurvey, SurveyDraft, SurveyRepositoryTrait, SurveyStatus,
};

use crate::kv::CompressedKvStore;

/// Key holding the serialized collection.
pub const UNSYNCED_SURVEYS_KEY: &str = "unsynced_surveys";

pub struct LocalSurveyRepository {
    kv: Arc<CompressedKvStore>,
    images: Arc<dyn ImageStoreTrait>,
    events: Arc<dyn EventSink>,
    // Serializes read-modify-write cycles on the collection blob.
    write_lock: Mutex<()>,
}

impl LocalSurveyRepository {
    pub fn new(
        kv: Arc<CompressedKvStore>,
        images: Arc<dyn ImageStoreTrait>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            kv,
            images,
            events,
            write_lock: Mutex::new(()),
        }
    }

    async fn load_collection(&self) -> Vec<LocalSurvey> {
        self.kv
            .load::<Vec<LocalSurvey>>(UNSYNCED_SURVEYS_KEY)
            .await
            .unwrap_or_default()
    }

    async fn persist_collection(&self, surveys: &[LocalSurvey]) -> Result<()> {
        self.kv.save(UNSYNCED_SURVEYS_KEY, &surveys).await
    }
}

#[async_trait]
impl SurveyRepositoryTrait for LocalSurveyRepository {
    async fn save(&self, draft: SurveyDraft) -> Result<LocalSurvey> {
        let _guard = self.write_lock.lock().await;
        let mut surveys = self.load_collection().await;

        let draft_id = draft.id.filter(|id| !id.is_empty());
        let record = match draft_id
            .as_deref()
            .and_then(|id| surveys.iter().position(|s| s.id == id))
        {
            Some(index) => {
                let existing = &surveys[index];
                let record = LocalSurvey {
                    id: existing.id.clone(),
                    // The type is fixed at creation; a re-save never changes it.
                    survey_type: existing.survey_type,
                    data: draft.data,
                    status: draft.status.unwrap_or(existing.status),
                    synced: existing.synced,
                    created_at: existing.created_at.clone(),
                };
                surveys[index] = record.clone();
                record
            }
            None => {
                let record = LocalSurvey {
                    id: draft_id.unwrap_or_else(new_survey_id),
                    survey_type: draft.survey_type,
                    data: draft.data,
                    status: draft.status.unwrap_or(SurveyStatus::Incomplete),
                    synced: false,
                    created_at: Utc::now().to_rfc3339(),
                };
                surveys.push(record.clone());
                record
            }
        };

        self.persist_collection(&surveys).await?;
        debug!("saved survey {} ({} unsynced)", record.id, surveys.len());
        Ok(record)
    }

    async fn get_all(&self) -> Vec<LocalSurvey> {
        self.load_collection().await
    }

    async fn get_by_id(&self, survey_id: &str) -> Option<LocalSurvey> {
        self.load_collection()
            .await
            .into_iter()
            .find(|s| s.id == survey_id)
    }

    async fn update(&self, survey_id: &str, mut survey: LocalSurvey) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut surveys = self.load_collection().await;

        let index = surveys
            .iter()
            .position(|s| s.id == survey_id)
            .ok_or_else(|| Error::NotFound(format!("survey '{survey_id}'")))?;

        // Replacement semantics, but identity is the caller-addressed id.
        survey.id = survey_id.to_string();
        surveys[index] = survey;
        self.persist_collection(&surveys).await
    }

    async fn mark_submitted(&self, survey_id: &str) -> Result<LocalSurvey> {
        let _guard = self.write_lock.lock().await;
        let mut surveys = self.load_collection().await;

        let record = surveys
            .iter_mut()
            .find(|s| s.id == survey_id)
            .ok_or_else(|| Error::NotFound(format!("survey '{survey_id}'")))?;

        if record.status != SurveyStatus::Submitted {
            record.status = SurveyStatus::Submitted;
        }
        let updated = record.clone();
        self.persist_collection(&surveys).await?;

        self.events.emit(
            "survey_submitted",
            serde_json::json!({ "surveyId": survey_id }),
        );
        Ok(updated)
    }

    async fn remove(&self, survey_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // Images first: if persisting the shrunken collection fails, the
        // survey record survives and a retry cleans up the rest.
        let removed_images = self.images.delete_images(survey_id).await;

        let mut surveys = self.load_collection().await;
        let before = surveys.len();
        surveys.retain(|s| s.id != survey_id);
        if surveys.len() != before {
            self.persist_collection(&surveys).await?;
        }

        self.events.emit(
            "survey_removed",
            serde_json::json!({ "surveyId": survey_id, "images": removed_images }),
        );
        Ok(())
    }
}
