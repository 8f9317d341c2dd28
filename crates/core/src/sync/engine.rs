//! Batch uploader for submitted surveys.
//!
//! Surveys are uploaded strictly in sequence. A confirmed acceptance
//! deletes the local record (which cascades image cleanup) and appends to
//! the audit log; any failure leaves the record untouched and the batch
//! moves on. Retries are user-initiated by re-invoking `sync_all`.

use std::sync::Arc;

use log::{debug, warn};

use crate::events::EventSink;
use crate::surveys::{upload_payload, SurveyRepositoryTrait};
use crate::sync::{SurveyCollectorApi, SyncReport, SyncedSurveyLogTrait};

pub struct SyncEngine {
    repository: Arc<dyn SurveyRepositoryTrait>,
    collector: Arc<dyn SurveyCollectorApi>,
    audit_log: Arc<dyn SyncedSurveyLogTrait>,
    events: Arc<dyn EventSink>,
}

impl SyncEngine {
    pub fn new(
        repository: Arc<dyn SurveyRepositoryTrait>,
        collector: Arc<dyn SurveyCollectorApi>,
        audit_log: Arc<dyn SyncedSurveyLogTrait>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            repository,
            collector,
            audit_log,
            events,
        }
    }

    /// Upload every submitted-and-unsynced survey, one at a time.
    ///
    /// Incomplete surveys are never part of the batch regardless of their
    /// `synced` flag. One failed upload never aborts the rest.
    pub async fn sync_all(&self, token: &str, user_id: &str) -> SyncReport {
        let pending: Vec<_> = self
            .repository
            .get_all()
            .await
            .into_iter()
            .filter(|survey| survey.sync_eligible())
            .collect();

        debug!("sync batch: {} submitted survey(s)", pending.len());
        let mut report = SyncReport::default();

        for survey in pending {
            let payload = upload_payload(&survey);

            match self.collector.submit_survey(token, payload).await {
                Ok(_) => {
                    // Server accepted: the survey counts as synced even if
                    // local cleanup stumbles, so the surveyor is never told
                    // to re-capture an accepted record.
                    if let Err(err) = self.repository.remove(&survey.id).await {
                        warn!("synced survey {} not removed locally: {}", survey.id, err);
                        self.events.emit(
                            "sync_cleanup_failed",
                            serde_json::json!({ "surveyId": survey.id, "error": err.to_string() }),
                        );
                    }
                    if let Err(err) = self.audit_log.record(&survey.id, user_id).await {
                        warn!("synced survey {} not logged: {}", survey.id, err);
                    }
                    report.success_count += 1;
                    self.events.emit(
                        "survey_synced",
                        serde_json::json!({ "surveyId": survey.id, "userId": user_id }),
                    );
                }
                Err(err) => {
                    report.failed_count += 1;
                    self.events.emit(
                        "survey_sync_failed",
                        serde_json::json!({
                            "surveyId": survey.id,
                            "status": err.status_code(),
                            "error": err.to_string(),
                        }),
                    );
                }
            }
        }

        report
    }
}
