//! Survey photograph records and the image store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One captured photograph: a physical file in the image directory paired
/// with this row. `survey_id` is nullable because images may be staged
/// before a survey id exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyImage {
    pub id: i32,
    pub survey_id: Option<String>,
    pub photo_uri: String,
    pub label: String,
    pub timestamp: String,
}

/// File + row co-management for survey photographs.
///
/// Every operation degrades instead of failing: a broken directory, a
/// missing file or an unavailable database never propagates an error to
/// the capture flow.
#[async_trait]
pub trait ImageStoreTrait: Send + Sync {
    /// Copy the source file to a permanent per-survey path and record a
    /// row for it. On any file-system failure the original URI is returned
    /// unchanged and the caller proceeds with the temporary reference.
    async fn store_image(&self, survey_id: &str, source_uri: &str, label: &str) -> String;

    /// All rows for a survey ordered by capture time; empty when the store
    /// is unavailable.
    async fn get_images(&self, survey_id: &str) -> Vec<SurveyImage>;

    /// Best-effort delete of every file for the survey followed by one bulk
    /// row delete. Idempotent; a missing file never blocks row cleanup.
    /// Returns the number of rows removed.
    async fn delete_images(&self, survey_id: &str) -> usize;

    /// Best-effort sweep reconciling the image directory with the rows:
    /// files without a row are deleted, rows whose file is gone are pruned.
    async fn cleanup_orphans(&self);
}
