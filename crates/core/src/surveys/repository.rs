//! Repository contract for the unsynced-surveys collection.

use async_trait::async_trait;

use crate::errors::Result;
use crate::surveys::{LocalSurvey, SurveyDraft};

/// CRUD over the local unsynced-surveys collection.
///
/// Read paths return empty/`None` rather than failing so form screens stay
/// responsive under storage failure; mutations report errors to the caller.
/// Implementations must serialize mutations: the collection is persisted as
/// one blob and concurrent read-modify-write cycles would lose updates.
#[async_trait]
pub trait SurveyRepositoryTrait: Send + Sync {
    /// Upsert by id. An existing record keeps its `status` unless the draft
    /// carries one, and always keeps `created_at` and `synced`. A new
    /// record gets a generated id (when absent), `Incomplete` status and
    /// the current timestamp.
    async fn save(&self, draft: SurveyDraft) -> Result<LocalSurvey>;

    async fn get_all(&self) -> Vec<LocalSurvey>;

    async fn get_by_id(&self, survey_id: &str) -> Option<LocalSurvey>;

    /// Full replacement of the record at `survey_id`, used by floor-detail
    /// screens after mutating a nested assessment sequence.
    async fn update(&self, survey_id: &str, survey: LocalSurvey) -> Result<()>;

    /// Forward-only transition to `Submitted`.
    async fn mark_submitted(&self, survey_id: &str) -> Result<LocalSurvey>;

    /// Delete the record and its images. Image cleanup runs first so a
    /// failure later in the sequence never strands image files.
    async fn remove(&self, survey_id: &str) -> Result<()>;
}
