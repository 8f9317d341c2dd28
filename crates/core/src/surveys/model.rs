//! Offline survey records as captured in the field.

use serde::{Deserialize, Serialize};

use crate::ids::new_floor_id;

/// Kind of property being surveyed. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurveyType {
    Residential,
    NonResidential,
    Mixed,
}

/// Lifecycle status of a local survey. Moves forward only; a submitted
/// survey never reverts to incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Incomplete,
    Submitted,
}

/// Which floor-assessment sequence an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentKind {
    Residential,
    NonResidential,
}

/// One per-floor assessment entry. Carries its own client-generated id,
/// unique within the parent survey, used for in-place edit/delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorAssessment {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// The form payload of a survey: five required sections plus two optional
/// ordered floor-assessment sequences. Section contents are opaque to the
/// store; the collector validates them server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyData {
    #[serde(default)]
    pub survey_details: serde_json::Value,
    #[serde(default)]
    pub property_details: serde_json::Value,
    #[serde(default)]
    pub owner_details: serde_json::Value,
    #[serde(default)]
    pub location_details: serde_json::Value,
    #[serde(default)]
    pub other_details: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub residential_property_assessments: Vec<FloorAssessment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_residential_property_assessments: Vec<FloorAssessment>,
}

impl SurveyData {
    fn assessments_mut(&mut self, kind: AssessmentKind) -> &mut Vec<FloorAssessment> {
        match kind {
            AssessmentKind::Residential => &mut self.residential_property_assessments,
            AssessmentKind::NonResidential => &mut self.non_residential_property_assessments,
        }
    }

    /// Append a floor entry, assigning an id when the caller left it empty.
    /// Returns the entry id.
    pub fn add_floor(&mut self, kind: AssessmentKind, mut entry: FloorAssessment) -> String {
        if entry.id.is_empty() {
            entry.id = new_floor_id();
        }
        let id = entry.id.clone();
        self.assessments_mut(kind).push(entry);
        id
    }

    /// Replace the floor entry with the given id in place, preserving order.
    /// Returns false when no entry matches.
    pub fn update_floor(
        &mut self,
        kind: AssessmentKind,
        floor_id: &str,
        mut entry: FloorAssessment,
    ) -> bool {
        let entries = self.assessments_mut(kind);
        match entries.iter_mut().find(|e| e.id == floor_id) {
            Some(slot) => {
                entry.id = floor_id.to_string();
                *slot = entry;
                true
            }
            None => false,
        }
    }

    /// Remove the floor entry with the given id. Returns false when no
    /// entry matches.
    pub fn remove_floor(&mut self, kind: AssessmentKind, floor_id: &str) -> bool {
        let entries = self.assessments_mut(kind);
        let before = entries.len();
        entries.retain(|e| e.id != floor_id);
        entries.len() != before
    }
}

/// One offline-captured survey pending upload. This is also the exact shape
/// persisted in the unsynced-surveys blob; transient fields attached by UI
/// callers are dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSurvey {
    pub id: String,
    pub survey_type: SurveyType,
    pub data: SurveyData,
    pub status: SurveyStatus,
    #[serde(default)]
    pub synced: bool,
    pub created_at: String,
}

impl LocalSurvey {
    /// Whether this survey is eligible for upload.
    pub fn sync_eligible(&self) -> bool {
        self.status == SurveyStatus::Submitted
    }
}

/// Incoming form save. `id` is absent on first save; `status` is absent
/// unless the caller explicitly changes it (the repository preserves the
/// stored status otherwise).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub survey_type: SurveyType,
    pub data: SurveyData,
    #[serde(default)]
    pub status: Option<SurveyStatus>,
}
