//! Upload payload shaping for the collector endpoint.

use super::{LocalSurvey, SurveyType};

const RESIDENTIAL_KEY: &str = "residentialPropertyAssessments";
const NON_RESIDENTIAL_KEY: &str = "nonResidentialPropertyAssessments";

/// Build the collector request body for one survey.
///
/// Works on a serialized copy of the stored record; the in-memory survey is
/// never mutated. A floor-assessment block that does not apply to the
/// survey's type is stripped before upload (the collector rejects bodies
/// carrying the inapplicable block).
pub fn upload_payload(survey: &LocalSurvey) -> serde_json::Value {
    let mut body = serde_json::to_value(&survey.data).unwrap_or_else(|_| serde_json::json!({}));

    if let Some(map) = body.as_object_mut() {
        match survey.survey_type {
            SurveyType::Residential => {
                map.remove(NON_RESIDENTIAL_KEY);
            }
            SurveyType::NonResidential => {
                map.remove(RESIDENTIAL_KEY);
            }
            SurveyType::Mixed => {}
        }
        map.insert(
            "surveyType".to_string(),
            serde_json::to_value(survey.survey_type).unwrap_or(serde_json::Value::Null),
        );
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveys::{FloorAssessment, SurveyData, SurveyStatus};
    use serde_json::json;

    fn survey(survey_type: SurveyType) -> LocalSurvey {
        let mut data = SurveyData {
            survey_details: json!({ "source": "field" }),
            ..SurveyData::default()
        };
        data.residential_property_assessments.push(FloorAssessment {
            id: "floor_1_a".to_string(),
            fields: serde_json::Map::new(),
        });
        data.non_residential_property_assessments
            .push(FloorAssessment {
                id: "floor_1_b".to_string(),
                fields: serde_json::Map::new(),
            });

        LocalSurvey {
            id: "survey_1_a".to_string(),
            survey_type,
            data,
            status: SurveyStatus::Submitted,
            synced: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn residential_drops_non_residential_block() {
        let payload = upload_payload(&survey(SurveyType::Residential));
        let map = payload.as_object().unwrap();
        assert!(map.contains_key("residentialPropertyAssessments"));
        assert!(!map.contains_key("nonResidentialPropertyAssessments"));
        assert_eq!(map["surveyType"], "Residential");
    }

    #[test]
    fn non_residential_drops_residential_block() {
        let payload = upload_payload(&survey(SurveyType::NonResidential));
        let map = payload.as_object().unwrap();
        assert!(!map.contains_key("residentialPropertyAssessments"));
        assert!(map.contains_key("nonResidentialPropertyAssessments"));
    }

    #[test]
    fn mixed_keeps_both_blocks_and_source_is_untouched() {
        let original = survey(SurveyType::Mixed);
        let payload = upload_payload(&original);
        let map = payload.as_object().unwrap();
        assert!(map.contains_key("residentialPropertyAssessments"));
        assert!(map.contains_key("nonResidentialPropertyAssessments"));
        assert_eq!(original.data.residential_property_assessments.len(), 1);
        assert_eq!(original.data.non_residential_property_assessments.len(), 1);
    }
}
