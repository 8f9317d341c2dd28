//! Database models for the survey-images table.

use diesel::prelude::*;

use patwari_core::images::SurveyImage;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::survey_images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SurveyImageDB {
    pub id: i32,
    pub survey_id: Option<String>,
    pub photo_uri: String,
    pub label: String,
    pub timestamp: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::survey_images)]
pub struct NewSurveyImageDB {
    pub survey_id: Option<String>,
    pub photo_uri: String,
    pub label: String,
    pub timestamp: String,
}

impl From<SurveyImageDB> for SurveyImage {
    fn from(row: SurveyImageDB) -> Self {
        SurveyImage {
            id: row.id,
            survey_id: row.survey_id,
            photo_uri: row.photo_uri,
            label: row.label,
            timestamp: row.timestamp,
        }
    }
}
