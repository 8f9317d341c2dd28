//! Image store: physical files in the image directory paired with rows in
//! `survey_images`.
//!
//! Capture must never fail a survey save: file-system trouble returns the
//! caller's temporary URI unchanged, and database trouble flips the shared
//! handle to degraded so follow-up calls short-circuit until the cooldown
//! elapses. A file without a row (or a row without a file) is a recoverable
//! state swept up by `cleanup_orphans`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::{debug, warn};

use patwari_core::errors::Result;
use patwari_core::images::{ImageStoreTrait, SurveyImage};

use crate::db::{get_connection, StoreHandle};
use crate::errors::StorageError;
use crate::images::model::{NewSurveyImageDB, SurveyImageDB};
use crate::schema::survey_images;

pub struct ImageRepository {
    handle: Arc<StoreHandle>,
}

impl ImageRepository {
    pub fn new(handle: Arc<StoreHandle>) -> Self {
        Self { handle }
    }

    fn permanent_path(&self, survey_id: &str, label: &str, source: &Path) -> PathBuf {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        self.handle.image_dir().join(format!(
            "{survey_id}_{label}_{}.{extension}",
            Utc::now().timestamp_millis()
        ))
    }

    fn emit_degraded(&self, operation: &str, detail: &str) {
        self.handle.events().emit(
            "image_store_degraded",
            serde_json::json!({ "operation": operation, "detail": detail }),
        );
    }

    /// Record a database failure: start the cooldown and emit the event.
    fn record_db_failure(&self, operation: &str, detail: &str) {
        warn!("image store {operation} failed: {detail}");
        self.handle.health().record_failure();
        self.emit_degraded(operation, detail);
    }

    async fn insert_row(&self, row: NewSurveyImageDB) -> Result<SurveyImageDB> {
        self.handle
            .writer()
            .exec(move |conn| {
                diesel::insert_into(survey_images::table)
                    .values(&row)
                    .returning(SurveyImageDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)
                    .map_err(Into::into)
            })
            .await
    }

    fn rows_for_survey(&self, survey_id: &str) -> Result<Vec<SurveyImageDB>> {
        let mut conn = get_connection(self.handle.pool())?;
        let rows = survey_images::table
            .filter(survey_images::survey_id.eq(survey_id))
            .order(survey_images::timestamp.asc())
            .load::<SurveyImageDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows)
    }

    fn all_rows(&self) -> Result<Vec<SurveyImageDB>> {
        let mut conn = get_connection(self.handle.pool())?;
        let rows = survey_images::table
            .load::<SurveyImageDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows)
    }

    async fn delete_rows_by_id(&self, ids: Vec<i32>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.handle
            .writer()
            .exec(move |conn| {
                diesel::delete(survey_images::table.filter(survey_images::id.eq_any(ids)))
                    .execute(conn)
                    .map_err(StorageError::from)
                    .map_err(Into::into)
            })
            .await
    }
}

#[async_trait]
impl ImageStoreTrait for ImageRepository {
    async fn store_image(&self, survey_id: &str, source_uri: &str, label: &str) -> String {
        // Idempotent directory create; on failure the caller keeps its
        // temporary reference.
        if let Err(err) = std::fs::create_dir_all(self.handle.image_dir()) {
            self.emit_degraded("store_image", &format!("image dir unavailable: {err}"));
            return source_uri.to_string();
        }

        let source = Path::new(source_uri);
        let destination = self.permanent_path(survey_id, label, source);
        if let Err(err) = std::fs::copy(source, &destination) {
            self.emit_degraded("store_image", &format!("copy failed: {err}"));
            return source_uri.to_string();
        }
        let stored_uri = destination.to_string_lossy().to_string();

        if !self.handle.health().available() {
            // The file is in place; the sweep reconciles the missing row
            // once the store recovers.
            self.emit_degraded("store_image", "row insert skipped while degraded");
            return stored_uri;
        }

        let row = NewSurveyImageDB {
            survey_id: Some(survey_id.to_string()),
            photo_uri: stored_uri.clone(),
            label: label.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        match self.insert_row(row).await {
            Ok(inserted) => {
                debug!(
                    "stored image {} for survey {} (label {})",
                    inserted.id, survey_id, label
                );
            }
            Err(err) => {
                // File persists without a row; recoverable by the sweep.
                self.record_db_failure("store_image", &err.to_string());
            }
        }

        stored_uri
    }

    async fn get_images(&self, survey_id: &str) -> Vec<SurveyImage> {
        if !self.handle.health().available() {
            return Vec::new();
        }
        match self.rows_for_survey(survey_id) {
            Ok(rows) => rows.into_iter().map(SurveyImage::from).collect(),
            Err(err) => {
                self.record_db_failure("get_images", &err.to_string());
                Vec::new()
            }
        }
    }

    async fn delete_images(&self, survey_id: &str) -> usize {
        if !self.handle.health().available() {
            self.emit_degraded("delete_images", "skipped while degraded");
            return 0;
        }

        let rows = match self.rows_for_survey(survey_id) {
            Ok(rows) => rows,
            Err(err) => {
                self.record_db_failure("delete_images", &err.to_string());
                return 0;
            }
        };
        if rows.is_empty() {
            return 0;
        }

        for row in &rows {
            // A file already gone must not block row cleanup.
            if let Err(err) = std::fs::remove_file(&row.photo_uri) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("image file {} not deleted: {err}", row.photo_uri);
                }
            }
        }

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        match self.delete_rows_by_id(ids).await {
            Ok(deleted) => {
                debug!("deleted {deleted} image row(s) for survey {survey_id}");
                deleted
            }
            Err(err) => {
                self.record_db_failure("delete_images", &err.to_string());
                0
            }
        }
    }

    async fn cleanup_orphans(&self) {
        if !self.handle.health().available() {
            return;
        }

        let rows = match self.all_rows() {
            Ok(rows) => rows,
            Err(err) => {
                self.record_db_failure("cleanup_orphans", &err.to_string());
                return;
            }
        };

        let referenced: HashSet<PathBuf> =
            rows.iter().map(|row| PathBuf::from(&row.photo_uri)).collect();

        // Files with no row: delete.
        let mut removed_files = 0usize;
        if let Ok(entries) = std::fs::read_dir(self.handle.image_dir()) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() || referenced.contains(&path) {
                    continue;
                }
                match std::fs::remove_file(&path) {
                    Ok(()) => removed_files += 1,
                    Err(err) => warn!("orphan file {} not deleted: {err}", path.display()),
                }
            }
        }

        // Rows whose file is gone: prune. Rows staged without a survey id
        // but with a live file are left alone.
        let dead_row_ids: Vec<i32> = rows
            .iter()
            .filter(|row| !Path::new(&row.photo_uri).exists())
            .map(|row| row.id)
            .collect();
        let pruned = match self.delete_rows_by_id(dead_row_ids).await {
            Ok(count) => count,
            Err(err) => {
                self.record_db_failure("cleanup_orphans", &err.to_string());
                0
            }
        };

        if removed_files > 0 || pruned > 0 {
            self.handle.events().emit(
                "image_orphans_swept",
                serde_json::json!({ "files": removed_files, "rows": pruned }),
            );
        }
    }
}
