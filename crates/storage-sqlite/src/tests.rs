//! End-to-end tests over the real store: survey capture, image files and
//! the sync engine against a scripted collector.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use patwari_core::errors::{Error, Result};
use patwari_core::events::MemoryEventSink;
use patwari_core::health::SystemClock;
use patwari_core::images::ImageStoreTrait;
use patwari_core::surveys::{SurveyData, SurveyDraft, SurveyRepositoryTrait, SurveyStatus, SurveyType};
use patwari_core::sync::{SurveyCollectorApi, SyncEngine, SyncedSurveyLogTrait};

use crate::cache::SyncedSurveyLog;
use crate::db::{StoreHandle, StoreOptions};
use crate::images::ImageRepository;
use crate::kv::CompressedKvStore;
use crate::surveys::LocalSurveyRepository;

struct ScriptedCollector {
    fail_for: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCollector {
    fn accepting() -> Self {
        Self {
            fail_for: vec![],
            calls: Mutex::new(vec![]),
        }
    }

    fn failing_for(ids: &[&str]) -> Self {
        Self {
            fail_for: ids.iter().map(|id| id.to_string()).collect(),
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SurveyCollectorApi for ScriptedCollector {
    async fn submit_survey(
        &self,
        _token: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = payload["surveyDetails"]["localId"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        self.calls.lock().unwrap().push(id.clone());
        if self.fail_for.contains(&id) {
            return Err(Error::collector(503, "collector unavailable"));
        }
        Ok(serde_json::json!({ "id": 1001 }))
    }
}

struct Harness {
    repository: Arc<LocalSurveyRepository>,
    images: Arc<ImageRepository>,
    audit: Arc<SyncedSurveyLog>,
    dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let handle = StoreHandle::open(
        StoreOptions {
            data_dir: dir.path().to_path_buf(),
        },
        Arc::new(SystemClock),
        Arc::new(MemoryEventSink::new()),
    )
    .expect("open store");

    let kv = Arc::new(CompressedKvStore::new(handle.clone()));
    let images = Arc::new(ImageRepository::new(handle));
    let repository = Arc::new(LocalSurveyRepository::new(
        kv.clone(),
        images.clone(),
        Arc::new(MemoryEventSink::new()),
    ));
    let audit = Arc::new(SyncedSurveyLog::new(kv));

    Harness {
        repository,
        images,
        audit,
        dir,
    }
}

fn engine(harness: &Harness, collector: Arc<ScriptedCollector>) -> SyncEngine {
    SyncEngine::new(
        harness.repository.clone(),
        collector,
        harness.audit.clone(),
        Arc::new(MemoryEventSink::new()),
    )
}

async fn captured_survey(harness: &Harness, holding: &str, submitted: bool) -> String {
    let record = harness
        .repository
        .save(SurveyDraft {
            id: None,
            survey_type: SurveyType::Residential,
            data: SurveyData::default(),
            status: None,
        })
        .await
        .expect("save survey");

    // Stamp the id into the payload so the scripted collector can key on it.
    let mut updated = record.clone();
    updated.data.survey_details = serde_json::json!({ "localId": record.id, "holding": holding });
    harness
        .repository
        .update(&record.id, updated)
        .await
        .expect("update survey");

    if submitted {
        harness
            .repository
            .mark_submitted(&record.id)
            .await
            .expect("mark submitted");
    }
    record.id
}

fn capture_file(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, b"jpeg-bytes").expect("write capture");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn successful_sync_deletes_survey_and_its_images() {
    let hx = harness();
    let survey_id = captured_survey(&hx, "H-1", true).await;

    let source = capture_file(hx.dir.path(), "front.jpg");
    let stored = hx.images.store_image(&survey_id, &source, "front").await;
    assert!(Path::new(&stored).exists());

    let report = engine(&hx, Arc::new(ScriptedCollector::accepting()))
        .sync_all("token", "user-7")
        .await;

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 0);
    assert!(hx.repository.get_by_id(&survey_id).await.is_none());
    assert!(hx.images.get_images(&survey_id).await.is_empty());
    assert!(!Path::new(&stored).exists(), "image file deleted with record");
    assert_eq!(hx.audit.synced_ids_for_user("user-7").await, [survey_id]);
}

#[tokio::test]
async fn failed_upload_keeps_survey_and_batch_accounting_is_exact() {
    let hx = harness();
    let first = captured_survey(&hx, "H-1", true).await;
    let second = captured_survey(&hx, "H-2", true).await;
    let third = captured_survey(&hx, "H-3", true).await;

    let collector = Arc::new(ScriptedCollector::failing_for(&[&second]));
    let report = engine(&hx, collector.clone()).sync_all("token", "user-7").await;

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(collector.calls.lock().unwrap().len(), 3);

    assert!(hx.repository.get_by_id(&first).await.is_none());
    assert!(hx.repository.get_by_id(&third).await.is_none());

    let kept = hx.repository.get_by_id(&second).await.expect("retained");
    assert_eq!(kept.status, SurveyStatus::Submitted);
    assert!(!kept.synced);

    // A later retry drains the remainder, and the audit log stays deduped.
    let retry = engine(&hx, Arc::new(ScriptedCollector::accepting()))
        .sync_all("token", "user-7")
        .await;
    assert_eq!(retry.success_count, 1);
    assert_eq!(hx.audit.entries().await.len(), 3);
}

#[tokio::test]
async fn incomplete_survey_is_invisible_to_sync() {
    let hx = harness();
    let incomplete = captured_survey(&hx, "H-1", false).await;

    let collector = Arc::new(ScriptedCollector::accepting());
    let report = engine(&hx, collector.clone()).sync_all("token", "user-7").await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failed_count, 0);
    assert!(collector.calls.lock().unwrap().is_empty());
    assert!(hx.repository.get_by_id(&incomplete).await.is_some());
}

#[tokio::test]
async fn user_delete_cascades_image_cleanup_like_sync_does() {
    let hx = harness();
    let survey_id = captured_survey(&hx, "H-1", false).await;
    let source = capture_file(hx.dir.path(), "khasra.jpg");
    let stored = hx.images.store_image(&survey_id, &source, "khasra").await;

    hx.repository.remove(&survey_id).await.expect("remove");

    assert!(hx.repository.get_by_id(&survey_id).await.is_none());
    assert!(!Path::new(&stored).exists());
    assert!(hx.images.get_images(&survey_id).await.is_empty());
}
