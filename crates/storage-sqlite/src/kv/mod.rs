//! Compressed key-value store for JSON blobs.
//!
//! Values are stored as zstd-compressed compact JSON under a text key.
//! Loads self-heal: a blob that fails to decompress is retried as raw JSON
//! (the legacy uncompressed format) and rewritten compressed on success;
//! content that parses neither way is discarded so callers never crash on
//! a corrupted cache.

use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use patwari_core::errors::Result;

use crate::db::{get_connection, StoreHandle};
use crate::errors::StorageError;
use crate::schema::kv_entries;

const COMPRESSION_LEVEL: i32 = 0;

#[derive(Insertable)]
#[diesel(table_name = kv_entries)]
struct KvEntryRow {
    key: String,
    value: Vec<u8>,
    updated_at: String,
}

pub struct CompressedKvStore {
    handle: Arc<StoreHandle>,
}

impl CompressedKvStore {
    pub fn new(handle: Arc<StoreHandle>) -> Self {
        Self { handle }
    }

    /// Serialize, compress and upsert `value` under `key`.
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        let blob = zstd::stream::encode_all(Cursor::new(json), COMPRESSION_LEVEL)
            .map_err(StorageError::from)?;
        self.write_blob(key.to_string(), blob).await
    }

    /// Load and decode the value under `key`.
    ///
    /// Returns `None` for a missing key, an unavailable store and corrupted
    /// content alike. Corrupted content is deleted; legacy uncompressed
    /// content is migrated to the compressed format in place.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let blob = self.raw(key)?;

        match zstd::stream::decode_all(Cursor::new(&blob)) {
            Ok(json) => match serde_json::from_slice(&json) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.discard_corrupt(key, &format!("invalid JSON after decompress: {err}"))
                        .await;
                    None
                }
            },
            // Not a zstd frame: try the legacy plain-JSON format.
            Err(_) => match serde_json::from_slice(&blob) {
                Ok(value) => {
                    self.migrate_legacy(key, &blob).await;
                    Some(value)
                }
                Err(err) => {
                    self.discard_corrupt(key, &format!("undecodable content: {err}"))
                        .await;
                    None
                }
            },
        }
    }

    /// Delete the entry under `key`. Missing keys are a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.handle
            .writer()
            .exec(move |conn| {
                diesel::delete(kv_entries::table.find(key))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    /// The stored bytes under `key`, as written. Used by maintenance and
    /// tests; `None` when missing or the store is unavailable.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = get_connection(self.handle.pool()).ok()?;
        kv_entries::table
            .find(key)
            .select(kv_entries::value)
            .first::<Vec<u8>>(&mut conn)
            .optional()
            .unwrap_or_else(|err| {
                warn!("kv read failed for '{key}': {err}");
                None
            })
    }

    async fn write_blob(&self, key: String, blob: Vec<u8>) -> Result<()> {
        self.handle
            .writer()
            .exec(move |conn| {
                let row = KvEntryRow {
                    key,
                    value: blob,
                    updated_at: Utc::now().to_rfc3339(),
                };
                diesel::insert_into(kv_entries::table)
                    .values(&row)
                    .on_conflict(kv_entries::key)
                    .do_update()
                    .set((
                        kv_entries::value.eq(row.value.clone()),
                        kv_entries::updated_at.eq(row.updated_at.clone()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn migrate_legacy(&self, key: &str, raw_json: &[u8]) {
        let compressed = match zstd::stream::encode_all(Cursor::new(raw_json), COMPRESSION_LEVEL) {
            Ok(blob) => blob,
            Err(err) => {
                warn!("kv legacy migration skipped for '{key}': {err}");
                return;
            }
        };
        if let Err(err) = self.write_blob(key.to_string(), compressed).await {
            warn!("kv legacy migration failed for '{key}': {err}");
            return;
        }
        self.handle.events().emit(
            "kv_legacy_migrated",
            serde_json::json!({ "key": key, "bytes": raw_json.len() }),
        );
    }

    async fn discard_corrupt(&self, key: &str, reason: &str) {
        warn!("kv entry '{key}' discarded: {reason}");
        if let Err(err) = self.remove(key).await {
            warn!("kv corrupt entry '{key}' could not be deleted: {err}");
        }
        self.handle.events().emit(
            "kv_corrupt_discarded",
            serde_json::json!({ "key": key, "reason": reason }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreOptions;
    use patwari_core::events::MemoryEventSink;
    use patwari_core::health::SystemClock;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    fn open_store() -> (CompressedKvStore, Arc<MemoryEventSink>, tempfile::TempDir) {
        let dir = tempdir().expect("tempdir");
        let events = Arc::new(MemoryEventSink::new());
        let handle = StoreHandle::open(
            StoreOptions {
                data_dir: dir.path().to_path_buf(),
            },
            Arc::new(SystemClock),
            events.clone(),
        )
        .expect("open store");
        (CompressedKvStore::new(handle), events, dir)
    }

    fn insert_raw(store: &CompressedKvStore, key: &str, bytes: &[u8]) {
        let mut conn = get_connection(store.handle.pool()).expect("conn");
        let row = KvEntryRow {
            key: key.to_string(),
            value: bytes.to_vec(),
            updated_at: Utc::now().to_rfc3339(),
        };
        diesel::insert_into(kv_entries::table)
            .values(&row)
            .execute(&mut conn)
            .expect("insert raw");
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (store, _events, _dir) = open_store();
        let payload = Payload {
            name: "ward-14".to_string(),
            count: 3,
        };

        store.save("bundle", &payload).await.expect("save");
        let loaded: Payload = store.load("bundle").await.expect("load");
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn stored_bytes_are_compressed_not_plain_json() {
        let (store, _events, _dir) = open_store();
        store
            .save("bundle", &Payload { name: "x".to_string(), count: 1 })
            .await
            .expect("save");

        let raw = store.raw("bundle").expect("raw bytes");
        assert!(serde_json::from_slice::<Payload>(&raw).is_err());
        // zstd magic number: 0x28 B5 2F FD
        assert_eq!(raw[..4], [0x28, 0xB5, 0x2F, 0xFD]);
    }

    #[tokio::test]
    async fn corrupted_entry_is_discarded_and_stays_gone() {
        let (store, events, _dir) = open_store();
        insert_raw(&store, "bundle", b"\x01\x02 not json not zstd");

        let first: Option<Payload> = store.load("bundle").await;
        assert!(first.is_none());
        assert!(store.raw("bundle").is_none(), "corrupt key should be cleared");

        let second: Option<Payload> = store.load("bundle").await;
        assert!(second.is_none());
        assert!(events.kinds().contains(&"kv_corrupt_discarded".to_string()));
    }

    #[tokio::test]
    async fn legacy_plain_json_is_read_and_migrated() {
        let (store, events, _dir) = open_store();
        let legacy = serde_json::to_vec(&Payload {
            name: "legacy".to_string(),
            count: 9,
        })
        .unwrap();
        insert_raw(&store, "bundle", &legacy);

        let loaded: Payload = store.load("bundle").await.expect("legacy readable");
        assert_eq!(loaded.name, "legacy");

        let raw = store.raw("bundle").expect("still present");
        assert_eq!(raw[..4], [0x28, 0xB5, 0x2F, 0xFD], "now stored compressed");
        assert!(events.kinds().contains(&"kv_legacy_migrated".to_string()));

        let again: Payload = store.load("bundle").await.expect("post-migration read");
        assert_eq!(again.count, 9);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (store, _events, _dir) = open_store();
        let loaded: Option<Payload> = store.load("absent").await;
        assert!(loaded.is_none());
    }
}
