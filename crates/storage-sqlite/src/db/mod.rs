//! Connection management, embedded migrations and the per-process store
//! handle.

pub mod write_actor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use patwari_core::errors::{DatabaseError, Error, Result};
use patwari_core::events::{EventSink, LogEventSink};
use patwari_core::health::{Clock, HealthCell, SystemClock};

use crate::errors::StorageError;

pub use write_actor::{spawn_writer, WriteHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DB_FILE_NAME: &str = "patwari.db";
const IMAGE_DIR_NAME: &str = "survey_images";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Ensure the data directory exists and return the database file path.
pub fn init(data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(data_dir).map_err(StorageError::from)?;
    let db_path = Path::new(data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

/// Run pending embedded migrations against the database file.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Failed opening database for migration: {e}"
        )))
    })?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(())
}

/// Build the connection pool for the database file.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(StorageError::from)?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    pool.get().map_err(StorageError::from).map_err(Error::from)
}

/// Where the store keeps its files.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub data_dir: PathBuf,
}

/// Per-process handle over the local store.
///
/// Owns the pool, the single-writer actor, the image directory and the
/// shared availability cell. Constructed once at startup and injected into
/// the repositories; there is no ambient global state.
pub struct StoreHandle {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    image_dir: PathBuf,
    health: HealthCell,
    events: Arc<dyn EventSink>,
}

impl StoreHandle {
    /// Open (or create) the store under `options.data_dir` and run
    /// migrations. The handle is ready once this returns.
    pub fn open(
        options: StoreOptions,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Result<Arc<Self>> {
        let data_dir = options.data_dir.to_string_lossy().to_string();
        let db_path = init(&data_dir)?;
        run_migrations(&db_path)?;
        let pool = create_pool(&db_path)?;
        let writer = spawn_writer(pool.as_ref().clone());

        Ok(Arc::new(Self {
            pool,
            writer,
            image_dir: options.data_dir.join(IMAGE_DIR_NAME),
            health: HealthCell::new(clock),
            events,
        }))
    }

    /// Open with the wall clock and `log`-backed event sink.
    pub fn open_default(options: StoreOptions) -> Result<Arc<Self>> {
        Self::open(
            options,
            Arc::new(SystemClock),
            Arc::new(LogEventSink),
        )
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    pub fn writer(&self) -> &WriteHandle {
        &self.writer
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn health(&self) -> &HealthCell {
        &self.health
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }
}
