//! Single-writer actor for the SQLite database.
//!
//! SQLite allows one writer at a time; funneling every mutation through a
//! dedicated thread keeps writes serialized without lock contention on the
//! pool. Each job runs inside an immediate transaction.

use diesel::sqlite::SqliteConnection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use patwari_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;
use crate::db::DbPool;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Transaction error carrier: either the job's own error or a BEGIN/COMMIT
/// failure from diesel.
enum TxError {
    App(Error),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

/// Cloneable handle submitting jobs to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Run a mutation on the writer thread inside an immediate transaction
    /// and await its result.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<Result<T>>();
        let wrapped: Job = Box::new(move |conn| {
            let outcome = conn
                .immediate_transaction::<T, TxError, _>(|tx| job(tx).map_err(TxError::App))
                .map_err(|err| match err {
                    TxError::App(inner) => inner,
                    TxError::Diesel(inner) => Error::from(StorageError::from(inner)),
                });
            let _ = done_tx.send(outcome);
        });

        self.tx.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer actor is no longer running".to_string(),
            ))
        })?;

        done_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer actor dropped the job".to_string(),
            ))
        })?
    }
}

/// Spawn the writer thread over a pool clone and return its handle.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    std::thread::Builder::new()
        .name("patwari-sqlite-writer".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    // Dropping the job resolves the caller's oneshot with an
                    // actor error; the pool may recover for the next job.
                    Err(err) => error!("writer: failed to acquire connection: {err}"),
                }
            }
        })
        .expect("failed to spawn sqlite writer thread");

    WriteHandle { tx }
}
