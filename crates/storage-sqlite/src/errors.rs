//! Storage-layer error type and its mapping into the core error.

use thiserror::Error;

use patwari_core::errors::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Query(inner) => Error::Database(DatabaseError::Query(inner.to_string())),
            StorageError::Pool(inner) => Error::Database(DatabaseError::Pool(inner.to_string())),
            StorageError::Migration(message) => Error::Database(DatabaseError::Internal(message)),
            StorageError::Io(inner) => Error::Database(DatabaseError::Internal(inner.to_string())),
        }
    }
}
