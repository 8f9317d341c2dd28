//! CKV-backed repository for the unsynced-surveys collection.

mod repository;

pub use repository::*;
