//! CKV-backed caches: reference data and the synced-surveys audit log.

mod reference;
mod synced_log;

pub use reference::*;
pub use synced_log::*;
