//! File + row co-management for survey photographs.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
