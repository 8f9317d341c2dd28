//! Sync domain models and the batch upload engine.

mod engine;
mod model;

pub use engine::*;
pub use model::*;
