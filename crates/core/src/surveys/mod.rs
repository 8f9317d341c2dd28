//! Local survey domain models and repository contract.

mod model;
mod payload;
mod repository;

pub use model::*;
pub use payload::*;
pub use repository::*;
