//! HTTP client for the survey collector REST API.

mod client;
mod error;
mod types;

pub use client::*;
pub use error::*;
pub use types::*;
