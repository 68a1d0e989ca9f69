pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
