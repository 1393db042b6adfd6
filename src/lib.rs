//! Calibration and accuracy statistics for prediction markets.
//!
//! [`stats`] is the pure computation core. [`db`] and [`api`] wrap it in a
//! SQLite snapshot store and a JSON service.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod stats;
pub mod types;

pub use error::{AppError, Result};
