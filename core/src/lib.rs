//! Food catalog, consumption log, and nutrient rollups over a local SQLite file.

pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod nutrition;
pub mod service;

pub use error::{Error, Result};
