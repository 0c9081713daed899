//! RagFlow Core Library
//!
//! This crate provides the foundational utilities for the RagFlow pipeline:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Pipeline configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
