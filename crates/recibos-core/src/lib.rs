//! Recibos Core Library
//!
//! Core domain models, error types, and configuration shared across the
//! payroll import and release components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
