//! SharedFiles Core Library
//!
//! This crate provides the domain models, error types, configuration and size
//! formatting that are shared across all SharedFiles components.

pub mod config;
pub mod error;
pub mod models;
pub mod size;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, PoolConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileRecord, UploadReceipt};
pub use size::format_size;
pub use storage_types::BackendKind;
