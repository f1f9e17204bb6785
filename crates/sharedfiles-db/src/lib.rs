//! SharedFiles Database Library
//!
//! SQLite metadata store used by the local storage backend: connection setup,
//! schema bootstrap and the `files` table repository.

pub mod db;

pub use db::files::{FileRecordRepository, FileRecordRow};
pub use db::setup::connect_metadata_store;
