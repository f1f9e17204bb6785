//! Domain models shared by the storage backends and the HTTP layer.

pub mod file;
pub mod status;

pub use file::{FileRecord, UploadReceipt};
pub use status::{FilesCount, PoolError, PoolHealth, PoolReport, PoolStatus, StorageSummary};
