pub mod clusters;
pub mod file_delete;
pub mod file_get;
pub mod file_upload;
pub mod health;
