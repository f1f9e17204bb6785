//! Database access for the local metadata table.
//!
//! `setup` opens the SQLite file and applies the embedded schema; `files` holds
//! the repository for the `files` table.

pub mod files;
pub mod setup;
