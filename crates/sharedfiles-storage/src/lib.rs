//! SharedFiles Storage Library
//!
//! This crate provides the storage-routing layer: the `Backend` trait and its two
//! implementations.
//!
//! - [`PoolStore`] spreads files over an ordered list of capacity-bounded object
//!   stores. Writes go to the first pool with room; reads and deletes scan the
//!   pools in the same order.
//! - [`LocalStore`] keeps files in one directory and their metadata in a SQLite
//!   table, under a single per-file ceiling.
//!
//! [`create_backend`] picks one of them at startup from the configuration.
//!
//! # File ids
//!
//! Ids are generated by the caller and used verbatim as storage keys. They must be
//! a single path component: no `/`, `\`, `..` or empty ids. Validation lives in
//! the `keys` module so all backends agree.

pub(crate) mod keys;
pub mod local;
pub mod pool;
pub mod router;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStore;
pub use pool::{ObjectStorePool, Pool, PoolClient, PoolStats, PoolStore};
pub use router::{create_backend, is_remote_locator, select_backend};
pub use sharedfiles_core::BackendKind;
pub use traits::{Backend, StorageError, StorageResult, StorageStatus, StoredFile};
