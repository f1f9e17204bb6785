//! Backend selection.
//!
//! Pool mode is chosen when `REMOTE_STORAGE_URL` is a valid object-store locator;
//! anything else (unset, empty, unparsable) falls back to local storage. The
//! choice is made once at startup.

use crate::local::LocalStore;
use crate::pool::{ObjectStorePool, Pool, PoolStore};
use crate::traits::{Backend, StorageError, StorageResult};
use object_store::ObjectStoreScheme;
use sharedfiles_core::{BackendKind, Config, PoolConfig};
use std::sync::Arc;
use url::Url;

/// Whether `locator` names a store `object_store` knows how to open.
pub fn is_remote_locator(locator: &str) -> bool {
    Url::parse(locator.trim())
        .ok()
        .is_some_and(|url| ObjectStoreScheme::parse(&url).is_ok())
}

fn usable_pools(config: &Config) -> Vec<&PoolConfig> {
    config
        .pools
        .iter()
        .filter(|pool| {
            let usable = is_remote_locator(&pool.url);
            if !usable {
                tracing::warn!(pool = %pool.name, "Ignoring pool with invalid URL");
            }
            usable
        })
        .collect()
}

/// Decide which backend the configuration asks for.
pub fn select_backend(config: &Config) -> StorageResult<BackendKind> {
    let remote = config
        .remote_storage_url
        .as_deref()
        .is_some_and(is_remote_locator);

    if !remote {
        return Ok(BackendKind::Local);
    }

    if usable_pools(config).is_empty() {
        return Err(StorageError::ConfigError(
            "REMOTE_STORAGE_URL is set but no valid STORAGE_POOL_URL_<NAME> is configured"
                .to_string(),
        ));
    }

    Ok(BackendKind::Pool)
}

/// Create the storage backend based on configuration
pub async fn create_backend(config: &Config) -> StorageResult<Arc<dyn Backend>> {
    match select_backend(config)? {
        BackendKind::Pool => {
            let timeout = config.pool_timeout();
            let pools = usable_pools(config)
                .into_iter()
                .map(|pool| {
                    let client = ObjectStorePool::from_url(&pool.url, timeout)?;
                    Ok(Pool::new(&pool.name, pool.capacity_bytes, Arc::new(client)))
                })
                .collect::<StorageResult<Vec<_>>>()?;

            tracing::info!(
                pools = ?pools.iter().map(|p| p.name()).collect::<Vec<_>>(),
                timeout_secs = timeout.as_secs(),
                "Using pool storage"
            );

            Ok(Arc::new(PoolStore::new(pools, timeout)?))
        }

        BackendKind::Local => {
            tracing::info!(
                path = %config.local_storage_path,
                metadata_db = %config.local_metadata_db,
                capacity_bytes = config.local_capacity_bytes,
                "Using local storage"
            );

            let store = LocalStore::open(
                &config.local_storage_path,
                &config.local_metadata_db,
                config.local_capacity_bytes,
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}
