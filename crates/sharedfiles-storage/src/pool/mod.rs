//! Multi-pool storage.
//!
//! Pools are tried in configuration order. A write lands in the first reachable
//! pool whose used bytes, plus bytes reserved by in-flight writes, plus the new
//! payload fit its capacity. Reads and deletes scan the same order and stop at
//! the first pool that holds the id.
//!
//! Usage checks of one pool are serialised with the reservation that follows
//! them. Writes that finish while a check is running stay counted in the pool's
//! ledger until a check started after them, so a slow check cannot hide them.
//!
//! Every per-pool call is bounded by the pool timeout; a pool that times out or
//! errors is logged and skipped.

mod client;
mod remote;

pub use client::{PoolClient, PoolStats};
pub use remote::ObjectStorePool;

use crate::keys::validate_file_id;
use crate::traits::{Backend, StorageError, StorageResult, StorageStatus, StoredFile};
use async_trait::async_trait;
use bytes::Bytes;
use sharedfiles_core::models::{PoolError, PoolReport, PoolStatus};
use sharedfiles_core::{BackendKind, FileRecord, UploadReceipt};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-process view of writes a usage check may not reflect yet.
#[derive(Default)]
struct Ledger {
    /// Bytes claimed by writes that passed the space check but have not finished.
    reserved: u64,
    /// Bumped every time a write finishes.
    seq: u64,
    /// Finished writes as `(seq, bytes)`, kept until a check that started after them.
    committed: Vec<(u64, u64)>,
}

impl Ledger {
    /// Bytes a check started at `sample_seq` did not see, plus in-flight reservations.
    fn pending_since(&self, sample_seq: u64) -> u64 {
        let unseen: u64 = self
            .committed
            .iter()
            .filter(|(seq, _)| *seq > sample_seq)
            .map(|(_, bytes)| *bytes)
            .sum();
        unseen.saturating_add(self.reserved)
    }

    /// Bytes counted against the pool: sampled usage plus everything the check missed.
    ///
    /// Finished writes the check already saw are dropped. Callers hold the usage
    /// lock, so no earlier check is still relying on them.
    fn effective_used(&mut self, usage: Usage) -> u64 {
        self.committed.retain(|(seq, _)| *seq > usage.sample_seq);
        usage.used.saturating_add(self.pending_since(usage.sample_seq))
    }
}

/// Usage reported by one check, tagged with the ledger sequence at its start.
#[derive(Debug, Clone, Copy)]
struct Usage {
    used: u64,
    sample_seq: u64,
}

/// One capacity-bounded remote store.
pub struct Pool {
    name: String,
    capacity_bytes: u64,
    client: Arc<dyn PoolClient>,
    ledger: Mutex<Ledger>,
    /// Held from the usage check until the reservation, so checks are ordered.
    usage_lock: tokio::sync::Mutex<()>,
}

impl Pool {
    pub fn new(name: impl Into<String>, capacity_bytes: u64, client: Arc<dyn PoolClient>) -> Self {
        Self {
            name: name.into(),
            capacity_bytes,
            client,
            ledger: Mutex::new(Ledger::default()),
            usage_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reserved_bytes(&self) -> u64 {
        self.ledger().reserved
    }

    fn sample_seq(&self) -> u64 {
        self.ledger().seq
    }

    fn free_bytes(&self, usage: Usage) -> u64 {
        let used = self.ledger().effective_used(usage);
        self.capacity_bytes.saturating_sub(used)
    }

    /// Claim `bytes` if they fit next to sampled usage and the ledger.
    fn try_reserve(&self, usage: Usage, bytes: u64) -> Option<Reservation<'_>> {
        let mut ledger = self.ledger();
        let needed = ledger.effective_used(usage).saturating_add(bytes);
        if needed > self.capacity_bytes {
            return None;
        }
        ledger.reserved += bytes;
        Some(Reservation {
            pool: self,
            bytes,
            written: false,
        })
    }
}

/// Releases its bytes when dropped, including when the write is cancelled.
///
/// A reservation whose write succeeded stays counted as a finished write until
/// a later usage check reflects it.
struct Reservation<'a> {
    pool: &'a Pool,
    bytes: u64,
    written: bool,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.written = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut ledger = self.pool.ledger();
        ledger.reserved = ledger.reserved.saturating_sub(self.bytes);
        if self.written {
            ledger.seq += 1;
            let seq = ledger.seq;
            ledger.committed.push((seq, self.bytes));
        }
    }
}

/// Backend spreading files over an ordered list of pools.
pub struct PoolStore {
    pools: Vec<Pool>,
    timeout: Duration,
}

impl PoolStore {
    pub fn new(pools: Vec<Pool>, timeout: Duration) -> StorageResult<Self> {
        if pools.is_empty() {
            return Err(StorageError::ConfigError(
                "At least one storage pool is required".to_string(),
            ));
        }

        Ok(Self { pools, timeout })
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    async fn call<T>(
        &self,
        pool: &Pool,
        operation: &str,
        fut: impl Future<Output = StorageResult<T>>,
    ) -> StorageResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::BackendUnavailable(format!(
                "pool '{}' timed out after {:?} during {}",
                pool.name, self.timeout, operation
            ))),
        }
    }

    /// Bytes of content stored in `pool`.
    pub async fn current_usage(&self, pool: &Pool) -> StorageResult<u64> {
        self.call(pool, "usage", pool.client.used_bytes()).await
    }

    /// Take the usage lock, bounded by the pool timeout.
    async fn lock_usage<'a>(&self, pool: &'a Pool) -> StorageResult<tokio::sync::MutexGuard<'a, ()>> {
        tokio::time::timeout(self.timeout, pool.usage_lock.lock())
            .await
            .map_err(|_| {
                StorageError::BackendUnavailable(format!(
                    "pool '{}' is busy; usage check not started within {:?}",
                    pool.name, self.timeout
                ))
            })
    }

    /// Live usage tagged with the ledger sequence at check start. Usage lock must be held.
    async fn sample_usage(&self, pool: &Pool) -> StorageResult<Usage> {
        let sample_seq = pool.sample_seq();
        let used = self.current_usage(pool).await?;
        Ok(Usage { used, sample_seq })
    }

    /// Free bytes in `pool` after in-flight and unsampled writes.
    async fn free_bytes(&self, pool: &Pool) -> StorageResult<u64> {
        let _guard = self.lock_usage(pool).await?;
        let usage = self.sample_usage(pool).await?;
        Ok(pool.free_bytes(usage))
    }

    /// Whether `pool` can take `additional` more bytes right now. Unreachable pools have no space.
    pub async fn has_space(&self, pool: &Pool, additional: u64) -> bool {
        match self.free_bytes(pool).await {
            Ok(free) => additional <= free,
            Err(e) => {
                tracing::warn!(pool = %pool.name, error = %e, "Pool usage unavailable");
                false
            }
        }
    }
}

#[async_trait]
impl Backend for PoolStore {
    async fn put(
        &self,
        id: &str,
        filename: &str,
        mime_type: &str,
        data: Bytes,
        base_url: &str,
    ) -> StorageResult<UploadReceipt> {
        validate_file_id(id)?;

        let required = data.len() as u64;
        let record = FileRecord::new(id, filename, mime_type, &data, base_url);
        let start = Instant::now();

        let mut reachable = 0usize;
        let mut write_failures = 0usize;

        for pool in &self.pools {
            let reservation = {
                let usage_guard = match self.lock_usage(pool).await {
                    Ok(guard) => guard,
                    Err(e) => {
                        tracing::warn!(pool = %pool.name, error = %e, "Skipping unreachable pool");
                        continue;
                    }
                };
                let usage = match self.sample_usage(pool).await {
                    Ok(usage) => usage,
                    Err(e) => {
                        tracing::warn!(pool = %pool.name, error = %e, "Skipping unreachable pool");
                        continue;
                    }
                };
                reachable += 1;

                let reservation = pool.try_reserve(usage, required);
                drop(usage_guard);
                reservation
            };

            let Some(reservation) = reservation else {
                tracing::debug!(
                    pool = %pool.name,
                    capacity_bytes = pool.capacity_bytes,
                    size_bytes = required,
                    "Pool lacks space, trying next"
                );
                continue;
            };

            match self
                .call(pool, "put", pool.client.put(&record, data.clone()))
                .await
            {
                Ok(()) => {
                    reservation.commit();
                    tracing::info!(
                        pool = %pool.name,
                        file_id = %id,
                        size_bytes = required,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Pool upload successful"
                    );
                    return Ok(UploadReceipt::from(&record));
                }
                Err(e) => {
                    write_failures += 1;
                    tracing::warn!(
                        pool = %pool.name,
                        file_id = %id,
                        error = %e,
                        "Pool write failed, trying next"
                    );
                }
            }
        }

        if reachable == 0 || write_failures > 0 {
            tracing::error!(file_id = %id, size_bytes = required, "No pool accepted the upload");
            return Err(StorageError::BackendUnavailable(
                "no storage pool could accept the write".to_string(),
            ));
        }

        tracing::warn!(file_id = %id, size_bytes = required, "All pools are full");
        Err(StorageError::CapacityExhausted { required })
    }

    async fn get(&self, id: &str) -> StorageResult<StoredFile> {
        validate_file_id(id)?;

        for pool in &self.pools {
            match self.call(pool, "get", pool.client.find(id)).await {
                Ok(Some(file)) => {
                    tracing::debug!(pool = %pool.name, file_id = %id, "File found");
                    return Ok(file);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(pool = %pool.name, file_id = %id, error = %e, "Skipping pool during lookup");
                }
            }
        }

        Err(StorageError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> StorageResult<bool> {
        validate_file_id(id)?;

        for pool in &self.pools {
            match self.call(pool, "delete", pool.client.delete(id)).await {
                Ok(true) => {
                    tracing::info!(pool = %pool.name, file_id = %id, "File deleted");
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(pool = %pool.name, file_id = %id, error = %e, "Skipping pool during delete");
                }
            }
        }

        Ok(false)
    }

    async fn list(&self) -> StorageResult<Vec<FileRecord>> {
        let results = futures::future::join_all(
            self.pools
                .iter()
                .map(|pool| self.call(pool, "list", pool.client.list())),
        )
        .await;

        let mut records = Vec::new();
        for (pool, result) in self.pools.iter().zip(results) {
            match result {
                Ok(mut pool_records) => records.append(&mut pool_records),
                Err(e) => {
                    tracing::warn!(pool = %pool.name, error = %e, "Omitting pool from listing");
                }
            }
        }

        Ok(records)
    }

    async fn status(&self) -> StorageResult<StorageStatus> {
        let results = futures::future::join_all(
            self.pools
                .iter()
                .map(|pool| self.call(pool, "status", pool.client.stats())),
        )
        .await;

        let statuses = self
            .pools
            .iter()
            .zip(results)
            .map(|(pool, result)| match result {
                Ok(stats) => PoolStatus::Healthy(PoolReport::new(
                    &pool.name,
                    pool.capacity_bytes,
                    stats.used_bytes,
                    stats.files_by_type,
                )),
                Err(e) => {
                    tracing::warn!(pool = %pool.name, error = %e, "Pool status unavailable");
                    PoolStatus::Error(PoolError::new(&pool.name, e))
                }
            })
            .collect();

        Ok(StorageStatus::Pools(statuses))
    }

    async fn remaining_capacity(&self) -> StorageResult<u64> {
        let mut best: Option<u64> = None;

        for pool in &self.pools {
            match self.free_bytes(pool).await {
                Ok(free) => {
                    best = Some(best.map_or(free, |b| b.max(free)));
                }
                Err(e) => {
                    tracing::warn!(pool = %pool.name, error = %e, "Pool usage unavailable");
                }
            }
        }

        best.ok_or_else(|| {
            StorageError::BackendUnavailable("no storage pool is reachable".to_string())
        })
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Pool
    }
}
