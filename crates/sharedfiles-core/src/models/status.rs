//! Per-pool status report.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::size::format_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoolHealth {
    Ok,
    Full,
    Error,
}

/// Formatted storage figures (e.g. `"510.00MB"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StorageSummary {
    pub available: String,
    pub used: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilesCount {
    pub by_type: BTreeMap<String, u64>,
    pub total: u64,
}

/// Status of a reachable pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolReport {
    pub name: String,
    pub capacity_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub average_file_size_bytes: u64,
    pub total_size: String,
    pub storage: StorageSummary,
    pub average_file_size: String,
    pub files_count: FilesCount,
    pub status: PoolHealth,
}

impl PoolReport {
    /// Compute the report from live figures.
    ///
    /// Available space saturates at zero when a pool has overshot its ceiling.
    pub fn new(
        name: impl Into<String>,
        capacity_bytes: u64,
        used_bytes: u64,
        by_type: BTreeMap<String, u64>,
    ) -> Self {
        let total: u64 = by_type.values().sum();
        let available_bytes = capacity_bytes.saturating_sub(used_bytes);
        let average = if total > 0 {
            used_bytes as f64 / total as f64
        } else {
            0.0
        };

        Self {
            name: name.into(),
            capacity_bytes,
            used_bytes,
            available_bytes,
            average_file_size_bytes: average as u64,
            total_size: format_size(used_bytes as f64),
            storage: StorageSummary {
                available: format_size(available_bytes as f64),
                used: format_size(used_bytes as f64),
                total: format_size(capacity_bytes as f64),
            },
            average_file_size: format_size(average),
            files_count: FilesCount { by_type, total },
            status: if available_bytes > 0 {
                PoolHealth::Ok
            } else {
                PoolHealth::Full
            },
        }
    }
}

/// Degraded entry for a pool whose live query failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolError {
    pub name: String,
    pub status: PoolHealth,
    pub error: String,
}

impl PoolError {
    pub fn new(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            status: PoolHealth::Error,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PoolStatus {
    Healthy(PoolReport),
    Error(PoolError),
}

impl PoolStatus {
    pub fn name(&self) -> &str {
        match self {
            PoolStatus::Healthy(report) => &report.name,
            PoolStatus::Error(err) => &err.name,
        }
    }

    pub fn health(&self) -> PoolHealth {
        match self {
            PoolStatus::Healthy(report) => report.status,
            PoolStatus::Error(err) => err.status,
        }
    }
}
