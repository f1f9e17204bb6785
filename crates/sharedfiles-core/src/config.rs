//! Configuration module
//!
//! Process configuration is read once from the environment (and an optional
//! `.env` file) at startup. Storage pools are discovered from every
//! `STORAGE_POOL_URL_<NAME>` variable.

use std::env;
use std::time::Duration;

// Common constants
const SERVER_PORT: u16 = 8000;
const POOL_CAPACITY_MB: u64 = 512;
const POOL_TIMEOUT_SECS: u64 = 5;
const LOCAL_CAPACITY_MB: u64 = 100;
const LOCAL_STORAGE_PATH: &str = "./uploads";
const LOCAL_METADATA_DB: &str = "metadata.db";

const POOL_URL_PREFIX: &str = "STORAGE_POOL_URL_";
const POOL_CAPACITY_PREFIX: &str = "STORAGE_POOL_CAPACITY_MB_";

const MB: u64 = 1024 * 1024;

/// Server settings not tied to storage
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
}

/// One configured remote pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Display name, lowercased from the variable suffix
    pub name: String,
    /// Object store locator, e.g. `s3://bucket/prefix` or `memory:///`
    pub url: String,
    pub capacity_bytes: u64,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    /// Shared secret expected in the `auth` header of mutating requests
    pub authorization_token: String,
    /// Upload size limit enforced at the HTTP boundary
    pub max_file_size_bytes: u64,
    /// Overrides the request host when building file URLs
    pub public_base_url: Option<String>,
    /// Remote connection string; a valid object-store locator selects pool mode
    pub remote_storage_url: Option<String>,
    /// Pools in priority order
    pub pools: Vec<PoolConfig>,
    pub pool_timeout_secs: u64,
    pub local_storage_path: String,
    pub local_metadata_db: String,
    pub local_capacity_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
        };

        let default_pool_capacity_mb = env::var("STORAGE_POOL_CAPACITY_MB")
            .unwrap_or_else(|_| POOL_CAPACITY_MB.to_string())
            .parse()
            .unwrap_or(POOL_CAPACITY_MB);

        let config = Config {
            base,
            authorization_token: env::var("AUTHORIZATION")
                .map_err(|_| anyhow::anyhow!("AUTHORIZATION must be set"))?,
            max_file_size_bytes: env::var("MAX_FILE_SIZE")
                .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE must be set"))?
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE must be a number of bytes"))?,
            public_base_url: env::var("PUBLIC_BASE_URL").ok().filter(|s| !s.is_empty()),
            remote_storage_url: env::var("REMOTE_STORAGE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            pools: pool_configs_from_vars(env::vars(), default_pool_capacity_mb)?,
            pool_timeout_secs: env::var("POOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| POOL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(POOL_TIMEOUT_SECS),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| LOCAL_STORAGE_PATH.to_string()),
            local_metadata_db: env::var("LOCAL_METADATA_DB")
                .unwrap_or_else(|_| LOCAL_METADATA_DB.to_string()),
            local_capacity_bytes: mb_to_bytes(
                "LOCAL_CAPACITY_MB",
                env::var("LOCAL_CAPACITY_MB")
                    .unwrap_or_else(|_| LOCAL_CAPACITY_MB.to_string())
                    .parse()
                    .unwrap_or(LOCAL_CAPACITY_MB),
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.authorization_token.trim().is_empty() {
            return Err(anyhow::anyhow!("AUTHORIZATION must not be empty"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE must be greater than 0"));
        }

        if self.pool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("POOL_TIMEOUT_SECS must be greater than 0"));
        }

        if self.local_capacity_bytes == 0 {
            return Err(anyhow::anyhow!("LOCAL_CAPACITY_MB must be greater than 0"));
        }

        if let Some(pool) = self.pools.iter().find(|p| p.capacity_bytes == 0) {
            return Err(anyhow::anyhow!(
                "Pool '{}' must have a capacity greater than 0",
                pool.name
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }
}

/// Convert a megabyte setting to bytes, rejecting values that do not fit in `u64`.
fn mb_to_bytes(var: &str, mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", var, mb))
}

/// Collect pool definitions from `STORAGE_POOL_URL_<NAME>` variables.
///
/// Pools are ordered by name, which makes the write priority stable across
/// restarts. `STORAGE_POOL_CAPACITY_MB_<NAME>` overrides the default capacity
/// for a single pool. Empty URLs are ignored.
pub fn pool_configs_from_vars<I>(
    vars: I,
    default_capacity_mb: u64,
) -> Result<Vec<PoolConfig>, anyhow::Error>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();

    let capacity_for = |name: &str| -> Result<u64, anyhow::Error> {
        let override_mb = vars
            .iter()
            .find(|(key, _)| {
                key.strip_prefix(POOL_CAPACITY_PREFIX)
                    .is_some_and(|suffix| suffix.to_lowercase() == name)
            })
            .and_then(|(_, value)| value.trim().parse::<u64>().ok());

        match override_mb {
            Some(mb) => mb_to_bytes(&format!("{}{}", POOL_CAPACITY_PREFIX, name.to_uppercase()), mb),
            None => mb_to_bytes("STORAGE_POOL_CAPACITY_MB", default_capacity_mb),
        }
    };

    let mut pools = Vec::new();
    for (key, value) in &vars {
        let Some(name) = key.strip_prefix(POOL_URL_PREFIX).map(str::to_lowercase) else {
            continue;
        };
        let url = value.trim();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        pools.push(PoolConfig {
            capacity_bytes: capacity_for(&name)?,
            name,
            url: url.to_string(),
        });
    }

    pools.sort_by(|a, b| a.name.cmp(&b.name));
    pools.dedup_by(|a, b| a.name == b.name);
    Ok(pools)
}
