//! Tracing initialization
//!
//! `RUST_LOG` controls filtering; without it the service logs its own crates at
//! debug level. Production environments get JSON lines, everything else the
//! human-readable formatter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "sharedfiles=debug,tower_http=debug";

fn is_production(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Install the global tracing subscriber.
pub fn init_telemetry(environment: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = is_production(environment);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .try_init()?;

    tracing::debug!(environment = %environment, json, "Tracing initialized");
    Ok(())
}
