//! Application state shared by every handler.

use sharedfiles_core::Config;
use sharedfiles_storage::Backend;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Storage backend chosen at startup
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        Self { config, backend }
    }
}
