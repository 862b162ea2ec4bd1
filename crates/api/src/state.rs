//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::store::{AccountStore, DeviceStore, ModuleStore, ShareCodeStore};

/// Handles injected into every handler. Stores are trait objects so the
/// backing engine (Redis in production, in-memory in tests) is a wiring
/// decision, not something handlers know about.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub sharing: Arc<dyn ShareCodeStore>,
    pub modules: Arc<dyn ModuleStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        accounts: Arc<dyn AccountStore>,
        devices: Arc<dyn DeviceStore>,
        sharing: Arc<dyn ShareCodeStore>,
        modules: Arc<dyn ModuleStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            accounts,
            devices,
            sharing,
            modules,
        }
    }
}
