use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Get the global configuration if it has been initialized
pub fn try_get_config() -> Option<Arc<StaticConfig>> {
    CONFIG.get().map(|c| c.load_full())
}

/// Initialize the global configuration
///
/// Loads `path` (default "config.toml") plus `VT__*` environment variables and
/// validates the result. Calling it again after a successful initialization is
/// a no-op.
///
/// # Examples
/// ```no_run
/// use visitrack::config::init_config;
/// init_config(None).unwrap();
/// ```
pub fn init_config(path: Option<&str>) -> Result<()> {
    if CONFIG.get().is_some() {
        return Ok(());
    }
    let config = StaticConfig::load(path)?;
    let _ = CONFIG.set(ArcSwap::from_pointee(config));
    Ok(())
}

/// Install an already-built configuration (tests and embedding)
pub fn init_config_with(config: StaticConfig) {
    match CONFIG.get() {
        Some(current) => current.store(Arc::new(config)),
        None => {
            let _ = CONFIG.set(ArcSwap::from_pointee(config));
        }
    }
}
