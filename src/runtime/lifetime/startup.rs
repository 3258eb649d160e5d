use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::services::AppState;
use crate::config::StaticConfig;
use crate::storage::StorageFactory;
use crate::visitor::VisitorStore;

pub struct StartupContext {
    pub store: Arc<dyn VisitorStore>,
    pub state: AppState,
}

/// 打开存储后端（CLI 与服务器共用）
pub async fn open_store(config: &StaticConfig) -> Result<Arc<dyn VisitorStore>> {
    let store = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", store.backend_name());
    Ok(store)
}

/// 准备服务器启动的上下文
/// 包括存储和解析器
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = open_store(config).await?;

    let state = AppState::from_config(config, store.clone())
        .context("Failed to build visitor resolver")?;
    debug!(
        "Visitor resolver ready: cookie '{}', {} bot patterns",
        state.resolver.cookie_settings().name,
        state.resolver.bots().patterns().len()
    );

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(StartupContext { store, state })
}
