use std::sync::Arc;

use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::visitor::VisitorStore;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{
    Attribution, MAX_UTM_VALUE_CHARS, NewVisitor, VisitorRecord, storage_timestamp,
    truncate_utm_value,
};

/// `database_url` 取此值时使用进程内存储
pub const MEMORY_BACKEND_URL: &str = "memory";

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn VisitorStore>> {
        let database_url = &config.database_url;

        if database_url == MEMORY_BACKEND_URL {
            info!("Using in-memory visitor storage, data will not survive restarts");
            return Ok(Arc::new(MemoryStorage::new()));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmStorage::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}
