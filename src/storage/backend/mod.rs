//! SeaORM storage backend
//!
//! This module provides visitor storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//!
//! 表名可配置：查询在实体定义的基础上替换目标表，列引用保持不变。

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod visitor_store;

use sea_orm::sea_query::{Alias, TableRef};
use sea_orm::{DatabaseConnection, EntityName, EntityTrait, QueryTrait, Select};
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{Result, VisitrackError};
use migration::entities::visitor;
use migration::schema::visitor_table_ref;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_record, new_visitor_to_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(VisitrackError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based visitor storage
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    table_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str, config: &DatabaseConfig) -> Result<Self> {
        if database_url.is_empty() {
            return Err(VisitrackError::database_config(
                "database.database_url 未设置".to_string(),
            ));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config).await?
        } else {
            connect_generic(database_url, backend_name, config).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            table_name: config.table_name.clone(),
            retry_config: retry::RetryConfig::from(config),
        };

        run_migrations(&storage.db, &storage.table_name).await?;

        warn!(
            "{} Storage initialized (table: {}).",
            storage.backend_name.to_uppercase(),
            storage.table_name
        );
        Ok(storage)
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn table_ref(&self) -> TableRef {
        visitor_table_ref(&self.table_name)
    }

    /// 指向配置表的 SELECT，以实体表名作别名，列限定符保持有效
    fn select(&self) -> Select<visitor::Entity> {
        let mut select = visitor::Entity::find();
        QueryTrait::query(&mut select)
            .from_clear()
            .from_as(self.table_ref(), Alias::new(visitor::Entity.table_name()));
        select
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://v.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("sqlite::memory:").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("visitrack.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("mariadb://u@h/db").unwrap(), "mysql");
        assert_eq!(infer_backend_from_url("postgresql://u@h/db").unwrap(), "postgres");
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }
}
