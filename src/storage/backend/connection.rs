use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Result, VisitrackError};
use migration::{Migrator, MigratorTrait};

/// 连接 SQLite 数据库（不存在时自动创建，启用 WAL）
pub async fn connect_sqlite(database_url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
    };
    use std::str::FromStr;

    let url = normalize_sqlite_url(database_url);
    let in_memory = url.contains(":memory:");

    let mut opt = SqliteConnectOptions::from_str(&url)
        .map_err(|e| VisitrackError::database_config(format!("SQLite URL 解析失败: {}", e)))?
        .create_if_missing(true)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .pragma("cache_size", "-16000")
        .pragma("temp_store", "memory");
    if !in_memory {
        opt = opt.journal_mode(SqliteJournalMode::Wal);
    }

    // 内存库每个连接各自独立，只能使用单连接
    let max_connections = if in_memory { 1 } else { config.pool_size.max(1) };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(config.timeout))
        .connect_with(opt)
        .await
        .map_err(|e| {
            VisitrackError::database_connection(format!("无法连接到 SQLite 数据库: {}", e))
        })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// `visitrack.db` 这类裸路径补全为 `sqlite://` URL
fn normalize_sqlite_url(database_url: &str) -> String {
    if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else if database_url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}?mode=rwc", database_url)
    }
}

/// 连接 MySQL / PostgreSQL
pub async fn connect_generic(
    database_url: &str,
    backend_name: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection> {
    let pool_size = config.pool_size.max(1);

    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(pool_size)
        .min_connections(pool_size.min(5))
        .connect_timeout(Duration::from_secs(config.timeout))
        .acquire_timeout(Duration::from_secs(config.timeout))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        VisitrackError::database_connection(format!(
            "无法连接到 {} 数据库: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

/// 运行迁移，非默认表名时额外建表
pub async fn run_migrations(db: &DatabaseConnection, table_name: &str) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| VisitrackError::database_operation(format!("迁移失败: {}", e)))?;

    if table_name != migration::schema::DEFAULT_VISITOR_TABLE {
        migration::schema::ensure_visitor_table(db, table_name)
            .await
            .map_err(|e| {
                VisitrackError::database_operation(format!(
                    "创建访客表 '{}' 失败: {}",
                    table_name, e
                ))
            })?;
        info!("Visitor table '{}' ready", table_name);
    }

    info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sqlite_url() {
        assert_eq!(normalize_sqlite_url("visitrack.db"), "sqlite://visitrack.db?mode=rwc");
        assert_eq!(normalize_sqlite_url(":memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/v.db?mode=rwc"),
            "sqlite:///tmp/v.db?mode=rwc"
        );
    }
}
