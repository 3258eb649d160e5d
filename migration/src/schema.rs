//! 访客表结构定义
//!
//! 迁移与运行时共用同一份建表语句：默认表名 `visitor` 由迁移创建，
//! 自定义表名（支持 `schema.table` 形式）由存储层启动时调用这里的函数创建。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseConnection;

/// 默认表名
pub const DEFAULT_VISITOR_TABLE: &str = "visitor";

/// 将配置中的表名解析为 TableRef（`data.visitor` → schema + table）
pub fn visitor_table_ref(name: &str) -> TableRef {
    match name.split_once('.') {
        Some((schema, table)) => (Alias::new(schema), Alias::new(table)).into_table_ref(),
        None => Alias::new(name).into_table_ref(),
    }
}

/// 索引名需要在库内唯一，使用表名（去掉 schema 前缀）作为前缀
fn index_name(table_name: &str, suffix: &str) -> String {
    let bare = table_name
        .rsplit_once('.')
        .map(|(_, t)| t)
        .unwrap_or(table_name);
    format!("idx_{}_{}", bare, suffix)
}

/// 构建访客表的 CREATE TABLE 语句
pub fn create_visitor_table(table_name: &str) -> TableCreateStatement {
    Table::create()
        .table(visitor_table_ref(table_name))
        .if_not_exists()
        .col(
            ColumnDef::new(Visitor::VisitorId)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        // 插入阶段为 NULL，多个 NULL 不会触发唯一约束
        .col(
            ColumnDef::new(Visitor::Hashids)
                .string_len(255)
                .null()
                .unique_key(),
        )
        .col(ColumnDef::new(Visitor::IpAddress).string_len(45).null())
        .col(ColumnDef::new(Visitor::Hostname).string_len(255).null())
        .col(ColumnDef::new(Visitor::RequestUri).text().null())
        .col(ColumnDef::new(Visitor::HttpReferer).text().null())
        .col(ColumnDef::new(Visitor::RemotePort).string_len(10).null())
        .col(ColumnDef::new(Visitor::UserAgent).text().null())
        .col(
            ColumnDef::new(Visitor::VisitsCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Visitor::LastVisit)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Visitor::Created)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(Visitor::UtmSource).string_len(255).null())
        .col(ColumnDef::new(Visitor::UtmMedium).string_len(255).null())
        .col(ColumnDef::new(Visitor::UtmCampaign).string_len(255).null())
        .col(ColumnDef::new(Visitor::UtmTerm).string_len(255).null())
        .col(ColumnDef::new(Visitor::UtmContent).string_len(255).null())
        .to_owned()
}

/// 创建时间索引（首次访问统计按时间范围查询）
pub fn create_visitor_created_index(table_name: &str) -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(index_name(table_name, "created"))
        .table(visitor_table_ref(table_name))
        .col(Visitor::Created)
        .to_owned()
}

pub fn drop_visitor_created_index(table_name: &str) -> IndexDropStatement {
    Index::drop()
        .name(index_name(table_name, "created"))
        .table(visitor_table_ref(table_name))
        .to_owned()
}

/// 为非默认表名建表（已存在时跳过）
pub async fn ensure_visitor_table(db: &DatabaseConnection, table_name: &str) -> Result<(), DbErr> {
    let manager = SchemaManager::new(db);
    manager.create_table(create_visitor_table(table_name)).await?;
    manager
        .create_index(create_visitor_created_index(table_name))
        .await?;
    Ok(())
}

#[derive(DeriveIden)]
pub enum Visitor {
    #[sea_orm(iden = "visitor")]
    Table,
    VisitorId,
    Hashids,
    IpAddress,
    Hostname,
    RequestUri,
    HttpReferer,
    RemotePort,
    UserAgent,
    VisitsCount,
    LastVisit,
    Created,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmTerm,
    UtmContent,
}
