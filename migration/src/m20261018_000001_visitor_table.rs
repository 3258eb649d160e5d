//! 访客表迁移
//!
//! 创建 visitor 表：
//! - visitor_id 自增主键
//! - hashids 唯一公开 token（可空，两阶段写入）
//! - 首次访问的描述信息与 UTM 归因
//! - created 索引

use sea_orm_migration::prelude::*;

use crate::schema::{
    DEFAULT_VISITOR_TABLE, create_visitor_created_index, create_visitor_table,
    drop_visitor_created_index, visitor_table_ref,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(create_visitor_table(DEFAULT_VISITOR_TABLE))
            .await?;

        manager
            .create_index(create_visitor_created_index(DEFAULT_VISITOR_TABLE))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(drop_visitor_created_index(DEFAULT_VISITOR_TABLE))
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(visitor_table_ref(DEFAULT_VISITOR_TABLE))
                    .to_owned(),
            )
            .await
    }
}
