//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query, UpdateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, ExprTrait, QueryTrait, TransactionTrait};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::new_visitor_to_active_model;
use super::retry;
use crate::codec::TokenCodec;
use crate::errors::{Result, VisitrackError};
use crate::storage::models::{NewVisitor, VisitorRecord, storage_timestamp};
use crate::visitor::token_for;

use migration::entities::visitor;

impl SeaOrmStorage {
    /// 插入新访客（token 为 NULL），返回生成的 id
    async fn insert_on<C: ConnectionTrait>(&self, conn: &C, new: &NewVisitor) -> std::result::Result<i64, DbErr> {
        let mut insert = visitor::Entity::insert(new_visitor_to_active_model(new));
        QueryTrait::query(&mut insert).into_table(self.table_ref());
        let result = insert.exec(conn).await?;
        Ok(result.last_insert_id)
    }

    fn set_token_stmt(&self, visitor_id: i64, token: &str) -> UpdateStatement {
        Query::update()
            .table(self.table_ref())
            .value(visitor::Column::Hashids, token)
            .and_where(Expr::col(visitor::Column::VisitorId).eq(visitor_id))
            .to_owned()
    }

    pub async fn insert_visitor(&self, new: &NewVisitor) -> Result<i64> {
        let new = &NewVisitor {
            created: storage_timestamp(new.created),
            ..new.clone()
        };
        let visitor_id = retry::with_retry("insert_visitor", self.retry_config, || async {
            self.insert_on(&self.db, new).await
        })
        .await
        .map_err(|e| VisitrackError::database_operation(format!("插入访客失败: {}", e)))?;

        debug!("Inserted visitor {}", visitor_id);
        Ok(visitor_id)
    }

    pub async fn set_visitor_token(&self, visitor_id: i64, token: &str) -> Result<()> {
        let stmt = self.set_token_stmt(visitor_id, token);
        let db = &self.db;
        let stmt_ref = &stmt;

        let result = retry::with_retry(
            &format!("set_visitor_token({})", visitor_id),
            self.retry_config,
            || async { db.execute(stmt_ref).await },
        )
        .await
        .map_err(|e| VisitrackError::database_operation(format!("写入访客 token 失败: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(VisitrackError::database_operation(format!(
                "访客不存在，无法写入 token: {}",
                visitor_id
            )));
        }
        Ok(())
    }

    /// 原子更新：`last_visit = at`，`visits_count = visits_count + 1`
    pub async fn touch_visitor(&self, visitor_id: i64, at: DateTime<Utc>) -> Result<()> {
        let at = storage_timestamp(at);
        let stmt = Query::update()
            .table(self.table_ref())
            .value(visitor::Column::LastVisit, at)
            .value(
                visitor::Column::VisitsCount,
                Expr::col(visitor::Column::VisitsCount).add(1),
            )
            .and_where(Expr::col(visitor::Column::VisitorId).eq(visitor_id))
            .to_owned();
        let db = &self.db;
        let stmt_ref = &stmt;

        let result = retry::with_retry(
            &format!("touch_visitor({})", visitor_id),
            self.retry_config,
            || async { db.execute(stmt_ref).await },
        )
        .await
        .map_err(|e| VisitrackError::database_operation(format!("更新访问时间失败: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(VisitrackError::database_operation(format!(
                "访客不存在，无法记录访问: {}",
                visitor_id
            )));
        }
        Ok(())
    }

    /// 在同一事务内插入并回填 token，任一步失败都不会留下无 token 的行
    pub async fn create_visitor_in_txn(
        &self,
        mut new: NewVisitor,
        codec: &TokenCodec,
    ) -> Result<VisitorRecord> {
        new.created = storage_timestamp(new.created);
        let (visitor_id, token) =
            retry::with_retry("create_visitor", self.retry_config, || async {
                let txn = self.db.begin().await?;

                let visitor_id = self.insert_on(&txn, &new).await?;
                let token =
                    token_for(codec, visitor_id).map_err(|e| DbErr::Custom(e.to_string()))?;

                let result = txn.execute(&self.set_token_stmt(visitor_id, &token)).await?;
                if result.rows_affected() != 1 {
                    return Err(DbErr::Custom(format!(
                        "token update affected {} rows for visitor {}",
                        result.rows_affected(),
                        visitor_id
                    )));
                }

                txn.commit().await?;
                Ok((visitor_id, token))
            })
            .await
            .map_err(|e| VisitrackError::database_operation(format!("创建访客失败: {}", e)))?;

        info!("New visitor {} created", visitor_id);
        Ok(new.into_record(visitor_id, Some(token)))
    }
}
