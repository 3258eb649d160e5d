//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{ColumnTrait, QueryFilter, QuerySelect};

use super::converters::model_to_record;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, VisitrackError};
use crate::storage::models::VisitorRecord;

use migration::entities::visitor;

impl SeaOrmStorage {
    /// id 与 token 同时匹配才返回记录，匹配行数不为 1 视为校验失败
    pub async fn find_visitor(&self, visitor_id: i64, token: &str) -> Result<Option<VisitorRecord>> {
        let db = &self.db;

        let mut models = retry::with_retry(
            &format!("find_visitor({})", visitor_id),
            self.retry_config,
            || async {
                self.select()
                    .filter(visitor::Column::VisitorId.eq(visitor_id))
                    .filter(visitor::Column::Hashids.eq(token))
                    .limit(2)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| VisitrackError::database_operation(format!("查询访客失败: {}", e)))?;

        if models.len() != 1 {
            return Ok(None);
        }
        Ok(models.pop().map(model_to_record))
    }

    pub async fn get_visitor(&self, visitor_id: i64) -> Result<Option<VisitorRecord>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("get_visitor({})", visitor_id),
            self.retry_config,
            || async {
                self.select()
                    .filter(visitor::Column::VisitorId.eq(visitor_id))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| VisitrackError::database_operation(format!("查询访客失败: {}", e)))?;

        Ok(model.map(model_to_record))
    }

    pub async fn count_visitors(&self) -> Result<u64> {
        let db = &self.db;

        let total: Option<i64> = retry::with_retry("count_visitors", self.retry_config, || async {
            self.select()
                .select_only()
                .column_as(visitor::Column::VisitorId.count(), "total")
                .into_tuple::<i64>()
                .one(db)
                .await
        })
        .await
        .map_err(|e| VisitrackError::database_operation(format!("统计访客失败: {}", e)))?;

        Ok(total.unwrap_or(0).max(0) as u64)
    }
}
