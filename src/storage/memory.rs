//! 进程内访客存储
//!
//! 用于测试和 `database_url = "memory"`，重启后数据丢失。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::errors::{Result, VisitrackError};
use crate::storage::models::{NewVisitor, VisitorRecord};
use crate::visitor::VisitorStore;

pub struct MemoryStorage {
    visitors: DashMap<i64, VisitorRecord>,
    /// token → visitor_id，模拟数据库的唯一约束
    tokens: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            visitors: DashMap::new(),
            tokens: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// 测试辅助：所有记录快照（按 id 排序）
    pub fn snapshot(&self) -> Vec<VisitorRecord> {
        let mut records: Vec<VisitorRecord> =
            self.visitors.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.visitor_id);
        records
    }
}

#[async_trait]
impl VisitorStore for MemoryStorage {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn find_by_id_and_token(
        &self,
        visitor_id: i64,
        token: &str,
    ) -> Result<Option<VisitorRecord>> {
        Ok(self
            .visitors
            .get(&visitor_id)
            .filter(|r| r.token.as_deref() == Some(token))
            .map(|r| r.value().clone()))
    }

    async fn insert(&self, visitor: &NewVisitor) -> Result<i64> {
        let visitor_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.visitors
            .insert(visitor_id, visitor.clone().into_record(visitor_id, None));
        debug!("Inserted visitor {} into memory storage", visitor_id);
        Ok(visitor_id)
    }

    async fn set_token(&self, visitor_id: i64, token: &str) -> Result<()> {
        let mut record = self.visitors.get_mut(&visitor_id).ok_or_else(|| {
            VisitrackError::database_operation(format!(
                "Visitor {} not found when setting token",
                visitor_id
            ))
        })?;

        match self.tokens.entry(token.to_string()) {
            Entry::Occupied(existing) if *existing.get() != visitor_id => {
                return Err(VisitrackError::database_operation(format!(
                    "Token already assigned to visitor {}",
                    existing.get()
                )));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(visitor_id);
            }
        }

        record.token = Some(token.to_string());
        Ok(())
    }

    async fn touch_last_visit(&self, visitor_id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut record = self.visitors.get_mut(&visitor_id).ok_or_else(|| {
            VisitrackError::database_operation(format!(
                "Visitor {} not found when recording visit",
                visitor_id
            ))
        })?;
        record.last_visit = at;
        record.visits_count += 1;
        Ok(())
    }

    async fn fetch_by_id(&self, visitor_id: i64) -> Result<Option<VisitorRecord>> {
        Ok(self.visitors.get(&visitor_id).map(|r| r.value().clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.visitors.len() as u64)
    }
}
