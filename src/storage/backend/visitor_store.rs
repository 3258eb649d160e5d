//! VisitorStore implementation for SeaOrmStorage

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SeaOrmStorage;
use crate::codec::TokenCodec;
use crate::errors::Result;
use crate::storage::models::{NewVisitor, VisitorRecord};
use crate::visitor::VisitorStore;

#[async_trait]
impl VisitorStore for SeaOrmStorage {
    fn backend_name(&self) -> &str {
        &self.backend_name
    }

    async fn find_by_id_and_token(
        &self,
        visitor_id: i64,
        token: &str,
    ) -> Result<Option<VisitorRecord>> {
        self.find_visitor(visitor_id, token).await
    }

    async fn insert(&self, visitor: &NewVisitor) -> Result<i64> {
        self.insert_visitor(visitor).await
    }

    async fn set_token(&self, visitor_id: i64, token: &str) -> Result<()> {
        self.set_visitor_token(visitor_id, token).await
    }

    async fn touch_last_visit(&self, visitor_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.touch_visitor(visitor_id, at).await
    }

    async fn fetch_by_id(&self, visitor_id: i64) -> Result<Option<VisitorRecord>> {
        self.get_visitor(visitor_id).await
    }

    async fn count(&self) -> Result<u64> {
        self.count_visitors().await
    }

    async fn close(&self) -> Result<()> {
        self.db.clone().close().await?;
        Ok(())
    }

    async fn create_visitor(
        &self,
        visitor: NewVisitor,
        codec: &TokenCodec,
    ) -> Result<VisitorRecord> {
        self.create_visitor_in_txn(visitor, codec).await
    }
}
