//! Visitor entity
//!
//! 一行对应一个被 cookie 识别的访客。`hashids` 列保存由 `visitor_id`
//! 派生的公开 token，插入阶段为 NULL，随后在同一事务内回填。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "visitor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub visitor_id: i64,
    #[sea_orm(unique, nullable)]
    pub hashids: Option<String>,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub request_uri: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub http_referer: Option<String>,
    pub remote_port: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub visits_count: i64,
    pub last_visit: DateTimeUtc,
    pub created: DateTimeUtc,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
