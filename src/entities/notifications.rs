use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// `user_id` set: addressed to that user. Otherwise `admin_id` set: one admin,
/// `admin_id` null: every admin.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub transaction_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
