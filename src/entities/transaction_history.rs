use super::transactions::TransactionStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Append-only: rows are inserted next to every status change and never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transaction_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub transaction_id: i64,
    pub status: TransactionStatus,
    pub comment: Option<String>,
    pub changed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
