use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Validated => write!(f, "validated"),
            TransactionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub user_id: i64,
    pub tmoney_number: Option<String>,
    pub flooz_number: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub amount: f64,
    pub percentage: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub payment_reference: String,
    pub bookmaker_id: Option<String>,
    pub notes: Option<String>,
    pub exchange_pair_id: Option<i64>,
    /// JSON object of answers to the pair's extra fields.
    pub dynamic_fields: Option<String>,
    pub status: TransactionStatus,
    pub admin_message: Option<String>,
    pub validated_by: Option<i64>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn commission(&self) -> f64 {
        self.total_amount - self.amount - self.tax_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
