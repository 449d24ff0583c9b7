use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::entities::{TransactionStatus, transaction_entity, transaction_history_entity};

/// Answers to a pair's extra form inputs, keyed by `field_name`.
pub type DynamicFields = Map<String, Value>;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub amount: f64,
    pub payment_reference: String,
    pub exchange_pair_id: Option<i64>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    /// Legacy T-Money to Flooz flow
    pub tmoney_number: Option<String>,
    pub flooz_number: Option<String>,
    pub bookmaker_id: Option<String>,
    pub notes: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub dynamic_fields: Option<DynamicFields>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessingInfo {
    pub mode: ProcessingMode,
    pub message: String,
}

impl ProcessingInfo {
    pub fn for_flag(automatic: bool) -> Self {
        if automatic {
            ProcessingInfo {
                mode: ProcessingMode::Automatic,
                message: "This exchange is processed automatically".to_string(),
            }
        } else {
            ProcessingInfo {
                mode: ProcessingMode::Manual,
                message: "This exchange will be reviewed by an administrator".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub id: i64,
    pub transaction_id: String,
    pub amount: f64,
    pub percentage: f64,
    pub commission: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub status: TransactionStatus,
    pub processing_info: ProcessingInfo,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateTransactionRequest {
    /// `validated` or `rejected`
    pub status: TransactionStatus,
    pub comment: Option<String>,
    pub admin_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateTransactionResponse {
    pub status: String,
    pub transaction_id: String,
    pub new_status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
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
    #[schema(value_type = Option<Object>)]
    pub dynamic_fields: Option<Value>,
    pub status: TransactionStatus,
    pub admin_message: Option<String>,
    pub validated_by: Option<i64>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        let dynamic_fields = m.dynamic_fields.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| log::warn!("Transaction {} has undecodable dynamic fields: {e}", m.id))
                .ok()
        });
        TransactionResponse {
            id: m.id,
            transaction_id: m.transaction_id,
            user_id: m.user_id,
            tmoney_number: m.tmoney_number,
            flooz_number: m.flooz_number,
            from_number: m.from_number,
            to_number: m.to_number,
            amount: m.amount,
            percentage: m.percentage,
            tax_amount: m.tax_amount,
            total_amount: m.total_amount,
            payment_reference: m.payment_reference,
            bookmaker_id: m.bookmaker_id,
            notes: m.notes,
            exchange_pair_id: m.exchange_pair_id,
            dynamic_fields,
            status: m.status,
            admin_message: m.admin_message,
            validated_by: m.validated_by,
            validated_at: m.validated_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionHistoryResponse {
    pub id: i64,
    pub status: TransactionStatus,
    pub comment: Option<String>,
    pub changed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_history_entity::Model> for TransactionHistoryResponse {
    fn from(m: transaction_history_entity::Model) -> Self {
        TransactionHistoryResponse {
            id: m.id,
            status: m.status,
            comment: m.comment,
            changed_by: m.changed_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionDetailResponse {
    pub transaction: TransactionResponse,
    /// Newest first
    pub history: Vec<TransactionHistoryResponse>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransactionQuery {
    pub status: Option<TransactionStatus>,
    pub user_id: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckReferenceQuery {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckReferenceResponse {
    pub used: bool,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct TransactionStats {
    pub total: i64,
    pub pending: i64,
    pub validated: i64,
    pub rejected: i64,
    /// Sum of validated `total_amount`
    pub validated_total_amount: f64,
    /// Fees earned on validated transactions, tax included (`total_amount - amount`)
    pub validated_commission: f64,
    pub total_users: i64,
}
