use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum PairCategory {
    #[sea_orm(string_value = "money_exchange")]
    MoneyExchange,
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "subscription")]
    Subscription,
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "bank_service")]
    BankService,
    #[sea_orm(string_value = "card_order")]
    CardOrder,
    #[sea_orm(string_value = "money_transfer")]
    MoneyTransfer,
}

impl std::fmt::Display for PairCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairCategory::MoneyExchange => write!(f, "money_exchange"),
            PairCategory::Credit => write!(f, "credit"),
            PairCategory::Subscription => write!(f, "subscription"),
            PairCategory::Purchase => write!(f, "purchase"),
            PairCategory::BankService => write!(f, "bank_service"),
            PairCategory::CardOrder => write!(f, "card_order"),
            PairCategory::MoneyTransfer => write!(f, "money_transfer"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchange_pairs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub from_method_id: i64,
    pub to_method_id: i64,
    pub fee_percentage: f64,
    pub tax_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub category: Option<PairCategory>,
    pub requires_additional_info: bool,
    pub automatic_processing: bool,
    pub is_active: bool,
    pub payment_syntax_type: Option<String>,
    pub payment_syntax_value: Option<String>,
    pub instruction_title: Option<String>,
    pub instruction_content: Option<String>,
    pub instruction_link_url: Option<String>,
    pub instruction_link_text: Option<String>,
    pub from_number_label: Option<String>,
    pub from_number_placeholder: Option<String>,
    pub to_number_label: Option<String>,
    pub to_number_placeholder: Option<String>,
    pub show_to_number: bool,
    pub amount_label: Option<String>,
    pub amount_placeholder: Option<String>,
    pub reference_required: bool,
    pub reference_label: Option<String>,
    pub reference_placeholder: Option<String>,
    pub validated_email_template_id: Option<i64>,
    pub rejected_email_template_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_subscription(&self) -> bool {
        self.category == Some(PairCategory::Subscription)
    }

    /// Pairs without a category are treated as plain money exchanges.
    pub fn is_money_exchange(&self) -> bool {
        matches!(self.category, None | Some(PairCategory::MoneyExchange))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
