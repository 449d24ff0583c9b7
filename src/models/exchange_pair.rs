use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    FieldType, PairCategory, exchange_field_entity, exchange_pair_entity, payment_method_entity,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CatalogQuery {
    /// Only active entries (default true)
    pub active_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub icon: Option<String>,
    pub is_active: bool,
}

impl From<payment_method_entity::Model> for PaymentMethodResponse {
    fn from(m: payment_method_entity::Model) -> Self {
        PaymentMethodResponse {
            id: m.id,
            code: m.code,
            name: m.name,
            icon: m.icon,
            is_active: m.is_active,
        }
    }
}

/// One extra form input attached to a pair, options already decoded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExchangeFieldResponse {
    pub id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub field_label: String,
    pub placeholder: Option<String>,
    pub is_required: bool,
    pub options: Option<Vec<String>>,
    pub field_order: i32,
}

impl From<exchange_field_entity::Model> for ExchangeFieldResponse {
    fn from(m: exchange_field_entity::Model) -> Self {
        let options = m.decoded_options();
        ExchangeFieldResponse {
            id: m.id,
            field_name: m.field_name,
            field_type: m.field_type,
            field_label: m.field_label,
            placeholder: m.placeholder,
            is_required: m.is_required,
            options,
            field_order: m.field_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExchangePairResponse {
    pub id: i64,
    pub from_method: PaymentMethodResponse,
    pub to_method: PaymentMethodResponse,
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
    pub fields: Vec<ExchangeFieldResponse>,
    pub created_at: DateTime<Utc>,
}

impl ExchangePairResponse {
    pub fn assemble(
        pair: exchange_pair_entity::Model,
        from_method: payment_method_entity::Model,
        to_method: payment_method_entity::Model,
        fields: Vec<exchange_field_entity::Model>,
    ) -> Self {
        ExchangePairResponse {
            id: pair.id,
            from_method: from_method.into(),
            to_method: to_method.into(),
            fee_percentage: pair.fee_percentage,
            tax_amount: pair.tax_amount,
            min_amount: pair.min_amount,
            max_amount: pair.max_amount,
            category: pair.category,
            requires_additional_info: pair.requires_additional_info,
            automatic_processing: pair.automatic_processing,
            is_active: pair.is_active,
            payment_syntax_type: pair.payment_syntax_type,
            payment_syntax_value: pair.payment_syntax_value,
            instruction_title: pair.instruction_title,
            instruction_content: pair.instruction_content,
            instruction_link_url: pair.instruction_link_url,
            instruction_link_text: pair.instruction_link_text,
            from_number_label: pair.from_number_label,
            from_number_placeholder: pair.from_number_placeholder,
            to_number_label: pair.to_number_label,
            to_number_placeholder: pair.to_number_placeholder,
            show_to_number: pair.show_to_number,
            amount_label: pair.amount_label,
            amount_placeholder: pair.amount_placeholder,
            reference_required: pair.reference_required,
            reference_label: pair.reference_label,
            reference_placeholder: pair.reference_placeholder,
            fields: fields.into_iter().map(Into::into).collect(),
            created_at: pair.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateExchangeFieldRequest {
    pub field_name: String,
    pub field_type: FieldType,
    pub field_label: String,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateExchangePairRequest {
    pub from_method_id: i64,
    pub to_method_id: i64,
    pub fee_percentage: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub category: Option<PairCategory>,
    #[serde(default)]
    pub requires_additional_info: bool,
    #[serde(default)]
    pub automatic_processing: bool,
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
    pub show_to_number: Option<bool>,
    pub amount_label: Option<String>,
    pub amount_placeholder: Option<String>,
    pub reference_required: Option<bool>,
    pub reference_label: Option<String>,
    pub reference_placeholder: Option<String>,
    pub validated_email_template_id: Option<i64>,
    pub rejected_email_template_id: Option<i64>,
    #[serde(default)]
    pub fields: Vec<CreateExchangeFieldRequest>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePaymentMethodRequest {
    /// Upper-case identifier, e.g. `TMONEY`
    pub code: String,
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePaymentMethodRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial update of a pair. Absent values are left unchanged; a present `fields` list
/// replaces every extra field of the pair.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateExchangePairRequest {
    pub fee_percentage: Option<f64>,
    pub tax_amount: Option<f64>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub category: Option<PairCategory>,
    pub requires_additional_info: Option<bool>,
    pub automatic_processing: Option<bool>,
    pub is_active: Option<bool>,
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
    pub show_to_number: Option<bool>,
    pub amount_label: Option<String>,
    pub amount_placeholder: Option<String>,
    pub reference_required: Option<bool>,
    pub reference_label: Option<String>,
    pub reference_placeholder: Option<String>,
    pub validated_email_template_id: Option<i64>,
    pub rejected_email_template_id: Option<i64>,
    pub fields: Option<Vec<CreateExchangeFieldRequest>>,
}
