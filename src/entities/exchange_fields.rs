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
pub enum FieldType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "number")]
    Number,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "tel")]
    Tel,
    #[sea_orm(string_value = "select")]
    Select,
    #[sea_orm(string_value = "textarea")]
    Textarea,
    #[sea_orm(string_value = "date")]
    Date,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "exchange_fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exchange_pair_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub field_label: String,
    pub placeholder: Option<String>,
    pub is_required: bool,
    /// JSON-encoded list of allowed values for `select` fields.
    pub options: Option<String>,
    pub field_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn decoded_options(&self) -> Option<Vec<String>> {
        let raw = self.options.as_deref()?;
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!(
                    "Exchange field {} has undecodable options: {e}",
                    self.id
                );
                None
            }
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
