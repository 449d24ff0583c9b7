use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::config_entity;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigEntryResponse {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<config_entity::Model> for ConfigEntryResponse {
    fn from(m: config_entity::Model) -> Self {
        ConfigEntryResponse {
            key: m.key,
            value: m.value,
            description: m.description,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateConfigRequest {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateConfigRequest {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}
