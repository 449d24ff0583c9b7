use crate::entities::config_entity as config;
use crate::error::{AppError, AppResult};
use crate::models::ConfigEntryResponse;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

pub const COMMISSION_PERCENTAGE: &str = "commission_percentage";
pub const MIN_AMOUNT: &str = "min_amount";
pub const MAX_AMOUNT: &str = "max_amount";
pub const MONTHLY_LIMIT_WITHOUT_KYC: &str = "monthly_limit_without_kyc";
pub const MONTHLY_LIMIT_WITH_KYC: &str = "monthly_limit_with_kyc";

/// Keys readable without authentication.
const PUBLIC_KEYS: &[&str] = &[
    COMMISSION_PERCENTAGE,
    MIN_AMOUNT,
    MAX_AMOUNT,
    MONTHLY_LIMIT_WITHOUT_KYC,
    MONTHLY_LIMIT_WITH_KYC,
];

/// Flat key/value business settings stored in the `config` table.
#[derive(Clone)]
pub struct ConfigService {
    pool: DatabaseConnection,
}

impl ConfigService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Self::get_in(&self.pool, key).await
    }

    pub(crate) async fn get_in<C: ConnectionTrait>(conn: &C, key: &str) -> AppResult<Option<String>> {
        let row = config::Entity::find()
            .filter(config::Column::Key.eq(key))
            .one(conn)
            .await?;
        Ok(row.map(|r| r.value))
    }

    /// Numeric setting; a present but unparsable value is a configuration error.
    pub async fn get_f64(&self, key: &str) -> AppResult<Option<f64>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                AppError::ConfigError(format!("Config value for '{key}' is not a number: {raw}"))
            }),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<ConfigEntryResponse>> {
        let rows = config::Entity::find()
            .order_by_asc(config::Column::Key)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_public(&self, key: &str) -> AppResult<ConfigEntryResponse> {
        if !PUBLIC_KEYS.contains(&key) {
            return Err(AppError::NotFound(format!("Config key '{key}' not found")));
        }
        let row = config::Entity::find()
            .filter(config::Column::Key.eq(key))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Config key '{key}' not found")))?;
        Ok(row.into())
    }

    pub async fn set(&self, key: &str, value: &str) -> AppResult<ConfigEntryResponse> {
        // every public key is a non-negative amount or percentage
        if PUBLIC_KEYS.contains(&key) && !value.trim().parse::<f64>().is_ok_and(|v| v >= 0.0) {
            return Err(AppError::ValidationError(format!(
                "Config '{key}' must be a non-negative number"
            )));
        }

        let row = config::Entity::find()
            .filter(config::Column::Key.eq(key))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Config key '{key}' not found")))?;

        let mut am = row.into_active_model();
        am.value = Set(value.to_string());
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;
        log::info!("Config '{key}' updated");
        Ok(updated.into())
    }

    pub async fn create(
        &self,
        key: &str,
        value: &str,
        description: Option<String>,
    ) -> AppResult<ConfigEntryResponse> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::ValidationError("Config key is required".to_string()));
        }
        if self.get(key).await?.is_some() {
            return Err(AppError::Conflict(format!("Config key '{key}' already exists")));
        }

        let created = config::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            description: Set(description),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Config '{key}' created");
        Ok(created.into())
    }
}
