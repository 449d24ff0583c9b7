use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// Self-service account operations.
#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn profile(&self, ctx: &AuthContext) -> AppResult<UserResponse> {
        let user_id = ctx.require_user()?;
        Ok(self.find(user_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        let user_id = ctx.require_user()?;
        if request.name.is_none()
            && request.email.is_none()
            && request.newsletter_subscribed.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let user = self.find(user_id).await?;
        let mut model = user.into_active_model();

        if let Some(name) = &request.name {
            let name = name.trim();
            if name.len() < 2 || name.len() > 100 {
                return Err(AppError::ValidationError(
                    "Name length must be between 2 and 100 characters".to_string(),
                ));
            }
            model.name = Set(name.to_string());
        }

        if let Some(email) = &request.email {
            let email = email.trim().to_lowercase();
            if email.is_empty() {
                model.email = Set(None);
            } else {
                if !email.contains('@') {
                    return Err(AppError::ValidationError(
                        "Invalid email address".to_string(),
                    ));
                }
                let taken = users::Entity::find()
                    .filter(users::Column::Email.eq(email.as_str()))
                    .filter(users::Column::Id.ne(user_id))
                    .one(&self.pool)
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict(
                        "This email is already registered".to_string(),
                    ));
                }
                model.email = Set(Some(email));
            }
        }

        if let Some(flag) = request.newsletter_subscribed {
            model.newsletter_subscribed = Set(flag);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&self.pool).await?;
        Ok(updated.into())
    }
}
