use std::collections::HashMap;

use crate::entities::{notification_entity as notifications, push_subscription_entity as subscriptions};
use crate::error::{AppError, AppResult};
use crate::external::PushMessage;
use crate::models::{
    AuthContext, NewNotification, NotificationListResponse, NotificationResponse,
    UnreadCountResponse,
};
use crate::services::delivery::{DeliveryJob, DeliveryQueue};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const LIST_LIMIT: u64 = 50;
const UNREAD_LIMIT: u64 = 10;

/// In-app notifications plus push fan-out through the delivery queue.
#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
    delivery: DeliveryQueue,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection, delivery: DeliveryQueue) -> Self {
        Self { pool, delivery }
    }

    /// Insert a notification on `conn` without publishing pushes; callers inside a database
    /// transaction publish with [`Self::publish_push`] after commit.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        new: NewNotification,
    ) -> AppResult<notifications::Model> {
        let model = notifications::ActiveModel {
            user_id: Set(new.user_id),
            admin_id: Set(new.admin_id),
            notification_type: Set(new.notification_type),
            title: Set(new.title),
            message: Set(new.message),
            is_read: Set(false),
            transaction_id: Set(new.transaction_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(model)
    }

    pub async fn create(&self, new: NewNotification) -> AppResult<notifications::Model> {
        let model = Self::insert_in(&self.pool, new).await?;
        self.publish_push(&model).await;
        Ok(model)
    }

    /// Queue a push for every device registered to the notification's audience.
    /// Failures are logged only.
    pub async fn publish_push(&self, notification: &notifications::Model) {
        let audience = match (notification.user_id, notification.admin_id) {
            (Some(user_id), _) => Condition::all().add(subscriptions::Column::UserId.eq(user_id)),
            (None, Some(admin_id)) => {
                Condition::all().add(subscriptions::Column::AdminId.eq(admin_id))
            }
            // broadcast to every admin device
            (None, None) => Condition::all().add(subscriptions::Column::AdminId.is_not_null()),
        };

        let targets = match subscriptions::Entity::find()
            .filter(audience)
            .all(&self.pool)
            .await
        {
            Ok(list) => list,
            Err(e) => {
                log::error!(
                    "Could not load push subscriptions for notification {}: {e}",
                    notification.id
                );
                return;
            }
        };

        let mut data = HashMap::new();
        data.insert("notification_id".to_string(), notification.id.to_string());
        data.insert("type".to_string(), notification.notification_type.clone());
        if let Some(tx_id) = notification.transaction_id {
            data.insert("transaction_id".to_string(), tx_id.to_string());
        }
        let message = PushMessage {
            title: notification.title.clone(),
            body: notification.message.clone(),
            data,
        };

        for sub in targets {
            self.delivery.publish(DeliveryJob::Push {
                subscription_id: sub.id,
                token: sub.token,
                message: message.clone(),
            });
        }
    }

    fn scope(ctx: &AuthContext) -> Condition {
        if ctx.is_admin() {
            Condition::any()
                .add(notifications::Column::AdminId.eq(ctx.subject_id))
                .add(
                    Condition::all()
                        .add(notifications::Column::AdminId.is_null())
                        .add(notifications::Column::UserId.is_null()),
                )
        } else {
            Condition::all().add(notifications::Column::UserId.eq(ctx.subject_id))
        }
    }

    pub async fn list(&self, ctx: &AuthContext) -> AppResult<NotificationListResponse> {
        let rows = notifications::Entity::find()
            .filter(Self::scope(ctx))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(LIST_LIMIT)
            .all(&self.pool)
            .await?;
        let unread_count = self.count_unread(ctx).await?;
        Ok(NotificationListResponse {
            notifications: rows.into_iter().map(Into::into).collect(),
            unread_count,
        })
    }

    pub async fn unread(&self, ctx: &AuthContext) -> AppResult<Vec<NotificationResponse>> {
        let rows = notifications::Entity::find()
            .filter(Self::scope(ctx))
            .filter(notifications::Column::IsRead.eq(false))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(UNREAD_LIMIT)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn unread_count(&self, ctx: &AuthContext) -> AppResult<UnreadCountResponse> {
        Ok(UnreadCountResponse {
            count: self.count_unread(ctx).await?,
        })
    }

    async fn count_unread(&self, ctx: &AuthContext) -> AppResult<u64> {
        Ok(notifications::Entity::find()
            .filter(Self::scope(ctx))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.pool)
            .await?)
    }

    async fn owned(&self, ctx: &AuthContext, id: i64) -> AppResult<notifications::Model> {
        let n = notifications::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
        let visible = if ctx.is_admin() {
            n.admin_id == Some(ctx.subject_id) || (n.admin_id.is_none() && n.user_id.is_none())
        } else {
            n.user_id == Some(ctx.subject_id)
        };
        if !visible {
            return Err(AppError::Forbidden);
        }
        Ok(n)
    }

    pub async fn mark_read(&self, ctx: &AuthContext, id: i64) -> AppResult<NotificationResponse> {
        let n = self.owned(ctx, id).await?;
        if n.is_read {
            return Ok(n.into());
        }
        let mut am = n.into_active_model();
        am.is_read = Set(true);
        Ok(am.update(&self.pool).await?.into())
    }

    pub async fn mark_all_read(&self, ctx: &AuthContext) -> AppResult<u64> {
        let res = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(Self::scope(ctx))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, ctx: &AuthContext, id: i64) -> AppResult<()> {
        let n = self.owned(ctx, id).await?;
        notifications::Entity::delete_by_id(n.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    /// Attach a device token to the caller. A token seen before is moved to the new owner.
    pub async fn register_push_token(
        &self,
        ctx: &AuthContext,
        token: &str,
        platform: &str,
    ) -> AppResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::ValidationError("Push token is required".to_string()));
        }
        let (user_id, admin_id) = if ctx.is_admin() {
            (None, Some(ctx.subject_id))
        } else {
            (Some(ctx.subject_id), None)
        };

        match subscriptions::Entity::find()
            .filter(subscriptions::Column::Token.eq(token))
            .one(&self.pool)
            .await?
        {
            Some(existing) => {
                let mut am = existing.into_active_model();
                am.user_id = Set(user_id);
                am.admin_id = Set(admin_id);
                am.platform = Set(platform.to_string());
                am.update(&self.pool).await?;
            }
            None => {
                subscriptions::ActiveModel {
                    user_id: Set(user_id),
                    admin_id: Set(admin_id),
                    token: Set(token.to_string()),
                    platform: Set(platform.to_string()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }
        log::info!("Push token registered for {:?} {}", ctx.role, ctx.subject_id);
        Ok(())
    }

    pub async fn remove_push_token(&self, ctx: &AuthContext, token: &str) -> AppResult<()> {
        let owner = if ctx.is_admin() {
            subscriptions::Column::AdminId.eq(ctx.subject_id)
        } else {
            subscriptions::Column::UserId.eq(ctx.subject_id)
        };
        let res = subscriptions::Entity::delete_many()
            .filter(subscriptions::Column::Token.eq(token))
            .filter(owner)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Push subscription not found".to_string()));
        }
        Ok(())
    }
}
