use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::notification_entity;

/// Input for a new in-app notification. `user_id` and `admin_id` both `None` means all admins.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub transaction_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub transaction_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<notification_entity::Model> for NotificationResponse {
    fn from(m: notification_entity::Model) -> Self {
        NotificationResponse {
            id: m.id,
            notification_type: m.notification_type,
            title: m.title,
            message: m.message,
            is_read: m.is_read,
            transaction_id: m.transaction_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterPushTokenRequest {
    pub token: String,
    /// `android`, `ios` or `web`
    pub platform: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RemovePushTokenRequest {
    pub token: String,
}
