use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{KycStatus, admin_entity, permission_entity, user_entity};

/// Public view of a customer account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub kyc_verified: bool,
    pub kyc_status: KycStatus,
    pub newsletter_subscribed: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub privacy_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        UserResponse {
            id: m.id,
            phone: m.phone,
            name: m.name,
            email: m.email,
            is_active: m.is_active,
            kyc_verified: m.kyc_verified,
            kyc_status: m.kyc_status,
            newsletter_subscribed: m.newsletter_subscribed,
            terms_accepted_at: m.terms_accepted_at,
            privacy_accepted_at: m.privacy_accepted_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
}

impl From<admin_entity::Model> for AdminResponse {
    fn from(m: admin_entity::Model) -> Self {
        AdminResponse {
            id: m.id,
            username: m.username,
            email: m.email,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendCodeResponse {
    /// Seconds until the code expires
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub password: String,
    /// Required when `email` is given
    pub verification_code: Option<String>,
    #[serde(default)]
    pub accept_terms: bool,
    #[serde(default)]
    pub newsletter_subscribed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub admin: AdminResponse,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub newsletter_subscribed: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetUserActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetKycStatusRequest {
    pub status: KycStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
}

impl From<permission_entity::Model> for PermissionResponse {
    fn from(m: permission_entity::Model) -> Self {
        PermissionResponse {
            id: m.id,
            code: m.code,
            name: m.name,
            description: m.description,
            category: m.category,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantPermissionRequest {
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserQuery {
    /// Matches name, phone or email
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
