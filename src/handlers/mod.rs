pub mod admin;
pub mod auth;
pub mod catalog;
pub mod limit;
pub mod notification;
pub mod settings;
pub mod transaction;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use catalog::catalog_config;
pub use limit::limit_config;
pub use notification::{notification_config, push_config};
pub use settings::settings_config;
pub use transaction::transaction_config;
pub use user::user_config;

use crate::error::{AppError, AppResult};
use crate::models::AuthContext;
use crate::services::{AdminContext, AdminService, Permission};
use actix_web::{HttpMessage, HttpRequest};

/// Identity placed in the request by the auth middleware.
pub(crate) fn auth_context(req: &HttpRequest) -> AppResult<AuthContext> {
    req.extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// Resolve the calling admin and check one permission.
pub(crate) async fn require_admin(
    req: &HttpRequest,
    admin_service: &AdminService,
    permission: Permission,
) -> AppResult<AdminContext> {
    let ctx = auth_context(req)?;
    admin_service.authorize(&ctx, permission).await
}
