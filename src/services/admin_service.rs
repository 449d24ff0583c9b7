use crate::config::BootstrapAdminConfig;
use crate::entities::{
    KycStatus, admin_entity as admins, admin_permission_entity as grants,
    permission_entity as permissions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminResponse, AuthContext, CreateAdminRequest, PaginatedResponse, PaginationParams,
    PermissionResponse, UserQuery, UserResponse,
};
use crate::services::auth_service::normalize_email;
use crate::utils::{hash_password, normalize_page, validate_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Named capabilities an admin can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewTransactions,
    ValidateTransactions,
    ViewTransactionStats,
    ManageConfig,
    ManageExchangePairs,
    ManagePaymentMethods,
    ManageUsers,
    ManageAdmins,
    ManagePermissions,
}

impl Permission {
    pub fn code(self) -> &'static str {
        match self {
            Permission::ViewTransactions => "VIEW_TRANSACTIONS",
            Permission::ValidateTransactions => "VALIDATE_TRANSACTIONS",
            Permission::ViewTransactionStats => "VIEW_TRANSACTION_STATS",
            Permission::ManageConfig => "MANAGE_CONFIG",
            Permission::ManageExchangePairs => "MANAGE_EXCHANGE_PAIRS",
            Permission::ManagePaymentMethods => "MANAGE_PAYMENT_METHODS",
            Permission::ManageUsers => "MANAGE_USERS",
            Permission::ManageAdmins => "MANAGE_ADMINS",
            Permission::ManagePermissions => "MANAGE_PERMISSIONS",
        }
    }
}

/// An authenticated, active admin with the permission codes granted at request time.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: i64,
    pub username: String,
    pub permissions: Vec<String>,
}

impl AdminContext {
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.iter().any(|p| p == permission.code())
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has(permission) {
            Ok(())
        } else {
            log::warn!(
                "Admin {} lacks permission {}",
                self.username,
                permission.code()
            );
            Err(AppError::PermissionDenied)
        }
    }
}

#[derive(Clone)]
pub struct AdminService {
    pool: DatabaseConnection,
}

impl AdminService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn permission_codes(&self, admin_id: i64) -> AppResult<Vec<String>> {
        let permission_ids: Vec<i64> = grants::Entity::find()
            .select_only()
            .column(grants::Column::PermissionId)
            .filter(grants::Column::AdminId.eq(admin_id))
            .into_tuple()
            .all(&self.pool)
            .await?;
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }
        let codes: Vec<String> = permissions::Entity::find()
            .select_only()
            .column(permissions::Column::Code)
            .filter(permissions::Column::Id.is_in(permission_ids))
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(codes)
    }

    /// Resolve the admin behind a verified token. The account must still exist and be active.
    pub async fn resolve(&self, ctx: &AuthContext) -> AppResult<AdminContext> {
        if !ctx.is_admin() {
            return Err(AppError::Forbidden);
        }
        let admin = admins::Entity::find_by_id(ctx.subject_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Admin account not found".to_string()))?;
        if !admin.is_active {
            return Err(AppError::AuthError("Admin account is disabled".to_string()));
        }
        let permissions = self.permission_codes(admin.id).await?;
        Ok(AdminContext {
            admin_id: admin.id,
            username: admin.username,
            permissions,
        })
    }

    pub async fn authorize(
        &self,
        ctx: &AuthContext,
        permission: Permission,
    ) -> AppResult<AdminContext> {
        let admin = self.resolve(ctx).await?;
        admin.require(permission)?;
        Ok(admin)
    }

    pub async fn create_admin(&self, request: CreateAdminRequest) -> AppResult<AdminResponse> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::ValidationError("Username is required".to_string()));
        }
        validate_password(&request.password)?;
        let email = match request.email.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(normalize_email(raw)?),
            _ => None,
        };

        let taken = admins::Entity::find()
            .filter(admins::Column::Username.eq(username.as_str()))
            .one(&self.pool)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Conflict(format!(
                "Admin '{username}' already exists"
            )));
        }

        let admin = admins::ActiveModel {
            username: Set(username),
            password_hash: Set(hash_password(&request.password)?),
            email: Set(email),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Admin {} created", admin.username);
        Ok(admin.into())
    }

    /// Create the configured first admin with every permission. Does nothing once any
    /// admin exists.
    pub async fn bootstrap(&self, config: &BootstrapAdminConfig) -> AppResult<Option<AdminResponse>> {
        if admins::Entity::find().count(&self.pool).await? > 0 {
            return Ok(None);
        }
        let admin = self
            .create_admin(CreateAdminRequest {
                username: config.username.clone(),
                password: config.password.clone(),
                email: config.email.clone(),
            })
            .await?;
        for permission in permissions::Entity::find().all(&self.pool).await? {
            self.grant(admin.id, &permission.code).await?;
        }
        log::info!("Bootstrap admin {} granted every permission", admin.username);
        Ok(Some(admin))
    }

    async fn find_admin(&self, admin_id: i64) -> AppResult<admins::Model> {
        admins::Entity::find_by_id(admin_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }

    async fn find_permission(&self, code: &str) -> AppResult<permissions::Model> {
        permissions::Entity::find()
            .filter(permissions::Column::Code.eq(code.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Permission {code} not found")))
    }

    pub async fn list_permissions(&self) -> AppResult<Vec<PermissionResponse>> {
        let list = permissions::Entity::find()
            .order_by_asc(permissions::Column::Category)
            .order_by_asc(permissions::Column::Code)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn admin_permissions(&self, admin_id: i64) -> AppResult<Vec<String>> {
        self.find_admin(admin_id).await?;
        self.permission_codes(admin_id).await
    }

    /// Grant a permission by code. Granting twice is a no-op.
    pub async fn grant(&self, admin_id: i64, code: &str) -> AppResult<()> {
        let admin = self.find_admin(admin_id).await?;
        let permission = self.find_permission(code).await?;
        let exists = grants::Entity::find()
            .filter(grants::Column::AdminId.eq(admin_id))
            .filter(grants::Column::PermissionId.eq(permission.id))
            .one(&self.pool)
            .await?
            .is_some();
        if !exists {
            grants::ActiveModel {
                admin_id: Set(admin_id),
                permission_id: Set(permission.id),
                granted_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&self.pool)
            .await?;
            log::info!("Permission {} granted to {}", permission.code, admin.username);
        }
        Ok(())
    }

    /// Revoking a permission the admin does not hold is a no-op.
    pub async fn revoke(&self, admin_id: i64, code: &str) -> AppResult<()> {
        let admin = self.find_admin(admin_id).await?;
        let permission = self.find_permission(code).await?;
        let res = grants::Entity::delete_many()
            .filter(grants::Column::AdminId.eq(admin_id))
            .filter(grants::Column::PermissionId.eq(permission.id))
            .exec(&self.pool)
            .await?;
        if res.rows_affected > 0 {
            log::info!("Permission {} revoked from {}", permission.code, admin.username);
        }
        Ok(())
    }

    /// Newest accounts first; `search` matches name, phone or email.
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<PaginatedResponse<UserResponse>> {
        let mut select = users::Entity::find();
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(users::Column::Name.contains(term))
                    .add(users::Column::Phone.contains(term))
                    .add(users::Column::Email.contains(term)),
            );
        }
        let (page, page_size) = normalize_page(&PaginationParams {
            page: query.page,
            page_size: query.page_size,
        });
        let total = select.clone().count(&self.pool).await? as i64;
        let rows = select
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .limit(page_size)
            .offset((page - 1) * page_size)
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            page as i64,
            page_size as i64,
            total,
        ))
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(self.find_user(user_id).await?.into())
    }

    pub async fn set_user_active(&self, user_id: i64, active: bool) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut am = user.into_active_model();
        am.is_active = Set(active);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;
        log::info!("User {user_id} active flag set to {active}");
        Ok(updated.into())
    }

    /// `kyc_verified` always mirrors `status == verified`.
    pub async fn set_kyc_status(&self, user_id: i64, status: KycStatus) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut am = user.into_active_model();
        am.kyc_status = Set(status);
        am.kyc_verified = Set(status == KycStatus::Verified);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;
        log::info!("User {user_id} KYC status set to {status}");
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_context_checks_codes() {
        let ctx = AdminContext {
            admin_id: 1,
            username: "ops".into(),
            permissions: vec!["VALIDATE_TRANSACTIONS".into()],
        };
        assert!(ctx.require(Permission::ValidateTransactions).is_ok());
        assert!(matches!(
            ctx.require(Permission::ManageConfig),
            Err(AppError::PermissionDenied)
        ));
    }
}
