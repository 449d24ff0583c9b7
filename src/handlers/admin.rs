use super::require_admin;
use crate::models::*;
use crate::services::{AdminService, AuthService, Permission, TransactionService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/admin/auth/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin token and permission codes", body = AdminAuthResponse),
        (status = 401, description = "Wrong credentials or disabled admin")
    )
)]
pub async fn admin_login(
    auth_service: web::Data<AuthService>,
    request: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.admin_login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User account", body = UserResponse),
        (status = 403, description = "Missing MANAGE_USERS"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageUsers).await {
        return Ok(e.error_response());
    }
    match admin_service.get_user(path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(user))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/active",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = SetUserActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 403, description = "Missing MANAGE_USERS"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_user_active(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetUserActiveRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageUsers).await {
        return Ok(e.error_response());
    }
    match admin_service
        .set_user_active(path.into_inner(), request.is_active)
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(user))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/kyc",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = SetKycStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "KYC status updated", body = UserResponse),
        (status = 403, description = "Missing MANAGE_USERS"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_kyc_status(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetKycStatusRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageUsers).await {
        return Ok(e.error_response());
    }
    match admin_service
        .set_kyc_status(path.into_inner(), request.status)
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(user))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/admins",
    tag = "admin",
    request_body = CreateAdminRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Admin account created", body = AdminResponse),
        (status = 400, description = "Missing username or weak password"),
        (status = 403, description = "Missing MANAGE_ADMINS"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_admin(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreateAdminRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageAdmins).await {
        return Ok(e.error_response());
    }
    match admin_service.create_admin(request.into_inner()).await {
        Ok(admin) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            admin,
            "Admin created",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/permissions",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Permission catalog", body = [PermissionResponse]),
        (status = 403, description = "Missing MANAGE_PERMISSIONS")
    )
)]
pub async fn list_permissions(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePermissions).await {
        return Ok(e.error_response());
    }
    match admin_service.list_permissions().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/admins/{id}/permissions",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Admin id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Permission codes held by the admin", body = [String]),
        (status = 403, description = "Missing MANAGE_PERMISSIONS"),
        (status = 404, description = "Admin not found")
    )
)]
pub async fn get_admin_permissions(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePermissions).await {
        return Ok(e.error_response());
    }
    match admin_service.admin_permissions(path.into_inner()).await {
        Ok(codes) => Ok(HttpResponse::Ok().json(ApiResponse::success(codes))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/admins/{id}/permissions",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Admin id")
    ),
    request_body = GrantPermissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Permission granted"),
        (status = 403, description = "Missing MANAGE_PERMISSIONS"),
        (status = 404, description = "Admin or permission not found")
    )
)]
pub async fn grant_permission(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<GrantPermissionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePermissions).await {
        return Ok(e.error_response());
    }
    match admin_service.grant(path.into_inner(), &request.code).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Permission granted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/admins/{id}/permissions/{code}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Admin id"),
        ("code" = String, Path, description = "Permission code")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Permission revoked"),
        (status = 403, description = "Missing MANAGE_PERMISSIONS"),
        (status = 404, description = "Admin or permission not found")
    )
)]
pub async fn revoke_permission(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePermissions).await {
        return Ok(e.error_response());
    }
    let (admin_id, code) = path.into_inner();
    match admin_service.revoke(admin_id, &code).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Permission revoked",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("search" = Option<String>, Query, description = "Matches name, phone or email"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User accounts, newest first"),
        (status = 403, description = "Missing MANAGE_USERS")
    )
)]
pub async fn list_users(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageUsers).await {
        return Ok(e.error_response());
    }
    match admin_service.list_users(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}/transactions",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User id"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The user's transactions, newest first"),
        (status = 403, description = "Missing VIEW_TRANSACTIONS"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_transactions(
    admin_service: web::Data<AdminService>,
    transaction_service: web::Data<TransactionService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ViewTransactions).await {
        return Ok(e.error_response());
    }
    let user_id = path.into_inner();
    if let Err(e) = admin_service.get_user(user_id).await {
        return Ok(e.error_response());
    }
    let filter = TransactionQuery {
        user_id: Some(user_id),
        page: query.page,
        page_size: query.page_size,
        ..Default::default()
    };
    match transaction_service.list_transactions(&filter).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/auth/login", web::post().to(admin_login))
            .route("/admins", web::post().to(create_admin))
            .route("/admins/{id}/permissions", web::get().to(get_admin_permissions))
            .route("/admins/{id}/permissions", web::post().to(grant_permission))
            .route(
                "/admins/{id}/permissions/{code}",
                web::delete().to(revoke_permission),
            )
            .route("/permissions", web::get().to(list_permissions))
            .route("/users", web::get().to(list_users))
            .route("/users/{id}", web::get().to(get_user))
            .route("/users/{id}/transactions", web::get().to(user_transactions))
            .route("/users/{id}/active", web::put().to(set_user_active))
            .route("/users/{id}/kyc", web::put().to(set_kyc_status)),
    );
}
