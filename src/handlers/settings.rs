use super::require_admin;
use crate::models::*;
use crate::services::{AdminService, ConfigService, Permission};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/settings/config",
    tag = "settings",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every business setting", body = [ConfigEntryResponse]),
        (status = 403, description = "Missing MANAGE_CONFIG")
    )
)]
pub async fn list_config(
    config_service: web::Data<ConfigService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageConfig).await {
        return Ok(e.error_response());
    }
    match config_service.list().await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiResponse::success(entries))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/settings/config/public/{key}",
    tag = "settings",
    params(
        ("key" = String, Path, description = "Public setting key, e.g. min_amount")
    ),
    responses(
        (status = 200, description = "Setting", body = ConfigEntryResponse),
        (status = 404, description = "Unknown or private key")
    )
)]
pub async fn get_public_config(
    config_service: web::Data<ConfigService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match config_service.get_public(&path).await {
        Ok(entry) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/settings/config/{key}",
    tag = "settings",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    request_body = UpdateConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Setting updated", body = ConfigEntryResponse),
        (status = 400, description = "Invalid value"),
        (status = 403, description = "Missing MANAGE_CONFIG"),
        (status = 404, description = "Unknown key")
    )
)]
pub async fn update_config(
    config_service: web::Data<ConfigService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateConfigRequest>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&req, &admin_service, Permission::ManageConfig).await {
        Ok(admin) => admin,
        Err(e) => return Ok(e.error_response()),
    };
    match config_service.set(&path, &request.value).await {
        Ok(entry) => {
            log::info!("Config '{}' changed by {}", entry.key, admin.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/settings/config",
    tag = "settings",
    request_body = CreateConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Setting created", body = ConfigEntryResponse),
        (status = 403, description = "Missing MANAGE_CONFIG"),
        (status = 409, description = "Key already exists")
    )
)]
pub async fn create_config(
    config_service: web::Data<ConfigService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreateConfigRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageConfig).await {
        return Ok(e.error_response());
    }
    let request = request.into_inner();
    match config_service
        .create(&request.key, &request.value, request.description)
        .await
    {
        Ok(entry) => Ok(HttpResponse::Ok().json(ApiResponse::success(entry))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings/config")
            .route("", web::get().to(list_config))
            .route("", web::post().to(create_config))
            .route("/public/{key}", web::get().to(get_public_config))
            .route("/{key}", web::put().to(update_config)),
    );
}
