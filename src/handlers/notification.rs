use super::auth_context;
use crate::models::*;
use crate::services::NotificationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "50 newest notifications and the unread count", body = NotificationListResponse)
    )
)]
pub async fn list_notifications(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.list(&ctx).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/notifications/unread",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "10 newest unread notifications", body = [NotificationResponse])
    )
)]
pub async fn list_unread(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.unread(&ctx).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/notifications/unread/count",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse)
    )
)]
pub async fn unread_count(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.unread_count(&ctx).await {
        Ok(count) => Ok(HttpResponse::Ok().json(ApiResponse::success(count))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    tag = "notification",
    params(
        ("id" = i64, Path, description = "Notification id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Marked as read", body = NotificationResponse),
        (status = 403, description = "Not addressed to the caller"),
        (status = 404, description = "Not found")
    )
)]
pub async fn mark_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.mark_read(&ctx, path.into_inner()).await {
        Ok(n) => Ok(HttpResponse::Ok().json(ApiResponse::success(n))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/notifications/read-all",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Number of notifications marked as read")
    )
)]
pub async fn mark_all_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.mark_all_read(&ctx).await {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(json!({
            "updated": updated
        })))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notification",
    params(
        ("id" = i64, Path, description = "Notification id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not addressed to the caller"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_notification(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service.delete(&ctx, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Notification deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/push/subscriptions",
    tag = "notification",
    request_body = RegisterPushTokenRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device registered"),
        (status = 400, description = "Empty token")
    )
)]
pub async fn register_push_token(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    request: web::Json<RegisterPushTokenRequest>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service
        .register_push_token(&ctx, &request.token, &request.platform)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Push subscription registered",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/push/subscriptions",
    tag = "notification",
    request_body = RemovePushTokenRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device removed"),
        (status = 404, description = "No such subscription for the caller")
    )
)]
pub async fn remove_push_token(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    request: web::Json<RemovePushTokenRequest>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match notification_service
        .remove_push_token(&ctx, &request.token)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Push subscription removed",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn notification_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/unread", web::get().to(list_unread))
            .route("/unread/count", web::get().to(unread_count))
            .route("/read-all", web::patch().to(mark_all_read))
            .route("/{id}/read", web::patch().to(mark_read))
            .route("/{id}", web::delete().to(delete_notification)),
    );
}

pub fn push_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/push")
            .route("/subscriptions", web::post().to(register_push_token))
            .route("/subscriptions", web::delete().to(remove_push_token)),
    );
}
