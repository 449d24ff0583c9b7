use super::require_admin;
use crate::models::*;
use crate::services::{AdminService, CatalogService, Permission};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/payment-methods",
    tag = "catalog",
    params(
        ("active_only" = Option<bool>, Query, description = "Only active methods (default true)")
    ),
    responses(
        (status = 200, description = "Payment methods", body = [PaymentMethodResponse])
    )
)]
pub async fn list_payment_methods(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    match catalog_service
        .list_payment_methods(query.active_only.unwrap_or(true))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payment-methods/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Payment method id")
    ),
    responses(
        (status = 200, description = "Payment method", body = PaymentMethodResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_payment_method(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match catalog_service.get_payment_method(path.into_inner()).await {
        Ok(method) => Ok(HttpResponse::Ok().json(ApiResponse::success(method))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payment-methods",
    tag = "catalog",
    request_body = CreatePaymentMethodRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment method created", body = PaymentMethodResponse),
        (status = 400, description = "Missing name or code not upper case"),
        (status = 403, description = "Missing MANAGE_PAYMENT_METHODS"),
        (status = 409, description = "Code already used")
    )
)]
pub async fn create_payment_method(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreatePaymentMethodRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePaymentMethods).await {
        return Ok(e.error_response());
    }
    match catalog_service
        .create_payment_method(request.into_inner())
        .await
    {
        Ok(method) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            method,
            "Payment method created",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/payment-methods/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Payment method id")
    ),
    request_body = UpdatePaymentMethodRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment method updated", body = PaymentMethodResponse),
        (status = 400, description = "Nothing to update or invalid value"),
        (status = 403, description = "Missing MANAGE_PAYMENT_METHODS"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Code already used")
    )
)]
pub async fn update_payment_method(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdatePaymentMethodRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePaymentMethods).await {
        return Ok(e.error_response());
    }
    match catalog_service
        .update_payment_method(path.into_inner(), request.into_inner())
        .await
    {
        Ok(method) => Ok(HttpResponse::Ok().json(ApiResponse::success(method))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/payment-methods/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Payment method id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Missing MANAGE_PAYMENT_METHODS"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Still used by an exchange pair")
    )
)]
pub async fn delete_payment_method(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManagePaymentMethods).await {
        return Ok(e.error_response());
    }
    match catalog_service.delete_payment_method(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Payment method deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/exchange-pairs",
    tag = "catalog",
    params(
        ("active_only" = Option<bool>, Query, description = "Only active pairs with active endpoints (default true)")
    ),
    responses(
        (status = 200, description = "Exchange pairs with their form fields", body = [ExchangePairResponse])
    )
)]
pub async fn list_pairs(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    match catalog_service
        .list_pairs(query.active_only.unwrap_or(true))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/exchange-pairs/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Exchange pair id")
    ),
    responses(
        (status = 200, description = "Exchange pair", body = ExchangePairResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_pair(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match catalog_service.get_pair(path.into_inner()).await {
        Ok(pair) => Ok(HttpResponse::Ok().json(ApiResponse::success(pair))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/exchange-pairs",
    tag = "catalog",
    request_body = CreateExchangePairRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pair created", body = ExchangePairResponse),
        (status = 400, description = "Invalid terms or fields"),
        (status = 403, description = "Missing MANAGE_EXCHANGE_PAIRS"),
        (status = 409, description = "Pair already exists")
    )
)]
pub async fn create_pair(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreateExchangePairRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageExchangePairs).await {
        return Ok(e.error_response());
    }
    match catalog_service.create_pair(request.into_inner()).await {
        Ok(pair) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            pair,
            "Exchange pair created",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/exchange-pairs/{id}/active",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Exchange pair id")
    ),
    request_body = SetActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pair updated", body = ExchangePairResponse),
        (status = 403, description = "Missing MANAGE_EXCHANGE_PAIRS"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_pair_active(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetActiveRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageExchangePairs).await {
        return Ok(e.error_response());
    }
    match catalog_service
        .set_pair_active(path.into_inner(), request.is_active)
        .await
    {
        Ok(pair) => Ok(HttpResponse::Ok().json(ApiResponse::success(pair))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/exchange-pairs/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Exchange pair id")
    ),
    request_body = UpdateExchangePairRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pair updated", body = ExchangePairResponse),
        (status = 400, description = "Invalid terms or fields"),
        (status = 403, description = "Missing MANAGE_EXCHANGE_PAIRS"),
        (status = 404, description = "Pair or email template not found")
    )
)]
pub async fn update_pair(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateExchangePairRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageExchangePairs).await {
        return Ok(e.error_response());
    }
    match catalog_service
        .update_pair(path.into_inner(), request.into_inner())
        .await
    {
        Ok(pair) => Ok(HttpResponse::Ok().json(ApiResponse::success(pair))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/exchange-pairs/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "Exchange pair id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Missing MANAGE_EXCHANGE_PAIRS"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Referenced by transactions")
    )
)]
pub async fn delete_pair(
    catalog_service: web::Data<CatalogService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ManageExchangePairs).await {
        return Ok(e.error_response());
    }
    match catalog_service.delete_pair(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Exchange pair deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment-methods")
            .route("", web::get().to(list_payment_methods))
            .route("", web::post().to(create_payment_method))
            .route("/{id}", web::get().to(get_payment_method))
            .route("/{id}", web::put().to(update_payment_method))
            .route("/{id}", web::delete().to(delete_payment_method)),
    )
    .service(
        web::scope("/exchange-pairs")
            .route("", web::get().to(list_pairs))
            .route("", web::post().to(create_pair))
            .route("/{id}", web::get().to(get_pair))
            .route("/{id}", web::put().to(update_pair))
            .route("/{id}", web::delete().to(delete_pair))
            .route("/{id}/active", web::put().to(set_pair_active)),
    );
}
