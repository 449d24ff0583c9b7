use super::{auth_context, require_admin};
use crate::models::*;
use crate::services::{AdminService, Permission, TransactionService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transaction",
    request_body = CreateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Exchange request recorded as pending", body = CreateTransactionResponse),
        (status = 400, description = "Invalid input, amount out of bounds or monthly limit exceeded"),
        (status = 404, description = "Exchange pair not found"),
        (status = 409, description = "Payment reference already used")
    )
)]
pub async fn create_transaction(
    transaction_service: web::Data<TransactionService>,
    req: HttpRequest,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    let user_id = match auth_context(&req).and_then(|ctx| ctx.require_user()) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match transaction_service.create(user_id, request.into_inner()).await {
        Ok(created) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            created,
            "Exchange request submitted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/check-reference",
    tag = "transaction",
    params(
        ("reference" = String, Query, description = "Payment reference to look up")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Whether the reference is already used", body = CheckReferenceResponse)
    )
)]
pub async fn check_reference(
    transaction_service: web::Data<TransactionService>,
    query: web::Query<CheckReferenceQuery>,
) -> Result<HttpResponse> {
    match transaction_service.check_reference(&query.reference).await {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/mine",
    tag = "transaction",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's transactions, newest first")
    )
)]
pub async fn list_my_transactions(
    transaction_service: web::Data<TransactionService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match transaction_service.list_my_transactions(&ctx, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transaction",
    params(
        ("id" = i64, Path, description = "Transaction id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction and its history", body = TransactionDetailResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_transaction(
    transaction_service: web::Data<TransactionService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = match auth_context(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    if ctx.is_admin()
        && let Err(e) = admin_service
            .authorize(&ctx, Permission::ViewTransactions)
            .await
    {
        return Ok(e.error_response());
    }
    match transaction_service
        .get_transaction(&ctx, path.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transaction",
    params(
        ("status" = Option<String>, Query, description = "pending, validated or rejected"),
        ("user_id" = Option<i64>, Query, description = "Only this user's transactions"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All transactions, newest first"),
        (status = 403, description = "Missing VIEW_TRANSACTIONS")
    )
)]
pub async fn list_transactions(
    transaction_service: web::Data<TransactionService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ViewTransactions).await {
        return Ok(e.error_response());
    }
    match transaction_service.list_transactions(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/stats/overview",
    tag = "transaction",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Counts and validated totals", body = TransactionStats),
        (status = 403, description = "Missing VIEW_TRANSACTION_STATS")
    )
)]
pub async fn stats_overview(
    transaction_service: web::Data<TransactionService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &admin_service, Permission::ViewTransactionStats).await {
        return Ok(e.error_response());
    }
    match transaction_service.stats_overview().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/transactions/{id}/validate",
    tag = "transaction",
    params(
        ("id" = i64, Path, description = "Transaction id")
    ),
    request_body = ValidateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Decision recorded", body = ValidateTransactionResponse),
        (status = 400, description = "Invalid decision or missing admin message"),
        (status = 403, description = "Missing VALIDATE_TRANSACTIONS"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already decided")
    )
)]
pub async fn validate_transaction(
    transaction_service: web::Data<TransactionService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ValidateTransactionRequest>,
) -> Result<HttpResponse> {
    let admin =
        match require_admin(&req, &admin_service, Permission::ValidateTransactions).await {
            Ok(admin) => admin,
            Err(e) => return Ok(e.error_response()),
        };
    match transaction_service
        .validate(admin.admin_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    // literal segments before `{id}`
    cfg.service(
        web::scope("/transactions")
            .route("", web::post().to(create_transaction))
            .route("", web::get().to(list_transactions))
            .route("/check-reference", web::get().to(check_reference))
            .route("/mine", web::get().to(list_my_transactions))
            .route("/stats/overview", web::get().to(stats_overview))
            .route("/{id}", web::get().to(get_transaction))
            .route("/{id}/validate", web::put().to(validate_transaction)),
    );
}
