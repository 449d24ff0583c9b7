use super::auth_context;
use crate::models::*;
use crate::services::LimitService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/limits/monthly",
    tag = "limit",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Validated volume this month against the caller's KYC tier", body = MonthlyLimitStats)
    )
)]
pub async fn monthly_stats(
    limit_service: web::Data<LimitService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match auth_context(&req).and_then(|ctx| ctx.require_user()) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match limit_service.monthly_limit_stats(user_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/limits/monthly/check",
    tag = "limit",
    params(
        ("amount" = f64, Query, description = "Amount the caller intends to exchange")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pre-check result", body = MonthlyLimitCheck)
    )
)]
pub async fn check_monthly(
    limit_service: web::Data<LimitService>,
    req: HttpRequest,
    query: web::Query<LimitCheckQuery>,
) -> Result<HttpResponse> {
    let user_id = match auth_context(&req).and_then(|ctx| ctx.require_user()) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match limit_service.check_limit(user_id, query.amount).await {
        Ok(check) => Ok(HttpResponse::Ok().json(ApiResponse::success(check))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn limit_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/limits")
            .route("/monthly", web::get().to(monthly_stats))
            .route("/monthly/check", web::get().to(check_monthly)),
    );
}
