use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::entities::{FieldType, KycStatus, PairCategory, TransactionStatus};
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::send_code,
        handlers::auth::register,
        handlers::auth::login,
        handlers::admin::admin_login,
        handlers::admin::get_user,
        handlers::admin::set_user_active,
        handlers::admin::set_kyc_status,
        handlers::admin::create_admin,
        handlers::admin::list_permissions,
        handlers::admin::get_admin_permissions,
        handlers::admin::grant_permission,
        handlers::admin::revoke_permission,
        handlers::admin::list_users,
        handlers::admin::user_transactions,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::catalog::list_payment_methods,
        handlers::catalog::get_payment_method,
        handlers::catalog::create_payment_method,
        handlers::catalog::update_payment_method,
        handlers::catalog::delete_payment_method,
        handlers::catalog::list_pairs,
        handlers::catalog::get_pair,
        handlers::catalog::create_pair,
        handlers::catalog::set_pair_active,
        handlers::catalog::update_pair,
        handlers::catalog::delete_pair,
        handlers::transaction::create_transaction,
        handlers::transaction::check_reference,
        handlers::transaction::list_my_transactions,
        handlers::transaction::get_transaction,
        handlers::transaction::list_transactions,
        handlers::transaction::stats_overview,
        handlers::transaction::validate_transaction,
        handlers::limit::monthly_stats,
        handlers::limit::check_monthly,
        handlers::notification::list_notifications,
        handlers::notification::list_unread,
        handlers::notification::unread_count,
        handlers::notification::mark_read,
        handlers::notification::mark_all_read,
        handlers::notification::delete_notification,
        handlers::notification::register_push_token,
        handlers::notification::remove_push_token,
        handlers::settings::list_config,
        handlers::settings::get_public_config,
        handlers::settings::update_config,
        handlers::settings::create_config,
    ),
    components(
        schemas(
            KycStatus,
            TransactionStatus,
            PairCategory,
            FieldType,
            UserResponse,
            AdminResponse,
            SendCodeRequest,
            SendCodeResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            AdminLoginRequest,
            AdminAuthResponse,
            UpdateProfileRequest,
            SetUserActiveRequest,
            SetKycStatusRequest,
            CreateAdminRequest,
            PermissionResponse,
            GrantPermissionRequest,
            UserQuery,
            PaymentMethodResponse,
            ExchangeFieldResponse,
            ExchangePairResponse,
            CreateExchangeFieldRequest,
            CreateExchangePairRequest,
            UpdateExchangePairRequest,
            CreatePaymentMethodRequest,
            UpdatePaymentMethodRequest,
            SetActiveRequest,
            CreateTransactionRequest,
            CreateTransactionResponse,
            ProcessingMode,
            ProcessingInfo,
            ValidateTransactionRequest,
            ValidateTransactionResponse,
            TransactionResponse,
            TransactionHistoryResponse,
            TransactionDetailResponse,
            CheckReferenceResponse,
            TransactionStats,
            PaginationParams,
            MonthlyLimitCheck,
            MonthlyLimitStats,
            NotificationResponse,
            NotificationListResponse,
            UnreadCountResponse,
            RegisterPushTokenRequest,
            RemovePushTokenRequest,
            ConfigEntryResponse,
            UpdateConfigRequest,
            CreateConfigRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "User registration and login"),
        (name = "admin", description = "Admin accounts, permissions and user administration"),
        (name = "user", description = "Own profile"),
        (name = "catalog", description = "Payment methods and exchange pairs"),
        (name = "transaction", description = "Exchange requests and their review"),
        (name = "limit", description = "Monthly exchange limits"),
        (name = "notification", description = "In-app notifications and push devices"),
        (name = "settings", description = "Business settings"),
    ),
    info(
        title = "EMB Exchange API",
        version = "1.0.0",
        description = "Mobile-money exchange backend REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
