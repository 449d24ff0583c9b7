use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Monthly limit exceeded: {current_total} + {requested} > {limit}")]
    LimitExceeded {
        current_total: f64,
        requested: f64,
        limit: f64,
    },

    #[error("Forbidden")]
    Forbidden,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    fn body(code: &str, message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::LimitExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                Self::body("VALIDATION_ERROR", msg)
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                Self::body("AUTH_ERROR", msg)
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                Self::body("AUTH_ERROR", "Invalid or expired token")
            }
            AppError::NotFound(msg) => Self::body("NOT_FOUND", msg),
            AppError::Conflict(msg) => {
                log::warn!("Conflict: {msg}");
                Self::body("CONFLICT", msg)
            }
            AppError::LimitExceeded {
                current_total,
                requested,
                limit,
            } => {
                log::warn!("Monthly limit exceeded: {current_total} + {requested} > {limit}");
                json!({
                    "success": false,
                    "error": {
                        "code": "LIMIT_EXCEEDED",
                        "message": format!(
                            "Monthly limit of {limit} FCFA would be exceeded (already used {current_total} FCFA)"
                        ),
                        "current_total": current_total,
                        "limit": limit
                    }
                })
            }
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                Self::body("FORBIDDEN", "Forbidden")
            }
            AppError::PermissionDenied => {
                log::warn!("Permission denied");
                Self::body("FORBIDDEN", "Permission denied")
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                Self::body("EXTERNAL_API_ERROR", msg)
            }
            AppError::ReqwestError(err) => {
                log::error!("HTTP request error: {err}");
                Self::body("EXTERNAL_API_ERROR", "Upstream request failed")
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                Self::body("DATABASE_ERROR", "Database error")
            }
            _ => {
                log::error!("Internal error: {self}");
                Self::body("INTERNAL_ERROR", "Internal server error")
            }
        };

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::LimitExceeded {
                current_total: 1.0,
                requested: 1.0,
                limit: 1.0
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DatabaseError(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
