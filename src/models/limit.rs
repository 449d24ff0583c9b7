use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of a monthly limit pre-check.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyLimitCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MonthlyLimitCheck {
    pub fn unlimited() -> Self {
        MonthlyLimitCheck {
            allowed: true,
            current_total: None,
            limit: None,
            remaining: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyLimitStats {
    pub current_total: f64,
    /// `None` when no limit is configured for the tier
    pub limit: Option<f64>,
    pub remaining: Option<f64>,
    pub has_kyc: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LimitCheckQuery {
    pub amount: f64,
}
