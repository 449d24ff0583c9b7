use crate::error::{AppError, AppResult};
use regex::Regex;

/// Strip spaces, dashes, dots and parentheses that users type between digit groups.
pub fn normalize_mobile(number: &str) -> String {
    number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// Validate a mobile-money account number (8 to 15 digits, optional leading `+`).
pub fn validate_mobile_number(number: &str, field: &str) -> AppResult<String> {
    let mobile_regex = Regex::new(r"^\+?\d{8,15}$")
        .map_err(|e| AppError::InternalError(format!("mobile regex: {e}")))?;
    let normalized = normalize_mobile(number);
    if !mobile_regex.is_match(&normalized) {
        return Err(AppError::ValidationError(format!(
            "{field} is not a valid mobile number"
        )));
    }
    Ok(normalized)
}
