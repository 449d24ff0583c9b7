use crate::error::{AppError, AppResult};
use crate::utils::Role;

/// Verified identity of the caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub subject_id: i64,
    pub role: Role,
}

impl AuthContext {
    pub fn user(subject_id: i64) -> Self {
        Self {
            subject_id,
            role: Role::User,
        }
    }

    pub fn admin(subject_id: i64) -> Self {
        Self {
            subject_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_user(&self) -> AppResult<i64> {
        match self.role {
            Role::User => Ok(self.subject_id),
            Role::Admin => Err(AppError::Forbidden),
        }
    }
}
