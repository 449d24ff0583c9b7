use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{KycStatus, admin_entity as admins, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::EmailSender;
use crate::models::*;
use crate::services::admin_service::AdminService;
use crate::services::email_service::{VERIFICATION_CODE, render_builtin};
use crate::utils::*;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::sync::RwLock;

const CODE_RESEND_SECONDS: i64 = 60;
const CODE_VALID_MINUTES: i64 = 10;
const MAX_CODE_ATTEMPTS: u32 = 5;

struct PendingCode {
    code: String,
    sent_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    failed_attempts: u32,
}

fn purge_expired(codes: &mut HashMap<String, PendingCode>, now: DateTime<Utc>) {
    codes.retain(|_, pending| pending.expires_at > now);
}

pub(crate) fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| AppError::InternalError(format!("Invalid email pattern: {e}")))?;
    if !re.is_match(&email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(email)
}

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    admin_service: AdminService,
    mailer: Arc<dyn EmailSender>,
    verification_codes: Arc<RwLock<HashMap<String, PendingCode>>>,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        admin_service: AdminService,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            admin_service,
            mailer,
            verification_codes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn send_verification_code(&self, email: &str) -> AppResult<SendCodeResponse> {
        let email = normalize_email(email)?;

        // at most one code per address per minute
        {
            let codes = self.verification_codes.read().await;
            if let Some(pending) = codes.get(&email)
                && Utc::now().signed_duration_since(pending.sent_at)
                    < Duration::seconds(CODE_RESEND_SECONDS)
            {
                return Err(AppError::ValidationError(format!(
                    "A code was sent recently, retry in {CODE_RESEND_SECONDS} seconds"
                )));
            }
        }

        let code = generate_six_digit_code();
        let mut vars = TemplateVars::new();
        vars.insert("code".to_string(), code.clone());
        vars.insert("minutes".to_string(), CODE_VALID_MINUTES.to_string());
        let message = render_builtin(VERIFICATION_CODE, &email, &vars)?;
        self.mailer.send(&message).await?;

        let now = Utc::now();
        let mut codes = self.verification_codes.write().await;
        purge_expired(&mut codes, now);
        codes.insert(
            email,
            PendingCode {
                code,
                sent_at: now,
                expires_at: now + Duration::minutes(CODE_VALID_MINUTES),
                failed_attempts: 0,
            },
        );

        Ok(SendCodeResponse {
            expires_in: CODE_VALID_MINUTES * 60,
        })
    }

    /// A code is burnt once it expires or after too many wrong guesses.
    async fn verify_code(&self, email: &str, code: &str) -> AppResult<()> {
        let mut codes = self.verification_codes.write().await;
        let pending = codes.get_mut(email).ok_or_else(|| {
            AppError::ValidationError("No verification code was requested for this email".to_string())
        })?;
        if Utc::now() > pending.expires_at {
            codes.remove(email);
            return Err(AppError::ValidationError(
                "Verification code has expired".to_string(),
            ));
        }
        if pending.code != code.trim() {
            pending.failed_attempts += 1;
            if pending.failed_attempts >= MAX_CODE_ATTEMPTS {
                codes.remove(email);
                log::warn!(
                    "Verification code for {email} discarded after {MAX_CODE_ATTEMPTS} failed attempts"
                );
                return Err(AppError::ValidationError(
                    "Too many invalid attempts, request a new code".to_string(),
                ));
            }
            return Err(AppError::ValidationError(
                "Invalid verification code".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let phone = validate_mobile_number(&request.phone, "phone")?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        validate_password(&request.password)?;
        if !request.accept_terms {
            return Err(AppError::ValidationError(
                "The terms of use must be accepted".to_string(),
            ));
        }

        let exists = users::Entity::find()
            .filter(users::Column::Phone.eq(phone.as_str()))
            .one(&self.pool)
            .await?
            .is_some();
        if exists {
            return Err(AppError::Conflict(
                "This phone number is already registered".to_string(),
            ));
        }

        let email = match request.email.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let email = normalize_email(raw)?;
                let taken = users::Entity::find()
                    .filter(users::Column::Email.eq(email.as_str()))
                    .one(&self.pool)
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict(
                        "This email is already registered".to_string(),
                    ));
                }
                let code = request.verification_code.as_deref().ok_or_else(|| {
                    AppError::ValidationError("A verification code is required".to_string())
                })?;
                self.verify_code(&email, code).await?;
                Some(email)
            }
            _ => None,
        };

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let user = users::ActiveModel {
            phone: Set(phone),
            name: Set(name),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            is_active: Set(true),
            kyc_verified: Set(false),
            kyc_status: Set(KycStatus::Pending),
            newsletter_subscribed: Set(request.newsletter_subscribed),
            terms_accepted_at: Set(Some(now)),
            privacy_accepted_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        if let Some(email) = email {
            self.verification_codes.write().await.remove(&email);
        }
        log::info!("User {} registered", user.id);

        let token = self.jwt_service.generate_token(user.id, Role::User)?;
        Ok(AuthResponse {
            token,
            expires_in: self.jwt_service.expires_in(Role::User),
            user: user.into(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let phone = normalize_mobile(&request.phone);
        let user = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid phone number or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid phone number or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::AuthError("This account is disabled".to_string()));
        }

        let token = self.jwt_service.generate_token(user.id, Role::User)?;
        Ok(AuthResponse {
            token,
            expires_in: self.jwt_service.expires_in(Role::User),
            user: user.into(),
        })
    }

    pub async fn admin_login(&self, request: AdminLoginRequest) -> AppResult<AdminAuthResponse> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Username.eq(request.username.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &admin.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }
        if !admin.is_active {
            return Err(AppError::AuthError(
                "This admin account is disabled".to_string(),
            ));
        }

        let permissions = self.admin_service.permission_codes(admin.id).await?;
        let token = self.jwt_service.generate_token(admin.id, Role::Admin)?;
        log::info!("Admin {} logged in", admin.username);
        Ok(AdminAuthResponse {
            token,
            expires_in: self.jwt_service.expires_in(Role::Admin),
            admin: admin.into(),
            permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(expires_at: DateTime<Utc>) -> PendingCode {
        PendingCode {
            code: "123456".to_string(),
            sent_at: expires_at - Duration::minutes(CODE_VALID_MINUTES),
            expires_at,
            failed_attempts: 0,
        }
    }

    #[test]
    fn expired_codes_are_purged() {
        let now = Utc::now();
        let mut codes = HashMap::new();
        codes.insert("old@mail.tg".to_string(), pending(now - Duration::seconds(1)));
        codes.insert("new@mail.tg".to_string(), pending(now + Duration::minutes(5)));
        purge_expired(&mut codes, now);
        assert_eq!(codes.len(), 1);
        assert!(codes.contains_key("new@mail.tg"));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ama@Mail.TG ").unwrap(), "ama@mail.tg");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
    }
}
