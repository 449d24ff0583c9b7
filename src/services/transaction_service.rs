use crate::entities::{
    TransactionStatus, exchange_pair_entity as pairs, payment_method_entity as methods,
    transaction_entity as transactions, transaction_history_entity as history,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::catalog_service::{CatalogService, find_active_pair, validate_dynamic_fields};
use crate::services::config_service::{COMMISSION_PERCENTAGE, ConfigService, MAX_AMOUNT, MIN_AMOUNT};
use crate::services::email_service::{
    EmailService, TRANSACTION_CREATED, TRANSACTION_REJECTED, TRANSACTION_VALIDATED,
};
use crate::services::limit_service::LimitService;
use crate::services::notification_service::NotificationService;
use crate::utils::{TemplateVars, generate_transaction_id, normalize_page, validate_mobile_number};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

pub const NEW_TRANSACTION: &str = "new_transaction";
pub const TRANSACTION_VALIDATED_NOTICE: &str = "transaction_validated";
pub const TRANSACTION_REJECTED_NOTICE: &str = "transaction_rejected";

const LEGACY_FROM_METHOD: &str = "T-Money";
const LEGACY_TO_METHOD: &str = "Flooz";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeBreakdown {
    pub percentage: f64,
    pub commission: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

/// `commission = amount * percentage / 100`, `total = amount + commission + tax`.
pub fn compute_fees(amount: f64, percentage: f64, tax_amount: f64) -> FeeBreakdown {
    let commission = amount * percentage / 100.0;
    FeeBreakdown {
        percentage,
        commission,
        tax_amount,
        total_amount: amount + commission + tax_amount,
    }
}

/// Intersection of the global bounds with the pair's own bounds. `None` is unbounded.
pub fn amount_bounds(
    global_min: Option<f64>,
    global_max: Option<f64>,
    pair: Option<&pairs::Model>,
) -> (Option<f64>, Option<f64>) {
    let pair_min = pair.map(|p| p.min_amount);
    let pair_max = pair.map(|p| p.max_amount);
    let min = match (global_min, pair_min) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    let max = match (global_max, pair_max) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    (min, max)
}

pub fn check_bounds(amount: f64, (min, max): (Option<f64>, Option<f64>)) -> AppResult<()> {
    if let Some(min) = min
        && amount < min
    {
        return Err(AppError::ValidationError(format!(
            "Minimum amount is {min} FCFA"
        )));
    }
    if let Some(max) = max
        && amount > max
    {
        return Err(AppError::ValidationError(format!(
            "Maximum amount is {max} FCFA"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Title and body of the in-app notice sent to the user once a decision is taken.
pub fn decision_notice(
    tx: &transactions::Model,
    pair: Option<&pairs::Model>,
    to_method: &str,
    decision: TransactionStatus,
    comment: Option<&str>,
    admin_message: Option<&str>,
) -> (String, String) {
    match decision {
        TransactionStatus::Rejected => {
            let mut message = format!(
                "Your exchange {} of {} FCFA has been rejected.",
                tx.transaction_id, tx.amount
            );
            if let Some(reason) = comment {
                message.push_str(&format!(" Reason: {reason}"));
            }
            ("Exchange rejected".to_string(), message)
        }
        _ => {
            let title = "Exchange validated".to_string();
            if let Some(p) = pair
                && p.is_subscription()
                && let Some(msg) = admin_message
            {
                return (title, msg.to_string());
            }
            let mut message = match pair {
                Some(p) if !p.is_money_exchange() => format!(
                    "Your request {} has been validated.",
                    tx.transaction_id
                ),
                _ => format!(
                    "Your exchange of {} FCFA to {} has been validated.",
                    tx.amount, to_method
                ),
            };
            if let Some(msg) = admin_message {
                message.push(' ');
                message.push_str(msg);
            }
            (title, message)
        }
    }
}

struct Resolved {
    pair: Option<pairs::Model>,
    from_method: String,
    to_method: String,
    from_number: Option<String>,
    to_number: Option<String>,
    tmoney_number: Option<String>,
    flooz_number: Option<String>,
    dynamic_fields: Option<String>,
    fees_basis: (f64, f64),
}

/// Exchange request lifecycle: creation, admin decision, reads.
#[derive(Clone)]
pub struct TransactionService {
    pool: DatabaseConnection,
    catalog: CatalogService,
    config: ConfigService,
    limits: LimitService,
    notifications: NotificationService,
    emails: EmailService,
}

impl TransactionService {
    pub fn new(
        pool: DatabaseConnection,
        catalog: CatalogService,
        config: ConfigService,
        limits: LimitService,
        notifications: NotificationService,
        emails: EmailService,
    ) -> Self {
        Self {
            pool,
            catalog,
            config,
            limits,
            notifications,
            emails,
        }
    }

    pub async fn check_reference(&self, reference: &str) -> AppResult<CheckReferenceResponse> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::ValidationError(
                "Payment reference is required".to_string(),
            ));
        }
        Ok(CheckReferenceResponse {
            used: self.reference_used(reference).await?,
        })
    }

    async fn reference_used(&self, reference: &str) -> AppResult<bool> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::PaymentReference.eq(reference))
            .one(&self.pool)
            .await?
            .is_some())
    }

    async fn resolve(&self, req: &CreateTransactionRequest) -> AppResult<Resolved> {
        let Some(pair_id) = req.exchange_pair_id else {
            let tmoney = req.tmoney_number.as_deref().ok_or_else(|| {
                AppError::ValidationError("tmoney_number is required".to_string())
            })?;
            let flooz = req.flooz_number.as_deref().ok_or_else(|| {
                AppError::ValidationError("flooz_number is required".to_string())
            })?;
            let percentage = self
                .config
                .get_f64(COMMISSION_PERCENTAGE)
                .await?
                .ok_or_else(|| {
                    AppError::ConfigError(format!("Config '{COMMISSION_PERCENTAGE}' is not set"))
                })?;
            return Ok(Resolved {
                pair: None,
                from_method: LEGACY_FROM_METHOD.to_string(),
                to_method: LEGACY_TO_METHOD.to_string(),
                from_number: None,
                to_number: None,
                tmoney_number: Some(validate_mobile_number(tmoney, "tmoney_number")?),
                flooz_number: Some(validate_mobile_number(flooz, "flooz_number")?),
                dynamic_fields: None,
                fees_basis: (percentage, 0.0),
            });
        };

        let pair = find_active_pair(&self.pool, pair_id).await?;
        let (from, to) = self.catalog.pair_methods(&pair).await?;
        if !(from.is_active && to.is_active) {
            return Err(AppError::ValidationError(
                "This exchange pair is not available".to_string(),
            ));
        }

        let answers = req.dynamic_fields.clone().unwrap_or_default();
        if pair.requires_additional_info && answers.is_empty() {
            return Err(AppError::ValidationError(
                "Additional information is required for this exchange".to_string(),
            ));
        }
        let declared = self.catalog.fields_for_pair(pair.id).await?;
        validate_dynamic_fields(&declared, &answers)?;

        let from_number = match non_empty(req.from_number.as_deref()) {
            Some(n) => validate_mobile_number(&n, "from_number")?,
            None => {
                return Err(AppError::ValidationError(
                    "from_number is required".to_string(),
                ));
            }
        };
        let to_number = match non_empty(req.to_number.as_deref()) {
            Some(n) => Some(validate_mobile_number(&n, "to_number")?),
            None if pair.show_to_number => {
                return Err(AppError::ValidationError(
                    "to_number is required".to_string(),
                ));
            }
            None => None,
        };

        let dynamic_fields = if answers.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&answers)?)
        };

        Ok(Resolved {
            fees_basis: (pair.fee_percentage, pair.tax_amount),
            pair: Some(pair),
            from_method: from.name,
            to_method: to.name,
            from_number: Some(from_number),
            to_number,
            tmoney_number: None,
            flooz_number: None,
            dynamic_fields,
        })
    }

    pub async fn create(
        &self,
        user_id: i64,
        req: CreateTransactionRequest,
    ) -> AppResult<CreateTransactionResponse> {
        if !req.amount.is_finite() || req.amount <= 0.0 {
            return Err(AppError::ValidationError(
                "Amount must be greater than zero".to_string(),
            ));
        }
        let reference = req.payment_reference.trim().to_string();
        if reference.is_empty() {
            return Err(AppError::ValidationError(
                "Payment reference is required".to_string(),
            ));
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        if self.reference_used(&reference).await? {
            return Err(AppError::Conflict(
                "This payment reference has already been used".to_string(),
            ));
        }

        let resolved = self.resolve(&req).await?;

        let bounds = amount_bounds(
            self.config.get_f64(MIN_AMOUNT).await?,
            self.config.get_f64(MAX_AMOUNT).await?,
            resolved.pair.as_ref(),
        );
        check_bounds(req.amount, bounds)?;

        let limit = self.limits.check_limit(user_id, req.amount).await?;
        if !limit.allowed {
            return Err(match limit.limit {
                Some(ceiling) => AppError::LimitExceeded {
                    current_total: limit.current_total.unwrap_or(0.0),
                    requested: req.amount,
                    limit: ceiling,
                },
                None => AppError::ValidationError(
                    limit
                        .message
                        .unwrap_or_else(|| "Monthly limit reached".to_string()),
                ),
            });
        }

        let (percentage, tax) = resolved.fees_basis;
        let fees = compute_fees(req.amount, percentage, tax);
        let automatic = resolved
            .pair
            .as_ref()
            .is_some_and(|p| p.automatic_processing);

        let txn = self.pool.begin().await?;
        let now = Utc::now();
        let tx = transactions::ActiveModel {
            transaction_id: Set(generate_transaction_id()),
            user_id: Set(user_id),
            tmoney_number: Set(resolved.tmoney_number),
            flooz_number: Set(resolved.flooz_number),
            from_number: Set(resolved.from_number),
            to_number: Set(resolved.to_number),
            amount: Set(req.amount),
            percentage: Set(fees.percentage),
            tax_amount: Set(fees.tax_amount),
            total_amount: Set(fees.total_amount),
            payment_reference: Set(reference),
            bookmaker_id: Set(non_empty(req.bookmaker_id.as_deref())),
            notes: Set(non_empty(req.notes.as_deref())),
            exchange_pair_id: Set(resolved.pair.as_ref().map(|p| p.id)),
            dynamic_fields: Set(resolved.dynamic_fields),
            status: Set(TransactionStatus::Pending),
            admin_message: Set(None),
            validated_by: Set(None),
            validated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        append_history(&txn, tx.id, TransactionStatus::Pending, Some("created"), None).await?;

        let notice = NotificationService::insert_in(
            &txn,
            NewNotification {
                user_id: None,
                admin_id: None,
                notification_type: NEW_TRANSACTION.to_string(),
                title: "New exchange request".to_string(),
                message: format!(
                    "{} requested {} FCFA ({} to {}), reference {}",
                    user.name, tx.amount, resolved.from_method, resolved.to_method, tx.payment_reference
                ),
                transaction_id: Some(tx.id),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Transaction {} created by user {} for {} FCFA",
            tx.transaction_id,
            user_id,
            tx.amount
        );

        self.notifications.publish_push(&notice).await;
        if let Some(email) = user.email.as_deref() {
            let mut vars = base_vars(&user, &tx, &resolved.from_method, &resolved.to_method);
            vars.insert("total_amount".to_string(), tx.total_amount.to_string());
            self.emails
                .queue(TRANSACTION_CREATED, None, email, &vars)
                .await;
        }

        Ok(CreateTransactionResponse {
            id: tx.id,
            transaction_id: tx.transaction_id,
            amount: tx.amount,
            percentage: fees.percentage,
            commission: fees.commission,
            tax_amount: fees.tax_amount,
            total_amount: fees.total_amount,
            status: tx.status,
            processing_info: ProcessingInfo::for_flag(automatic),
        })
    }

    /// Decide a pending transaction. The status change, its history row and the user's
    /// notification commit together; a transaction can be decided only once.
    pub async fn validate(
        &self,
        admin_id: i64,
        id: i64,
        req: ValidateTransactionRequest,
    ) -> AppResult<ValidateTransactionResponse> {
        let decision = req.status;
        if decision == TransactionStatus::Pending {
            return Err(AppError::ValidationError(
                "Status must be validated or rejected".to_string(),
            ));
        }
        let comment = non_empty(req.comment.as_deref());
        let admin_message = non_empty(req.admin_message.as_deref());

        let txn = self.pool.begin().await?;

        let current = transactions::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;
        if current.status != TransactionStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Transaction {} has already been {}",
                current.transaction_id, current.status
            )));
        }

        let pair = match current.exchange_pair_id {
            Some(pair_id) => pairs::Entity::find_by_id(pair_id).one(&txn).await?,
            None => None,
        };
        if decision == TransactionStatus::Validated
            && pair.as_ref().is_some_and(|p| p.is_subscription())
            && admin_message.is_none()
        {
            return Err(AppError::ValidationError(
                "An admin message with the subscription details is required".to_string(),
            ));
        }
        let to_method = match &pair {
            Some(p) => methods::Entity::find_by_id(p.to_method_id)
                .one(&txn)
                .await?
                .map(|m| m.name)
                .unwrap_or_default(),
            None => LEGACY_TO_METHOD.to_string(),
        };

        let now = Utc::now();
        let res = transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, Expr::value(decision))
            .col_expr(transactions::Column::ValidatedBy, Expr::value(admin_id))
            .col_expr(transactions::Column::ValidatedAt, Expr::value(now))
            .col_expr(
                transactions::Column::AdminMessage,
                Expr::value(admin_message.clone()),
            )
            .col_expr(transactions::Column::UpdatedAt, Expr::value(now))
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .exec(&txn)
            .await?;
        if res.rows_affected != 1 {
            return Err(AppError::Conflict(format!(
                "Transaction {} has already been processed",
                current.transaction_id
            )));
        }

        append_history(&txn, id, decision, comment.as_deref(), Some(admin_id)).await?;

        let (title, message) = decision_notice(
            &current,
            pair.as_ref(),
            &to_method,
            decision,
            comment.as_deref(),
            admin_message.as_deref(),
        );
        let notice_type = if decision == TransactionStatus::Validated {
            TRANSACTION_VALIDATED_NOTICE
        } else {
            TRANSACTION_REJECTED_NOTICE
        };
        let notice = NotificationService::insert_in(
            &txn,
            NewNotification {
                user_id: Some(current.user_id),
                admin_id: None,
                notification_type: notice_type.to_string(),
                title,
                message,
                transaction_id: Some(id),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Transaction {} {} by admin {}",
            current.transaction_id,
            decision,
            admin_id
        );

        self.notifications.publish_push(&notice).await;
        self.queue_decision_email(&current, pair.as_ref(), &to_method, decision, &comment, &admin_message)
            .await;

        Ok(ValidateTransactionResponse {
            status: "ok".to_string(),
            transaction_id: current.transaction_id,
            new_status: decision,
        })
    }

    async fn queue_decision_email(
        &self,
        tx: &transactions::Model,
        pair: Option<&pairs::Model>,
        to_method: &str,
        decision: TransactionStatus,
        comment: &Option<String>,
        admin_message: &Option<String>,
    ) {
        let user = match users::Entity::find_by_id(tx.user_id).one(&self.pool).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                log::error!("Could not load user {} for decision email: {e}", tx.user_id);
                return;
            }
        };
        let Some(email) = user.email.as_deref() else {
            return;
        };

        let from_method = match pair {
            Some(p) => methods::Entity::find_by_id(p.from_method_id)
                .one(&self.pool)
                .await
                .ok()
                .flatten()
                .map(|m| m.name)
                .unwrap_or_default(),
            None => LEGACY_FROM_METHOD.to_string(),
        };
        let mut vars = base_vars(&user, tx, &from_method, to_method);
        vars.insert("total_amount".to_string(), tx.total_amount.to_string());
        vars.insert("status".to_string(), decision.to_string());
        if let Some(c) = comment {
            vars.insert("comment".to_string(), c.clone());
        }
        if let Some(m) = admin_message {
            vars.insert("admin_message".to_string(), m.clone());
        }

        let (template_type, linked) = if decision == TransactionStatus::Validated {
            (
                TRANSACTION_VALIDATED,
                pair.and_then(|p| p.validated_email_template_id),
            )
        } else {
            (
                TRANSACTION_REJECTED,
                pair.and_then(|p| p.rejected_email_template_id),
            )
        };
        self.emails.queue(template_type, linked, email, &vars).await;
    }

    pub async fn list_my_transactions(
        &self,
        ctx: &AuthContext,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let user_id = ctx.require_user()?;
        let query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));
        self.page(query, params).await
    }

    /// Admin listing, newest first, optionally filtered by status and owner.
    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let mut select = transactions::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(transactions::Column::Status.eq(status));
        }
        if let Some(user_id) = query.user_id {
            select = select.filter(transactions::Column::UserId.eq(user_id));
        }
        let params = PaginationParams {
            page: query.page,
            page_size: query.page_size,
        };
        self.page(select, &params).await
    }

    async fn page(
        &self,
        select: sea_orm::Select<transactions::Entity>,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let (page, page_size) = normalize_page(params);
        let total = select.clone().count(&self.pool).await? as i64;
        let rows = select
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(page_size)
            .offset((page - 1) * page_size)
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            page as i64,
            page_size as i64,
            total,
        ))
    }

    /// Visible to its owner and to admins. History is newest first.
    pub async fn get_transaction(
        &self,
        ctx: &AuthContext,
        id: i64,
    ) -> AppResult<TransactionDetailResponse> {
        let tx = transactions::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;
        if !ctx.is_admin() && tx.user_id != ctx.subject_id {
            return Err(AppError::Forbidden);
        }
        let entries = history::Entity::find()
            .filter(history::Column::TransactionId.eq(tx.id))
            .order_by_desc(history::Column::CreatedAt)
            .order_by_desc(history::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(TransactionDetailResponse {
            transaction: tx.into(),
            history: entries.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn stats_overview(&self) -> AppResult<TransactionStats> {
        let mut stats = TransactionStats {
            total: transactions::Entity::find().count(&self.pool).await? as i64,
            ..Default::default()
        };
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Validated,
            TransactionStatus::Rejected,
        ] {
            let n = transactions::Entity::find()
                .filter(transactions::Column::Status.eq(status))
                .count(&self.pool)
                .await? as i64;
            match status {
                TransactionStatus::Pending => stats.pending = n,
                TransactionStatus::Validated => stats.validated = n,
                TransactionStatus::Rejected => stats.rejected = n,
            }
        }

        let sums: Option<(Option<f64>, Option<f64>)> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::Amount).sum(), "amount")
            .column_as(Expr::col(transactions::Column::TotalAmount).sum(), "total_amount")
            .filter(transactions::Column::Status.eq(TransactionStatus::Validated))
            .into_tuple()
            .one(&self.pool)
            .await?;
        if let Some((amount, total)) = sums {
            let total = total.unwrap_or(0.0);
            stats.validated_total_amount = total;
            stats.validated_commission = total - amount.unwrap_or(0.0);
        }

        stats.total_users = users::Entity::find().count(&self.pool).await? as i64;
        Ok(stats)
    }
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i64,
    status: TransactionStatus,
    comment: Option<&str>,
    changed_by: Option<i64>,
) -> AppResult<()> {
    history::ActiveModel {
        transaction_id: Set(transaction_id),
        status: Set(status),
        comment: Set(comment.map(str::to_string)),
        changed_by: Set(changed_by),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn base_vars(
    user: &users::Model,
    tx: &transactions::Model,
    from_method: &str,
    to_method: &str,
) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("user_name".to_string(), user.name.clone());
    vars.insert("transaction_id".to_string(), tx.transaction_id.clone());
    vars.insert("amount".to_string(), tx.amount.to_string());
    vars.insert("from_method".to_string(), from_method.to_string());
    vars.insert("to_method".to_string(), to_method.to_string());
    vars
}
