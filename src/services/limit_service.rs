use crate::config::MissingLimitPolicy;
use crate::entities::{TransactionStatus, transaction_entity as transactions, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{MonthlyLimitCheck, MonthlyLimitStats};
use crate::services::config_service::{
    ConfigService, MONTHLY_LIMIT_WITH_KYC, MONTHLY_LIMIT_WITHOUT_KYC,
};
use chrono::{
    DateTime, Datelike, Days, Duration, Local, LocalResult, Months, NaiveDate, NaiveDateTime,
    NaiveTime, TimeZone, Utc,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

/// Longest run of skipped local minutes searched for after a DST jump.
const MAX_GAP_MINUTES: u32 = 24 * 60;

/// Calendar month containing `now`, in `now`'s timezone, as a half-open UTC range
/// `[first instant of the month, first instant of the next month)`.
pub fn month_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let first = today - Days::new(u64::from(today.day0()));
    let next_first = first + Months::new(1);
    (midnight_utc(&tz, first), midnight_utc(&tz, next_first))
}

fn midnight_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    first_valid_instant(midnight, |local| {
        tz.from_local_datetime(&local).map(|dt| dt.with_timezone(&Utc))
    })
}

/// Earliest instant whose local time is `local` or later. A local time skipped by a DST
/// jump resolves to the first minute after the gap.
fn first_valid_instant<F>(local: NaiveDateTime, resolve: F) -> DateTime<Utc>
where
    F: Fn(NaiveDateTime) -> LocalResult<DateTime<Utc>>,
{
    let mut candidate = local;
    for _ in 0..=MAX_GAP_MINUTES {
        match resolve(candidate) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => return dt,
            LocalResult::None => candidate += Duration::minutes(1),
        }
    }
    log::warn!("No valid local time within a day of {local}, reading it as UTC");
    Utc.from_utc_datetime(&local)
}

/// Which limit key applies to a user.
pub fn limit_key(user: &users::Model) -> &'static str {
    if user.has_verified_kyc() {
        MONTHLY_LIMIT_WITH_KYC
    } else {
        MONTHLY_LIMIT_WITHOUT_KYC
    }
}

/// Pure decision for a pre-check given the month's total and the tier limit.
pub fn evaluate_limit(
    current_total: f64,
    amount: f64,
    limit: Option<f64>,
    policy: MissingLimitPolicy,
    has_kyc: bool,
) -> MonthlyLimitCheck {
    let Some(limit) = limit else {
        return match policy {
            MissingLimitPolicy::FailOpen => MonthlyLimitCheck::unlimited(),
            MissingLimitPolicy::FailClosed => MonthlyLimitCheck {
                allowed: false,
                current_total: Some(current_total),
                limit: None,
                remaining: None,
                message: Some("No monthly limit is configured; exchanges are suspended".to_string()),
            },
        };
    };

    let new_total = current_total + amount;
    if new_total > limit {
        let tier = if has_kyc { "with verified KYC" } else { "without KYC" };
        return MonthlyLimitCheck {
            allowed: false,
            current_total: Some(current_total),
            limit: Some(limit),
            remaining: Some((limit - current_total).max(0.0)),
            message: Some(format!(
                "Monthly limit exceeded. You already exchanged {current_total} FCFA this month; \
                 the monthly limit for users {tier} is {limit} FCFA."
            )),
        };
    }

    MonthlyLimitCheck {
        allowed: true,
        current_total: Some(current_total),
        limit: Some(limit),
        remaining: Some(limit - new_total),
        message: None,
    }
}

/// Monthly validated-volume ceilings by KYC tier.
#[derive(Clone)]
pub struct LimitService {
    pool: DatabaseConnection,
    config: ConfigService,
    policy: MissingLimitPolicy,
}

impl LimitService {
    pub fn new(pool: DatabaseConnection, config: ConfigService, policy: MissingLimitPolicy) -> Self {
        Self {
            pool,
            config,
            policy,
        }
    }

    /// Sum of `amount` over the user's validated transactions created this calendar month
    /// (server-local time).
    pub async fn get_monthly_total(&self, user_id: i64) -> AppResult<f64> {
        let bounds = month_bounds(&Local::now());
        Self::monthly_total_in(&self.pool, user_id, bounds).await
    }

    pub async fn monthly_total_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
    ) -> AppResult<f64> {
        let total: Option<Option<f64>> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::Amount).sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Validated))
            .filter(transactions::Column::CreatedAt.gte(start))
            .filter(transactions::Column::CreatedAt.lt(end))
            .into_tuple()
            .one(conn)
            .await?;
        Ok(total.flatten().unwrap_or(0.0))
    }

    async fn load_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn check_limit(&self, user_id: i64, amount: f64) -> AppResult<MonthlyLimitCheck> {
        let user = self.load_user(user_id).await?;
        let key = limit_key(&user);
        let limit = self.config.get_f64(key).await?;
        if limit.is_none() {
            log::warn!("Config '{key}' missing, applying {:?}", self.policy);
            if self.policy == MissingLimitPolicy::FailOpen {
                return Ok(MonthlyLimitCheck::unlimited());
            }
        }
        let current = self.get_monthly_total(user_id).await?;
        Ok(evaluate_limit(
            current,
            amount,
            limit,
            self.policy,
            user.has_verified_kyc(),
        ))
    }

    pub async fn monthly_limit_stats(&self, user_id: i64) -> AppResult<MonthlyLimitStats> {
        let user = self.load_user(user_id).await?;
        let limit = self.config.get_f64(limit_key(&user)).await?;
        let current_total = self.get_monthly_total(user_id).await?;
        Ok(MonthlyLimitStats {
            current_total,
            limit,
            remaining: limit.map(|l| (l - current_total).max(0.0)),
            has_kyc: user.has_verified_kyc(),
        })
    }
}
