mod common;

use chrono::{DateTime, Duration, Local, Utc};
use common::*;
use emb_exchange::AppError;
use emb_exchange::config::MissingLimitPolicy;
use emb_exchange::entities::{
    KycStatus, TransactionStatus, config_entity as config, transaction_entity as transactions,
};
use emb_exchange::services::{LimitService, month_bounds};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

async fn insert_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    amount: f64,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
) {
    transactions::ActiveModel {
        transaction_id: Set(format!("EMB-{}", uuid::Uuid::new_v4().simple())),
        user_id: Set(user_id),
        tmoney_number: Set(None),
        flooz_number: Set(None),
        from_number: Set(Some("90112233".to_string())),
        to_number: Set(Some("96112233".to_string())),
        amount: Set(amount),
        percentage: Set(0.0),
        tax_amount: Set(0.0),
        total_amount: Set(amount),
        payment_reference: Set(format!("SEED-{}", uuid::Uuid::new_v4().simple())),
        bookmaker_id: Set(None),
        notes: Set(None),
        exchange_pair_id: Set(None),
        dynamic_fields: Set(None),
        status: Set(status),
        admin_message: Set(None),
        validated_by: Set(None),
        validated_at: Set(None),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

async fn remove_config(db: &DatabaseConnection, key: &str) {
    config::Entity::delete_many()
        .filter(config::Column::Key.eq(key))
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn monthly_total_counts_validated_volume_inside_the_month() {
    let app = setup().await;
    let user = insert_user(&app.db, "91000001", None).await;
    let other = insert_user(&app.db, "91000002", None).await;
    let (start, end) = month_bounds(&Local::now());

    insert_transaction(&app.db, user.id, 10_000.0, TransactionStatus::Validated, start).await;
    insert_transaction(
        &app.db,
        user.id,
        5_000.0,
        TransactionStatus::Validated,
        end - Duration::seconds(1),
    )
    .await;
    // outside the month
    insert_transaction(&app.db, user.id, 7_000.0, TransactionStatus::Validated, end).await;
    insert_transaction(
        &app.db,
        user.id,
        9_000.0,
        TransactionStatus::Validated,
        start - Duration::seconds(1),
    )
    .await;
    // not validated
    insert_transaction(
        &app.db,
        user.id,
        3_000.0,
        TransactionStatus::Pending,
        start + Duration::hours(1),
    )
    .await;
    insert_transaction(
        &app.db,
        user.id,
        2_000.0,
        TransactionStatus::Rejected,
        start + Duration::hours(2),
    )
    .await;
    insert_transaction(&app.db, other.id, 4_000.0, TransactionStatus::Validated, start).await;

    let total = LimitService::monthly_total_in(&app.db, user.id, (start, end))
        .await
        .unwrap();
    assert_eq!(total, 15_000.0);
    assert_eq!(app.limits.get_monthly_total(user.id).await.unwrap(), 15_000.0);
}

#[tokio::test]
async fn empty_month_totals_zero() {
    let app = setup().await;
    let user = insert_user(&app.db, "91000003", None).await;
    assert_eq!(app.limits.get_monthly_total(user.id).await.unwrap(), 0.0);
}

#[tokio::test]
async fn limit_check_allows_up_to_the_ceiling() {
    let app = setup().await;
    app.config
        .set("monthly_limit_without_kyc", "20000")
        .await
        .unwrap();
    let user = insert_user(&app.db, "91000004", None).await;
    let (start, _) = month_bounds(&Local::now());
    insert_transaction(&app.db, user.id, 15_000.0, TransactionStatus::Validated, start).await;

    let at_ceiling = app.limits.check_limit(user.id, 5_000.0).await.unwrap();
    assert!(at_ceiling.allowed);
    assert_eq!(at_ceiling.remaining, Some(0.0));

    let over = app.limits.check_limit(user.id, 6_000.0).await.unwrap();
    assert!(!over.allowed);
    assert_eq!(over.current_total, Some(15_000.0));
    assert_eq!(over.limit, Some(20_000.0));
    assert!(over.message.is_some());

    let stats = app.limits.monthly_limit_stats(user.id).await.unwrap();
    assert_eq!(stats.current_total, 15_000.0);
    assert_eq!(stats.limit, Some(20_000.0));
    assert_eq!(stats.remaining, Some(5_000.0));
    assert!(!stats.has_kyc);
}

#[tokio::test]
async fn creation_over_the_limit_is_refused_without_writing() {
    let app = setup().await;
    app.config
        .set("monthly_limit_without_kyc", "20000")
        .await
        .unwrap();
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "91000005", None).await;
    let (start, _) = month_bounds(&Local::now());
    insert_transaction(&app.db, user.id, 15_000.0, TransactionStatus::Validated, start).await;

    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 6_000.0, "REF-OVER"))
        .await
        .unwrap_err();
    match err {
        AppError::LimitExceeded {
            current_total,
            requested,
            limit,
        } => {
            assert_eq!(current_total, 15_000.0);
            assert_eq!(requested, 6_000.0);
            assert_eq!(limit, 20_000.0);
        }
        other => panic!("expected LimitExceeded, got {other:?}"),
    }
    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 1);

    // pending requests do not consume the allowance
    app.transactions
        .create(user.id, pair_request(pair_id, 5_000.0, "REF-FIT"))
        .await
        .unwrap();
    app.transactions
        .create(user.id, pair_request(pair_id, 5_000.0, "REF-FIT-2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn verified_kyc_switches_to_the_higher_ceiling() {
    let app = setup().await;
    app.config
        .set("monthly_limit_without_kyc", "20000")
        .await
        .unwrap();
    let user = insert_user(&app.db, "91000006", None).await;

    assert!(!app.limits.check_limit(user.id, 30_000.0).await.unwrap().allowed);

    app.admin
        .set_kyc_status(user.id, KycStatus::Verified)
        .await
        .unwrap();
    let check = app.limits.check_limit(user.id, 30_000.0).await.unwrap();
    assert!(check.allowed);
    assert_eq!(check.limit, Some(5_000_000.0));
}

#[tokio::test]
async fn missing_limit_fails_open_by_default() {
    let app = setup().await;
    remove_config(&app.db, "monthly_limit_without_kyc").await;
    let user = insert_user(&app.db, "91000007", None).await;

    let check = app.limits.check_limit(user.id, 1_000_000_000.0).await.unwrap();
    assert!(check.allowed);
    assert_eq!(check.limit, None);
}

#[tokio::test]
async fn missing_limit_blocks_when_failing_closed() {
    let app = setup_with_policy(MissingLimitPolicy::FailClosed).await;
    remove_config(&app.db, "monthly_limit_without_kyc").await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "91000008", None).await;

    let check = app.limits.check_limit(user.id, 1_000.0).await.unwrap();
    assert!(!check.allowed);
    assert_eq!(check.limit, None);

    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 1_000.0, "REF-CLOSED"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_user_has_no_limit_view() {
    let app = setup().await;
    let err = app.limits.check_limit(4242, 1_000.0).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
