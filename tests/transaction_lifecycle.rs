mod common;

use common::*;
use emb_exchange::AppError;
use chrono::Utc;
use emb_exchange::entities::{
    FieldType, PairCategory, TransactionStatus, email_template_entity as templates,
    notification_entity as notifications, transaction_entity as transactions,
    transaction_history_entity as history,
};
use emb_exchange::models::{
    AuthContext, CreateExchangeFieldRequest, DynamicFields, ValidateTransactionRequest,
};
use emb_exchange::services::DeliveryJob;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;

async fn insert_template(
    db: &DatabaseConnection,
    template_type: &str,
    subject: &str,
    html_body: &str,
) -> templates::Model {
    let now = Utc::now();
    templates::ActiveModel {
        template_type: Set(template_type.to_string()),
        name: Set(subject.to_string()),
        subject: Set(subject.to_string()),
        html_body: Set(html_body.to_string()),
        text_body: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

fn field(
    name: &str,
    field_type: FieldType,
    required: bool,
    options: &[&str],
) -> CreateExchangeFieldRequest {
    CreateExchangeFieldRequest {
        field_name: name.to_string(),
        field_type,
        field_label: name.to_string(),
        placeholder: None,
        is_required: required,
        options: (!options.is_empty()).then(|| options.iter().map(|o| o.to_string()).collect()),
    }
}

fn emails(jobs: Vec<DeliveryJob>) -> Vec<emb_exchange::external::EmailMessage> {
    jobs.into_iter()
        .filter_map(|job| match job {
            DeliveryJob::Email(message) => Some(message),
            DeliveryJob::Push { .. } => None,
        })
        .collect()
}

fn decision(status: TransactionStatus, admin_message: Option<&str>) -> ValidateTransactionRequest {
    ValidateTransactionRequest {
        status,
        comment: None,
        admin_message: admin_message.map(str::to_string),
    }
}

#[tokio::test]
async fn pair_transaction_is_priced_and_recorded_as_pending() {
    let mut app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000001", None).await;

    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-1000"))
        .await
        .unwrap();

    assert_eq!(created.commission, 20.0);
    assert_eq!(created.tax_amount, 100.0);
    assert_eq!(created.total_amount, 1120.0);
    assert_eq!(created.status, TransactionStatus::Pending);
    assert!(created.transaction_id.starts_with("EMB-"));

    let row = transactions::Entity::find_by_id(created.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.total_amount, 1120.0);
    assert_eq!(row.exchange_pair_id, Some(pair_id));

    let entries = history::Entity::find()
        .filter(history::Column::TransactionId.eq(created.id))
        .all(&app.db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, TransactionStatus::Pending);

    let broadcast = notifications::Entity::find()
        .filter(notifications::Column::TransactionId.eq(created.id))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(broadcast.user_id.is_none() && broadcast.admin_id.is_none());

    // no email address and no registered devices
    assert!(drain(&mut app.jobs).is_empty());
}

#[tokio::test]
async fn amount_below_pair_minimum_persists_nothing() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000002", None).await;

    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 100.0, "REF-LOW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(history::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn pair_maximum_applies_even_when_global_maximum_is_higher() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000003", None).await;

    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 60_000.0, "REF-HIGH"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    app.transactions
        .create(user.id, pair_request(pair_id, 50_000.0, "REF-EDGE"))
        .await
        .unwrap();
}

#[tokio::test]
async fn legacy_flow_uses_configured_commission() {
    let app = setup().await;
    let user = insert_user(&app.db, "90000004", None).await;

    let created = app
        .transactions
        .create(user.id, legacy_request(10_000.0, "LEGACY-1"))
        .await
        .unwrap();

    assert_eq!(created.percentage, 2.5);
    assert_eq!(created.commission, 250.0);
    assert_eq!(created.tax_amount, 0.0);
    assert_eq!(created.total_amount, 10_250.0);
}

#[tokio::test]
async fn payment_reference_cannot_be_reused() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000005", None).await;

    app.transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-DUP"))
        .await
        .unwrap();
    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 2000.0, "REF-DUP"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert!(app.transactions.check_reference("REF-DUP").await.unwrap().used);
    assert!(!app.transactions.check_reference("REF-NEW").await.unwrap().used);
}

#[tokio::test]
async fn inactive_user_cannot_create() {
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000006", None).await;
    let mut am = user.into_active_model();
    am.is_active = Set(false);
    let user = am.update(&app.db).await.unwrap();

    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-OFF"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn transaction_is_decided_only_once() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000007", None).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-ONCE"))
        .await
        .unwrap();

    let res = app
        .transactions
        .validate(admin.id, created.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();
    assert_eq!(res.status, "ok");
    assert_eq!(res.new_status, TransactionStatus::Validated);

    let err = app
        .transactions
        .validate(admin.id, created.id, decision(TransactionStatus::Rejected, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let row = transactions::Entity::find_by_id(created.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, TransactionStatus::Validated);
    assert_eq!(row.validated_by, Some(admin.id));
    assert!(row.validated_at.is_some());

    let entries = history::Entity::find()
        .filter(history::Column::TransactionId.eq(created.id))
        .order_by_asc(history::Column::Id)
        .all(&app.db)
        .await
        .unwrap();
    let statuses: Vec<_> = entries.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![TransactionStatus::Pending, TransactionStatus::Validated]
    );
    assert_eq!(entries[1].changed_by, Some(admin.id));
}

#[tokio::test]
async fn pending_is_not_a_decision() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000008", None).await;
    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-PEND"))
        .await
        .unwrap();

    let err = app
        .transactions
        .validate(1, created.id, decision(TransactionStatus::Pending, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .transactions
        .validate(1, 9999, decision(TransactionStatus::Validated, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn validation_notice_names_amount_and_destination() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000009", None).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 5000.0, "REF-5000"))
        .await
        .unwrap();

    app.transactions
        .validate(admin.id, created.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();

    let list = app
        .notifications
        .list(&AuthContext::user(user.id))
        .await
        .unwrap();
    assert_eq!(list.unread_count, 1);
    let notice = &list.notifications[0];
    assert!(notice.message.contains("5000"));
    assert!(notice.message.contains("Flooz"));
}

#[tokio::test]
async fn rejection_notice_carries_the_reason() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000010", None).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 3000.0, "REF-REJ"))
        .await
        .unwrap();

    let req = ValidateTransactionRequest {
        status: TransactionStatus::Rejected,
        comment: Some("Payment not received".to_string()),
        admin_message: None,
    };
    app.transactions
        .validate(admin.id, created.id, req)
        .await
        .unwrap();

    let list = app
        .notifications
        .list(&AuthContext::user(user.id))
        .await
        .unwrap();
    assert!(list.notifications[0].message.contains("Payment not received"));
}

#[tokio::test]
async fn subscription_validation_requires_admin_message() {
    let app = setup().await;
    let netflix = insert_method(&app.db, "netflix", "Netflix").await;
    let tmoney = insert_method(&app.db, "tmoney", "T-Money").await;
    let mut req = basic_pair_request(tmoney.id, netflix.id, 0.0, 0.0, 500.0, 50_000.0);
    req.category = Some(PairCategory::Subscription);
    req.show_to_number = Some(false);
    let pair = app.catalog.create_pair(req).await.unwrap();

    let user = insert_user(&app.db, "90000011", None).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let mut tx_req = pair_request(pair.id, 4000.0, "REF-SUB");
    tx_req.to_number = None;
    let created = app.transactions.create(user.id, tx_req).await.unwrap();

    let err = app
        .transactions
        .validate(admin.id, created.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    let row = transactions::Entity::find_by_id(created.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, TransactionStatus::Pending);

    let message = "Your code: ABCD-1234, valid 30 days";
    app.transactions
        .validate(
            admin.id,
            created.id,
            decision(TransactionStatus::Validated, Some(message)),
        )
        .await
        .unwrap();

    let list = app
        .notifications
        .list(&AuthContext::user(user.id))
        .await
        .unwrap();
    assert_eq!(list.notifications[0].message, message);
}

#[tokio::test]
async fn decisions_fan_out_to_devices_and_email_after_commit() {
    let mut app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000012", Some("kossi@example.tg")).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    app.notifications
        .register_push_token(&AuthContext::admin(admin.id), "admin-device", "android")
        .await
        .unwrap();
    app.notifications
        .register_push_token(&AuthContext::user(user.id), "user-device", "ios")
        .await
        .unwrap();

    let created = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-FAN"))
        .await
        .unwrap();
    let jobs = drain(&mut app.jobs);
    assert!(jobs.iter().any(
        |j| matches!(j, DeliveryJob::Push { token, .. } if token == "admin-device")
    ));
    assert!(!jobs.iter().any(
        |j| matches!(j, DeliveryJob::Push { token, .. } if token == "user-device")
    ));
    assert!(jobs.iter().any(
        |j| matches!(j, DeliveryJob::Email(m) if m.to == "kossi@example.tg")
    ));

    app.transactions
        .validate(admin.id, created.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();
    let jobs = drain(&mut app.jobs);
    assert!(jobs.iter().any(
        |j| matches!(j, DeliveryJob::Push { token, .. } if token == "user-device")
    ));
    assert!(jobs.iter().any(
        |j| matches!(j, DeliveryJob::Email(m) if m.to == "kossi@example.tg")
    ));
}

#[tokio::test]
async fn owners_and_admins_read_a_transaction() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let owner = insert_user(&app.db, "90000013", None).await;
    let stranger = insert_user(&app.db, "90000014", None).await;
    let created = app
        .transactions
        .create(owner.id, pair_request(pair_id, 1000.0, "REF-READ"))
        .await
        .unwrap();

    let detail = app
        .transactions
        .get_transaction(&AuthContext::user(owner.id), created.id)
        .await
        .unwrap();
    assert_eq!(detail.history.len(), 1);

    let err = app
        .transactions
        .get_transaction(&AuthContext::user(stranger.id), created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    app.transactions
        .get_transaction(&AuthContext::admin(1), created.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn legacy_amounts_outside_global_bounds_write_nothing() {
    let app = setup().await;
    let user = insert_user(&app.db, "90000015", None).await;

    // seeded bounds are 500..=500000
    let err = app
        .transactions
        .create(user.id, legacy_request(100.0, "LEGACY-LOW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .transactions
        .create(user.id, legacy_request(600_000.0, "LEGACY-HIGH"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(history::Entity::find().count(&app.db).await.unwrap(), 0);

    app.transactions
        .create(user.id, legacy_request(500_000.0, "LEGACY-EDGE"))
        .await
        .unwrap();
}

#[tokio::test]
async fn extra_answers_are_required_and_stored_as_json() {
    let app = setup().await;
    let tmoney = insert_method(&app.db, "tmoney", "T-Money").await;
    let canal = insert_method(&app.db, "canal", "Canal+").await;
    let mut req = basic_pair_request(tmoney.id, canal.id, 0.0, 0.0, 500.0, 50_000.0);
    req.requires_additional_info = true;
    req.fields = vec![
        field("decoder", FieldType::Number, true, &[]),
        field("plan", FieldType::Select, true, &["access", "evasion"]),
        field("email", FieldType::Email, false, &[]),
    ];
    let pair = app.catalog.create_pair(req).await.unwrap();
    let user = insert_user(&app.db, "90000016", None).await;

    let err = app
        .transactions
        .create(user.id, pair_request(pair.id, 5000.0, "REF-NOBLOB"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let mut partial = pair_request(pair.id, 5000.0, "REF-PARTIAL");
    let mut answers = DynamicFields::new();
    answers.insert("decoder".to_string(), json!("123456"));
    partial.dynamic_fields = Some(answers);
    let err = app.transactions.create(user.id, partial).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 0);

    let mut complete = pair_request(pair.id, 5000.0, "REF-FULL");
    let mut answers = DynamicFields::new();
    answers.insert("decoder".to_string(), json!("123456"));
    answers.insert("plan".to_string(), json!("evasion"));
    complete.dynamic_fields = Some(answers);
    let created = app.transactions.create(user.id, complete).await.unwrap();

    let row = transactions::Entity::find_by_id(created.id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let stored: serde_json::Value =
        serde_json::from_str(row.dynamic_fields.as_deref().unwrap()).unwrap();
    assert_eq!(stored, json!({"decoder": "123456", "plan": "evasion"}));
}

#[tokio::test]
async fn pair_linked_template_wins_over_type_template() {
    let mut app = setup().await;
    let tmoney = insert_method(&app.db, "tmoney", "T-Money").await;
    let flooz = insert_method(&app.db, "flooz", "Flooz").await;
    let moov = insert_method(&app.db, "moov", "Moov").await;
    insert_template(
        &app.db,
        "transaction_validated",
        "Type {{transaction_id}}",
        "<p>type template</p>",
    )
    .await;
    let linked = insert_template(
        &app.db,
        "custom",
        "Linked {{transaction_id}}",
        "<p>Linked {{amount}} to {{to_method}}</p>",
    )
    .await;

    let mut req = basic_pair_request(tmoney.id, flooz.id, 2.0, 100.0, 500.0, 50_000.0);
    req.validated_email_template_id = Some(linked.id);
    let linked_pair = app.catalog.create_pair(req).await.unwrap();
    let plain_pair = app
        .catalog
        .create_pair(basic_pair_request(tmoney.id, moov.id, 2.0, 100.0, 500.0, 50_000.0))
        .await
        .unwrap();

    let user = insert_user(&app.db, "90000017", Some("afi@example.tg")).await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let first = app
        .transactions
        .create(user.id, pair_request(linked_pair.id, 1000.0, "REF-LINKED"))
        .await
        .unwrap();
    let second = app
        .transactions
        .create(user.id, pair_request(plain_pair.id, 1000.0, "REF-PLAIN"))
        .await
        .unwrap();
    drain(&mut app.jobs);

    app.transactions
        .validate(admin.id, first.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();
    let sent = emails(drain(&mut app.jobs));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Linked {}", first.transaction_id));
    assert_eq!(sent[0].html, "<p>Linked 1000 to Flooz</p>");

    app.transactions
        .validate(admin.id, second.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();
    let sent = emails(drain(&mut app.jobs));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Type {}", second.transaction_id));
    assert_eq!(sent[0].html, "<p>type template</p>");
}

#[tokio::test]
async fn overview_counts_statuses_and_validated_fees() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let user = insert_user(&app.db, "90000018", None).await;
    let admin = insert_admin(&app.db, "reviewer").await;

    let validated = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-STAT-1"))
        .await
        .unwrap();
    let rejected = app
        .transactions
        .create(user.id, pair_request(pair_id, 2000.0, "REF-STAT-2"))
        .await
        .unwrap();
    app.transactions
        .create(user.id, pair_request(pair_id, 500.0, "REF-STAT-3"))
        .await
        .unwrap();
    app.transactions
        .validate(admin.id, validated.id, decision(TransactionStatus::Validated, None))
        .await
        .unwrap();
    app.transactions
        .validate(admin.id, rejected.id, decision(TransactionStatus::Rejected, None))
        .await
        .unwrap();

    let stats = app.transactions.stats_overview().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!((stats.pending, stats.validated, stats.rejected), (1, 1, 1));
    // 1000 at 2% plus 100 tax
    assert_eq!(stats.validated_total_amount, 1120.0);
    assert_eq!(stats.validated_commission, 120.0);
    assert_eq!(stats.total_users, 1);
}
