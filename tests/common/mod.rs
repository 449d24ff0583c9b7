#![allow(dead_code)]

use chrono::Utc;
use emb_exchange::config::MissingLimitPolicy;
use emb_exchange::entities::{
    KycStatus, admin_entity as admins, payment_method_entity as methods, user_entity as users,
};
use emb_exchange::models::{CreateExchangePairRequest, CreateTransactionRequest};
use emb_exchange::services::*;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct TestApp {
    pub db: DatabaseConnection,
    pub config: ConfigService,
    pub catalog: CatalogService,
    pub limits: LimitService,
    pub notifications: NotificationService,
    pub transactions: TransactionService,
    pub admin: AdminService,
    pub jobs: UnboundedReceiver<DeliveryJob>,
}

pub async fn setup() -> TestApp {
    setup_with_policy(MissingLimitPolicy::FailOpen).await
}

pub async fn setup_with_policy(policy: MissingLimitPolicy) -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let (queue, jobs) = DeliveryQueue::channel();
    let config = ConfigService::new(db.clone());
    let catalog = CatalogService::new(db.clone());
    let limits = LimitService::new(db.clone(), config.clone(), policy);
    let notifications = NotificationService::new(db.clone(), queue.clone());
    let emails = EmailService::new(db.clone(), queue);
    let transactions = TransactionService::new(
        db.clone(),
        catalog.clone(),
        config.clone(),
        limits.clone(),
        notifications.clone(),
        emails,
    );
    let admin = AdminService::new(db.clone());

    TestApp {
        db,
        config,
        catalog,
        limits,
        notifications,
        transactions,
        admin,
        jobs,
    }
}

pub async fn insert_user(db: &DatabaseConnection, phone: &str, email: Option<&str>) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        phone: Set(phone.to_string()),
        name: Set("Kossi".to_string()),
        email: Set(email.map(str::to_string)),
        password_hash: Set("not-a-real-hash".to_string()),
        is_active: Set(true),
        kyc_verified: Set(false),
        kyc_status: Set(KycStatus::Pending),
        newsletter_subscribed: Set(false),
        terms_accepted_at: Set(Some(now)),
        privacy_accepted_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_admin(db: &DatabaseConnection, username: &str) -> admins::Model {
    admins::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        email: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_method(db: &DatabaseConnection, code: &str, name: &str) -> methods::Model {
    methods::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        icon: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A pair with only its terms set; every display option is left empty.
pub fn basic_pair_request(
    from_method_id: i64,
    to_method_id: i64,
    fee_percentage: f64,
    tax_amount: f64,
    min_amount: f64,
    max_amount: f64,
) -> CreateExchangePairRequest {
    CreateExchangePairRequest {
        from_method_id,
        to_method_id,
        fee_percentage,
        tax_amount,
        min_amount,
        max_amount,
        category: None,
        requires_additional_info: false,
        automatic_processing: false,
        payment_syntax_type: None,
        payment_syntax_value: None,
        instruction_title: None,
        instruction_content: None,
        instruction_link_url: None,
        instruction_link_text: None,
        from_number_label: None,
        from_number_placeholder: None,
        to_number_label: None,
        to_number_placeholder: None,
        show_to_number: None,
        amount_label: None,
        amount_placeholder: None,
        reference_required: None,
        reference_label: None,
        reference_placeholder: None,
        validated_email_template_id: None,
        rejected_email_template_id: None,
        fields: Vec::new(),
    }
}

/// T-Money to Flooz at 2% plus 100 FCFA, amounts 500..=50000.
pub async fn money_exchange_pair(app: &TestApp) -> i64 {
    let tmoney = insert_method(&app.db, "tmoney", "T-Money").await;
    let flooz = insert_method(&app.db, "flooz", "Flooz").await;
    let req = basic_pair_request(tmoney.id, flooz.id, 2.0, 100.0, 500.0, 50_000.0);
    app.catalog.create_pair(req).await.unwrap().id
}

pub fn pair_request(pair_id: i64, amount: f64, reference: &str) -> CreateTransactionRequest {
    CreateTransactionRequest {
        amount,
        payment_reference: reference.to_string(),
        exchange_pair_id: Some(pair_id),
        from_number: Some("90112233".to_string()),
        to_number: Some("96112233".to_string()),
        tmoney_number: None,
        flooz_number: None,
        bookmaker_id: None,
        notes: None,
        dynamic_fields: None,
    }
}

/// A request without a pair, bounded by the global amount settings.
pub fn legacy_request(amount: f64, reference: &str) -> CreateTransactionRequest {
    CreateTransactionRequest {
        amount,
        payment_reference: reference.to_string(),
        exchange_pair_id: None,
        from_number: None,
        to_number: None,
        tmoney_number: Some("90112233".to_string()),
        flooz_number: Some("96112233".to_string()),
        bookmaker_id: None,
        notes: None,
        dynamic_fields: None,
    }
}

pub fn drain(jobs: &mut UnboundedReceiver<DeliveryJob>) -> Vec<DeliveryJob> {
    let mut out = Vec::new();
    while let Ok(job) = jobs.try_recv() {
        out.push(job);
    }
    out
}
