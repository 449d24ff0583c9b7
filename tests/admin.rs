mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use emb_exchange::config::BootstrapAdminConfig;
use emb_exchange::external::{EmailMessage, EmailSender};
use emb_exchange::models::{
    AdminLoginRequest, AuthContext, CreateAdminRequest, TransactionQuery, UserQuery,
};
use emb_exchange::services::{AuthService, Permission};
use emb_exchange::utils::JwtService;
use emb_exchange::{AppError, AppResult};

struct NoMail;

#[async_trait]
impl EmailSender for NoMail {
    async fn send(&self, _message: &EmailMessage) -> AppResult<()> {
        Ok(())
    }
}

fn root_config() -> BootstrapAdminConfig {
    BootstrapAdminConfig {
        username: "root".to_string(),
        password: "Bootstrap123".to_string(),
        email: Some("Root@EMB.tg".to_string()),
    }
}

fn admin_request(username: &str, password: &str) -> CreateAdminRequest {
    CreateAdminRequest {
        username: username.to_string(),
        password: password.to_string(),
        email: None,
    }
}

#[tokio::test]
async fn bootstrap_creates_the_first_admin_with_every_permission() {
    let app = setup().await;

    let root = app.admin.bootstrap(&root_config()).await.unwrap().unwrap();
    assert_eq!(root.username, "root");
    assert_eq!(root.email.as_deref(), Some("root@emb.tg"));

    let catalog = app.admin.list_permissions().await.unwrap();
    assert_eq!(catalog.len(), 9);
    let mut held = app.admin.admin_permissions(root.id).await.unwrap();
    held.sort();
    let mut all: Vec<_> = catalog.into_iter().map(|p| p.code).collect();
    all.sort();
    assert_eq!(held, all);

    // a second start leaves the table alone
    let again = BootstrapAdminConfig {
        username: "other".to_string(),
        ..root_config()
    };
    assert!(app.admin.bootstrap(&again).await.unwrap().is_none());

    let auth = AuthService::new(
        app.db.clone(),
        JwtService::new("test-secret", 3600, 600),
        app.admin.clone(),
        Arc::new(NoMail),
    );
    let session = auth
        .admin_login(AdminLoginRequest {
            username: "root".to_string(),
            password: "Bootstrap123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.admin.id, root.id);
    assert_eq!(session.permissions.len(), 9);
    let err = auth
        .admin_login(AdminLoginRequest {
            username: "other".to_string(),
            password: "Bootstrap123".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));
}

#[tokio::test]
async fn bootstrap_skips_when_an_admin_exists() {
    let app = setup().await;
    insert_admin(&app.db, "ops").await;
    assert!(app.admin.bootstrap(&root_config()).await.unwrap().is_none());
}

#[tokio::test]
async fn admin_accounts_need_a_unique_name_and_a_strong_password() {
    let app = setup().await;

    let created = app
        .admin
        .create_admin(admin_request("  cashier ", "Cashier123"))
        .await
        .unwrap();
    assert_eq!(created.username, "cashier");
    assert!(created.is_active);
    // new admins start without permissions
    assert!(app.admin.admin_permissions(created.id).await.unwrap().is_empty());

    let err = app
        .admin
        .create_admin(admin_request("cashier", "Cashier123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = app
        .admin
        .create_admin(admin_request("teller", "short"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .admin
        .create_admin(admin_request("   ", "Cashier123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn revoked_permission_is_denied_again() {
    let app = setup().await;
    let admin = insert_admin(&app.db, "reviewer").await;
    let ctx = AuthContext::admin(admin.id);

    app.admin
        .grant(admin.id, Permission::ManagePaymentMethods.code())
        .await
        .unwrap();
    app.admin
        .authorize(&ctx, Permission::ManagePaymentMethods)
        .await
        .unwrap();

    app.admin
        .revoke(admin.id, Permission::ManagePaymentMethods.code())
        .await
        .unwrap();
    let err = app
        .admin
        .authorize(&ctx, Permission::ManagePaymentMethods)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied));

    // revoking twice is harmless
    app.admin
        .revoke(admin.id, Permission::ManagePaymentMethods.code())
        .await
        .unwrap();
}

#[tokio::test]
async fn grants_name_a_real_admin_and_permission() {
    let app = setup().await;
    let admin = insert_admin(&app.db, "reviewer").await;

    let err = app.admin.grant(4242, "MANAGE_USERS").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = app.admin.grant(admin.id, "LAUNCH_ROCKETS").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = app.admin.revoke(admin.id, "LAUNCH_ROCKETS").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = app.admin.admin_permissions(4242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn user_listing_searches_and_pages() {
    let app = setup().await;
    insert_user(&app.db, "95000001", Some("ama@mail.tg")).await;
    insert_user(&app.db, "95000002", None).await;
    let last = insert_user(&app.db, "96000003", None).await;

    let page = app
        .admin
        .list_users(&UserQuery {
            page_size: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id, last.id);

    let found = app
        .admin
        .list_users(&UserQuery {
            search: Some("9500".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total, 2);

    let found = app
        .admin
        .list_users(&UserQuery {
            search: Some("ama@".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.data.len(), 1);
    assert_eq!(found.data[0].phone, "95000001");
}

#[tokio::test]
async fn transactions_can_be_listed_per_user() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let ama = insert_user(&app.db, "95000004", None).await;
    let kofi = insert_user(&app.db, "95000005", None).await;
    for (i, user) in [ama.id, ama.id, kofi.id].into_iter().enumerate() {
        app.transactions
            .create(user, pair_request(pair_id, 1000.0, &format!("REF-PER-{i}")))
            .await
            .unwrap();
    }

    let page = app
        .transactions
        .list_transactions(&TransactionQuery {
            user_id: Some(ama.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.data.iter().all(|t| t.user_id == ama.id));

    let all = app
        .transactions
        .list_transactions(&TransactionQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
}
