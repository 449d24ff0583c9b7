mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use emb_exchange::entities::push_subscription_entity as subscriptions;
use emb_exchange::external::{EmailMessage, EmailSender, PushError, PushMessage, PushSender};
use emb_exchange::models::AuthContext;
use emb_exchange::services::{DeliveryJob, DeliveryOutcome, DeliveryWorker, RetryPolicy};
use emb_exchange::{AppError, AppResult};
use sea_orm::{EntityTrait, PaginatorTrait};

/// Fails the first `failures` sends, then records every message.
struct FlakyMailer {
    failures: u32,
    attempts: AtomicU32,
    sent: Mutex<Vec<EmailMessage>>,
}

impl FlakyMailer {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EmailSender for FlakyMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(AppError::ExternalApiError("mail API unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Reports every token in `gone` as unregistered and accepts the rest.
struct FakePush {
    gone: Vec<String>,
    delivered: Mutex<Vec<String>>,
}

#[async_trait]
impl PushSender for FakePush {
    async fn send(&self, token: &str, _message: &PushMessage) -> Result<(), PushError> {
        if self.gone.iter().any(|t| t == token) {
            return Err(PushError::Gone);
        }
        self.delivered.lock().unwrap().push(token.to_string());
        Ok(())
    }
}

fn quick_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
    }
}

fn email() -> EmailMessage {
    EmailMessage {
        to: "kossi@example.tg".to_string(),
        subject: "Exchange EMB-0000ABCD validated".to_string(),
        html: "<p>validated</p>".to_string(),
        text: None,
    }
}

fn push_message() -> PushMessage {
    PushMessage {
        title: "Exchange validated".to_string(),
        body: "Your exchange of 5000 FCFA to Flooz has been validated.".to_string(),
        data: HashMap::new(),
    }
}

fn fake_push(gone: &[&str]) -> Arc<FakePush> {
    Arc::new(FakePush {
        gone: gone.iter().map(|t| t.to_string()).collect(),
        delivered: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn email_is_retried_until_it_goes_through() {
    let app = setup().await;
    let mailer = Arc::new(FlakyMailer::new(2));
    let worker = DeliveryWorker::new(app.db.clone(), mailer.clone(), fake_push(&[]), quick_retries(3));

    let outcome = worker.deliver(DeliveryJob::Email(email())).await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn email_is_abandoned_after_the_last_attempt() {
    let app = setup().await;
    let mailer = Arc::new(FlakyMailer::new(10));
    let worker = DeliveryWorker::new(app.db.clone(), mailer.clone(), fake_push(&[]), quick_retries(3));

    let outcome = worker.deliver(DeliveryJob::Email(email())).await;

    assert_eq!(outcome, DeliveryOutcome::Failed);
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 3);
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unregistered_device_is_forgotten() {
    let app = setup().await;
    let user = insert_user(&app.db, "92000001", None).await;
    let ctx = AuthContext::user(user.id);
    app.notifications
        .register_push_token(&ctx, "stale-token", "android")
        .await
        .unwrap();
    app.notifications
        .register_push_token(&ctx, "live-token", "ios")
        .await
        .unwrap();
    let subs = subscriptions::Entity::find().all(&app.db).await.unwrap();
    let stale = subs.iter().find(|s| s.token == "stale-token").unwrap();
    let live = subs.iter().find(|s| s.token == "live-token").unwrap();

    let push = fake_push(&["stale-token"]);
    let worker = DeliveryWorker::new(
        app.db.clone(),
        Arc::new(FlakyMailer::new(0)),
        push.clone(),
        quick_retries(3),
    );

    let dropped = worker
        .deliver(DeliveryJob::Push {
            subscription_id: stale.id,
            token: stale.token.clone(),
            message: push_message(),
        })
        .await;
    let delivered = worker
        .deliver(DeliveryJob::Push {
            subscription_id: live.id,
            token: live.token.clone(),
            message: push_message(),
        })
        .await;

    assert_eq!(dropped, DeliveryOutcome::Dropped);
    assert_eq!(delivered, DeliveryOutcome::Delivered);
    assert_eq!(*push.delivered.lock().unwrap(), vec!["live-token".to_string()]);

    let remaining = subscriptions::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token, "live-token");
}

#[tokio::test]
async fn worker_drains_the_queue_until_publishers_are_gone() {
    let app = setup().await;
    let mailer = Arc::new(FlakyMailer::new(0));
    let worker = DeliveryWorker::new(app.db.clone(), mailer.clone(), fake_push(&[]), quick_retries(1));
    let (queue, receiver) = emb_exchange::services::DeliveryQueue::channel();

    queue.publish(DeliveryJob::Email(email()));
    queue.publish(DeliveryJob::Email(email()));
    drop(queue);

    let handle = emb_exchange::tasks::spawn_all(worker, receiver);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(mailer.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn push_token_moves_to_its_latest_owner() {
    let app = setup().await;
    let first = insert_user(&app.db, "92000002", None).await;
    let second = insert_user(&app.db, "92000003", None).await;

    app.notifications
        .register_push_token(&AuthContext::user(first.id), "shared-device", "android")
        .await
        .unwrap();
    app.notifications
        .register_push_token(&AuthContext::user(second.id), "shared-device", "android")
        .await
        .unwrap();

    let subs = subscriptions::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].user_id, Some(second.id));

    let err = app
        .notifications
        .remove_push_token(&AuthContext::user(first.id), "shared-device")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    app.notifications
        .remove_push_token(&AuthContext::user(second.id), "shared-device")
        .await
        .unwrap();
    assert_eq!(subscriptions::Entity::find().count(&app.db).await.unwrap(), 0);
}
