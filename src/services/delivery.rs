//! Post-commit delivery of emails and push messages.
//!
//! State-changing operations publish [`DeliveryJob`]s once their database work is committed.
//! A single background [`DeliveryWorker`] drains the queue and retries failed sends with
//! exponential backoff. A failed delivery never affects the operation that published it.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DeliveryConfig;
use crate::entities::push_subscription_entity as subscriptions;
use crate::external::{EmailMessage, EmailSender, PushError, PushMessage, PushSender};
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryJob {
    Email(EmailMessage),
    Push {
        subscription_id: i64,
        token: String,
        message: PushMessage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Target no longer exists; the subscription was removed.
    Dropped,
    Failed,
}

/// Publishing half of the delivery channel.
#[derive(Clone)]
pub struct DeliveryQueue {
    sender: mpsc::UnboundedSender<DeliveryJob>,
}

impl DeliveryQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DeliveryJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn publish(&self, job: DeliveryJob) {
        if let Err(e) = self.sender.send(job) {
            log::error!("Delivery queue closed, job dropped: {:?}", e.0);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling from the initial backoff.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(cfg: &DeliveryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
        }
    }
}

pub struct DeliveryWorker {
    pool: DatabaseConnection,
    email: Arc<dyn EmailSender>,
    push: Arc<dyn PushSender>,
    policy: RetryPolicy,
}

impl DeliveryWorker {
    pub fn new(
        pool: DatabaseConnection,
        email: Arc<dyn EmailSender>,
        push: Arc<dyn PushSender>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            email,
            push,
            policy,
        }
    }

    /// Drain the queue until every publisher is dropped.
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<DeliveryJob>) {
        log::info!("Delivery worker started");
        while let Some(job) = receiver.recv().await {
            self.deliver(job).await;
        }
        log::info!("Delivery worker stopped");
    }

    pub async fn deliver(&self, job: DeliveryJob) -> DeliveryOutcome {
        match job {
            DeliveryJob::Email(message) => self.deliver_email(&message).await,
            DeliveryJob::Push {
                subscription_id,
                token,
                message,
            } => self.deliver_push(subscription_id, &token, &message).await,
        }
    }

    async fn deliver_email(&self, message: &EmailMessage) -> DeliveryOutcome {
        for attempt in 1..=self.policy.max_attempts {
            match self.email.send(message).await {
                Ok(()) => return DeliveryOutcome::Delivered,
                Err(e) => {
                    log::warn!(
                        "Email to {} failed (attempt {attempt}/{}): {e}",
                        message.to,
                        self.policy.max_attempts
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }
        log::error!("Giving up on email to {}: {}", message.to, message.subject);
        DeliveryOutcome::Failed
    }

    async fn deliver_push(
        &self,
        subscription_id: i64,
        token: &str,
        message: &PushMessage,
    ) -> DeliveryOutcome {
        for attempt in 1..=self.policy.max_attempts {
            match self.push.send(token, message).await {
                Ok(()) => return DeliveryOutcome::Delivered,
                Err(PushError::Gone) => {
                    log::info!("Push subscription {subscription_id} expired, removing it");
                    if let Err(e) = subscriptions::Entity::delete_by_id(subscription_id)
                        .exec(&self.pool)
                        .await
                    {
                        log::error!("Failed to remove push subscription {subscription_id}: {e}");
                    }
                    return DeliveryOutcome::Dropped;
                }
                Err(PushError::Failed(reason)) => {
                    log::warn!(
                        "Push to subscription {subscription_id} failed (attempt {attempt}/{}): {reason}",
                        self.policy.max_attempts
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }
        log::error!("Giving up on push to subscription {subscription_id}");
        DeliveryOutcome::Failed
    }
}
