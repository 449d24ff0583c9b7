use crate::config::PushConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum PushError {
    /// The device token is expired or was never valid; it should be forgotten.
    #[error("push token is no longer registered")]
    Gone,
    #[error("push delivery failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError>;
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    to: &'a str,
    notification: FcmNotification<'a>,
    data: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    failure: i64,
    #[serde(default)]
    results: Vec<FcmResult>,
}

fn is_gone_error(code: &str) -> bool {
    matches!(code, "NotRegistered" | "InvalidRegistration" | "MismatchSenderId")
}

/// Firebase Cloud Messaging (legacy HTTP API). Without a server key pushes are only logged.
#[derive(Clone)]
pub struct FcmPush {
    client: Client,
    config: PushConfig,
}

impl FcmPush {
    pub fn new(config: PushConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PushSender for FcmPush {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        if self.config.fcm_server_key.trim().is_empty() {
            log::info!("Push transport not configured, push logged only: {}", message.title);
            return Ok(());
        }

        let payload = FcmRequest {
            to: token,
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
        };

        let response = self
            .client
            .post(&self.config.fcm_url)
            .header(
                "Authorization",
                format!("key={}", self.config.fcm_server_key),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => return Err(PushError::Gone),
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(PushError::Failed(format!("FCM returned {status}: {text}")));
            }
            _ => {}
        }

        let body: FcmResponse = response
            .json()
            .await
            .map_err(|e| PushError::Failed(format!("unreadable FCM response: {e}")))?;

        if body.failure > 0 {
            let code = body
                .results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "unknown".to_string());
            if is_gone_error(&code) {
                return Err(PushError::Gone);
            }
            return Err(PushError::Failed(code));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unregistered_tokens_as_gone() {
        assert!(is_gone_error("NotRegistered"));
        assert!(is_gone_error("InvalidRegistration"));
        assert!(!is_gone_error("Unavailable"));
    }
}
