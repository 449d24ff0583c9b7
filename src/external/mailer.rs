use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// JSON mail API client. Without an `api_url` messages are only logged.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_url.trim().is_empty()
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if !self.is_configured() {
            log::info!(
                "Mail transport not configured, email to {} logged only: {}",
                message.to,
                message.subject
            );
            return Ok(());
        }

        let payload = SendMailRequest {
            from: Address {
                email: &self.config.from_email,
                name: Some(&self.config.from_name),
            },
            to: vec![Address {
                email: &message.to,
                name: None,
            }],
            subject: &message.subject,
            html: &message.html,
            text: message.text.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Email sent to {}: {}", message.to, message.subject);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Email to {} failed ({status}): {error_text}", message.to);
            Err(AppError::ExternalApiError(format!(
                "Mail API returned {status}: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mailer_logs_and_succeeds() {
        let mailer = HttpMailer::new(MailConfig::default());
        assert!(!mailer.is_configured());
        let message = EmailMessage {
            to: "user@example.com".into(),
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
            text: None,
        };
        assert!(mailer.send(&message).await.is_ok());
    }
}
