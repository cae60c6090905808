//! Outbound mail
//!
//! Mail is a courtesy: a failed send is logged and dropped, never
//! surfaced to the request that triggered it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;
use crate::error::AppError;

const MAIL_SEND_TIMEOUT_SECS: u64 = 15;

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Welcome mail sent after signup
    pub fn welcome(to: &str, nickname: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Thanks for joining Your House Today!".to_string(),
            body: format!(
                "Hi {nickname},\n\nWelcome to Your House Today. Share your room and find ideas for your next one.\n"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), AppError>;
}

/// Mailer that records messages through `tracing` instead of delivering them
pub struct LogMailer {
    sender: String,
    enabled: bool,
}

impl LogMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            sender: config.sender.clone(),
            enabled: config.enabled,
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), AppError> {
        if !self.enabled {
            tracing::debug!(to = %message.to, "Mail disabled; dropping message");
            return Ok(());
        }

        tracing::info!(
            from = %self.sender,
            to = %message.to,
            subject = %message.subject,
            "Mail sent"
        );
        Ok(())
    }
}

/// Send on a detached task; failures and timeouts are logged at warn.
pub fn send_best_effort(mailer: Arc<dyn Mailer>, message: MailMessage) {
    tokio::spawn(async move {
        let to = message.to.clone();
        match tokio::time::timeout(
            Duration::from_secs(MAIL_SEND_TIMEOUT_SECS),
            mailer.send(message),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::warn!(%to, %error, "Mail send failed; dropping message");
            }
            Err(_) => {
                tracing::warn!(
                    %to,
                    timeout_seconds = MAIL_SEND_TIMEOUT_SECS,
                    "Mail send timed out; dropping message"
                );
            }
        }
    });
}
