use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;
use crate::domain::user::emails::EmailMessage;
use crate::user::errors::MailerError;
use crate::user::ports::Mailer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddressBody {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddressBody,
    to: Vec<EmailAddressBody>,
    subject: String,
    text_content: String,
}

/// Mailer backed by a transactional email HTTP API (Brevo-compatible payload).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailerError::ConnectionFailed(e.to_string()))?;

        tracing::info!(
            api_url = %config.api_url,
            sender = %config.sender_email,
            "Http mailer initialized"
        );

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: Some(config.sender_name.clone()).filter(|n| !n.trim().is_empty()),
        })
    }

    fn body(&self, message: &EmailMessage) -> SendEmailBody {
        SendEmailBody {
            sender: EmailAddressBody {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![EmailAddressBody {
                email: message.to.clone(),
                name: message.to_name.clone(),
            }],
            subject: message.subject.clone(),
            text_content: message.text_body.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&self.body(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    MailerError::InvalidMessage(e.to_string())
                } else {
                    MailerError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %message.to, subject = %message.subject, "Email accepted by provider");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
