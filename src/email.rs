//! Email providers.
//!
//! `MockOutbox` persists every accepted message as one JSON document in a
//! local outbox directory. `SendGrid` posts to the SendGrid v3 REST API.
//! Sending is not idempotent, so neither provider re-attempts a failed send.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::SharedSettings;
use crate::contract::{BulkEmailReport, EmailReceipt, EmailService, OutgoingEmail};
use crate::error::{Result, ServiceError};
use crate::logger::{CallLogger, CallStatus, LogRecord};

const CAPABILITY: &str = "email_service";

/// Syntactic address check shared by all providers.
pub fn is_valid_address(address: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("address pattern is valid")
    });
    pattern.is_match(address)
}

async fn bulk_send<S: EmailService>(
    service: &S,
    from_provider: &str,
    logger: &CallLogger,
    recipients: Vec<String>,
    subject: String,
    content: String,
    html: bool,
    max_recipients: usize,
) -> Result<BulkEmailReport> {
    if recipients.len() > max_recipients {
        let err = ServiceError::Remote(format!(
            "too many recipients: {} (max: {max_recipients})",
            recipients.len()
        ));
        logger.record(LogRecord::new(
            CAPABILITY,
            from_provider,
            "send_bulk_email",
            CallStatus::Failure,
            serde_json::json!({"total": recipients.len(), "error": err.to_string()}),
        ));
        return Err(err);
    }

    let total = recipients.len();
    let sends = recipients.into_iter().map(|to| {
        let mut message = OutgoingEmail::new(to.clone(), subject.clone(), content.clone());
        message.html = html;
        async move { (to, service.send_email(message).await) }
    });
    let outcomes = join_all(sends).await;

    let mut failures = Vec::new();
    for (to, outcome) in &outcomes {
        if let Err(e) = outcome {
            failures.push(format!("{to}: {e}"));
        }
    }
    let failed = failures.len();
    let report = BulkEmailReport {
        total,
        successful: total - failed,
        failed,
        failures,
    };

    logger.record(LogRecord::new(
        CAPABILITY,
        from_provider,
        "send_bulk_email",
        if report.failed == 0 {
            CallStatus::Success
        } else {
            CallStatus::Failure
        },
        serde_json::json!({
            "total": report.total,
            "successful": report.successful,
            "failed": report.failed,
        }),
    ));
    Ok(report)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockOutboxSettings {
    pub outbox_dir: PathBuf,
    pub default_sender: String,
}

impl Default for MockOutboxSettings {
    fn default() -> Self {
        MockOutboxSettings {
            outbox_dir: PathBuf::from("collected_data/outbox"),
            default_sender: "demo@switchboard.local".to_string(),
        }
    }
}

/// Local mock transport: one JSON file per accepted message.
pub struct MockOutboxService {
    outbox_dir: PathBuf,
    default_sender: String,
    max_recipients: usize,
    logger: CallLogger,
}

const MOCK_PROVIDER: &str = "MockOutbox";

impl MockOutboxService {
    pub fn new(
        settings: MockOutboxSettings,
        shared: SharedSettings,
        logger: CallLogger,
    ) -> Result<Self> {
        std::fs::create_dir_all(&settings.outbox_dir)?;
        Ok(MockOutboxService {
            outbox_dir: settings.outbox_dir,
            default_sender: settings.default_sender,
            max_recipients: shared.max_recipients,
            logger,
        })
    }

    fn fail(&self, action: &str, to: &str, error: ServiceError) -> ServiceError {
        self.logger.record(LogRecord::new(
            CAPABILITY,
            MOCK_PROVIDER,
            action,
            CallStatus::Failure,
            serde_json::json!({"to": to, "error": error.to_string()}),
        ));
        error
    }
}

#[async_trait]
impl EmailService for MockOutboxService {
    async fn send_email(&self, message: OutgoingEmail) -> Result<EmailReceipt> {
        if !is_valid_address(&message.to) {
            return Err(self.fail(
                "send_email",
                &message.to,
                ServiceError::Remote(format!("invalid recipient address: {}", message.to)),
            ));
        }
        for attachment in &message.attachments {
            if !attachment.exists() {
                return Err(self.fail(
                    "send_email",
                    &message.to,
                    ServiceError::NotFound(format!(
                        "attachment not found: {}",
                        attachment.display()
                    )),
                ));
            }
        }

        let message_id = format!("mock-msg-{}", Uuid::new_v4().simple());
        let accepted_at = Utc::now().to_rfc3339();
        let sender = message
            .from_email
            .clone()
            .unwrap_or_else(|| self.default_sender.clone());

        let stored = serde_json::json!({
            "message_id": message_id,
            "from": sender,
            "to": message.to,
            "cc": message.cc,
            "bcc": message.bcc,
            "subject": message.subject,
            "content": message.content,
            "html": message.html,
            "attachments": message.attachments,
            "accepted_at": accepted_at,
        });
        let path = self.outbox_dir.join(format!("{message_id}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
        info!(path = %path.display(), to = %message.to, "Stored message in mock outbox");

        self.logger.record(LogRecord::new(
            CAPABILITY,
            MOCK_PROVIDER,
            "send_email",
            CallStatus::Success,
            serde_json::json!({"to": message.to, "message_id": message_id, "subject": message.subject}),
        ));
        Ok(EmailReceipt {
            message_id,
            to: message.to,
            accepted_at,
        })
    }

    async fn send_bulk_email(
        &self,
        recipients: Vec<String>,
        subject: String,
        content: String,
        html: bool,
    ) -> Result<BulkEmailReport> {
        bulk_send(
            self,
            MOCK_PROVIDER,
            &self.logger,
            recipients,
            subject,
            content,
            html,
            self.max_recipients,
        )
        .await
    }

    fn validate_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridSettings {
    pub api_key: String,
    pub default_sender: String,
    #[serde(default = "default_sendgrid_base_url")]
    pub base_url: String,
}

fn default_sendgrid_base_url() -> String {
    "https://api.sendgrid.com".to_string()
}

/// SendGrid v3 REST transport.
pub struct SendGridService {
    client: reqwest::Client,
    api_key: String,
    default_sender: String,
    base_url: String,
    max_recipients: usize,
    logger: CallLogger,
}

const SENDGRID_PROVIDER: &str = "SendGrid";

impl SendGridService {
    pub fn new(
        settings: SendGridSettings,
        shared: SharedSettings,
        logger: CallLogger,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(shared.timeout_seconds))
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build http client: {e}")))?;
        Ok(SendGridService {
            client,
            api_key: settings.api_key,
            default_sender: settings.default_sender,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_recipients: shared.max_recipients,
            logger,
        })
    }

    fn fail(&self, action: &str, to: &str, error: ServiceError) -> ServiceError {
        self.logger.record(LogRecord::new(
            CAPABILITY,
            SENDGRID_PROVIDER,
            action,
            CallStatus::Failure,
            serde_json::json!({"to": to, "error": error.to_string()}),
        ));
        error
    }

    fn payload(&self, message: &OutgoingEmail) -> Result<serde_json::Value> {
        let recipients = |addresses: &[String]| {
            addresses
                .iter()
                .map(|a| serde_json::json!({"email": a}))
                .collect::<Vec<_>>()
        };

        let mut personalization = serde_json::json!({"to": [{"email": message.to}]});
        if !message.cc.is_empty() {
            personalization["cc"] = recipients(&message.cc).into();
        }
        if !message.bcc.is_empty() {
            personalization["bcc"] = recipients(&message.bcc).into();
        }

        let mut attachments = Vec::new();
        for path in &message.attachments {
            if !path.exists() {
                return Err(ServiceError::NotFound(format!(
                    "attachment not found: {}",
                    path.display()
                )));
            }
            let bytes = std::fs::read(path)?;
            attachments.push(serde_json::json!({
                "content": base64::engine::general_purpose::STANDARD.encode(bytes),
                "filename": path.file_name().and_then(|n| n.to_str()).unwrap_or("attachment"),
            }));
        }

        let sender = message
            .from_email
            .clone()
            .unwrap_or_else(|| self.default_sender.clone());
        let mut payload = serde_json::json!({
            "personalizations": [personalization],
            "from": {"email": sender},
            "subject": message.subject,
            "content": [{
                "type": if message.html { "text/html" } else { "text/plain" },
                "value": message.content,
            }],
        });
        if !attachments.is_empty() {
            payload["attachments"] = attachments.into();
        }
        Ok(payload)
    }
}

#[async_trait]
impl EmailService for SendGridService {
    /// One attempt only. A transient network failure after the vendor
    /// accepted the request would mean a duplicate send on retry.
    async fn send_email(&self, message: OutgoingEmail) -> Result<EmailReceipt> {
        if !is_valid_address(&message.to) {
            return Err(self.fail(
                "send_email",
                &message.to,
                ServiceError::Remote(format!("invalid recipient address: {}", message.to)),
            ));
        }

        let payload = match self.payload(&message) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail("send_email", &message.to, e)),
        };

        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return Err(self.fail(
                    "send_email",
                    &message.to,
                    ServiceError::Remote(format!("sendgrid request failed: {e}")),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, to = %message.to, "SendGrid rejected message: {body}");
            return Err(self.fail(
                "send_email",
                &message.to,
                ServiceError::Remote(format!("sendgrid rejected message: {status}: {body}")),
            ));
        }

        let message_id = response
            .headers()
            .get("X-Message-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("sendgrid-{}", Uuid::new_v4().simple()));

        self.logger.record(LogRecord::new(
            CAPABILITY,
            SENDGRID_PROVIDER,
            "send_email",
            CallStatus::Success,
            serde_json::json!({"to": message.to, "message_id": message_id, "subject": message.subject}),
        ));
        Ok(EmailReceipt {
            message_id,
            to: message.to,
            accepted_at: Utc::now().to_rfc3339(),
        })
    }

    async fn send_bulk_email(
        &self,
        recipients: Vec<String>,
        subject: String,
        content: String,
        html: bool,
    ) -> Result<BulkEmailReport> {
        bulk_send(
            self,
            SENDGRID_PROVIDER,
            &self.logger,
            recipients,
            subject,
            content,
            html,
            self.max_recipients,
        )
        .await
    }

    fn validate_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }
}
