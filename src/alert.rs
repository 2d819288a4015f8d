//! Alert delivery to a chat webhook (Lark/Feishu custom bot).
//!
//! [`AlertSink`] is the seam the monitor talks to. [`Notifier`] is the
//! production implementation: either a real [`WebhookSink`] or, when no
//! webhook is configured, a sink that only logs.

use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::AlertError;
use crate::reconciler::{AlertEvent, Severity};

/// Something that can deliver an [`AlertEvent`].
pub trait AlertSink {
    async fn send(&self, alert: &AlertEvent) -> Result<(), AlertError>;
}

/// Posts alerts to a bot webhook as a rich-text "post" message.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, AlertError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Build the webhook body for one alert.
pub fn post_payload(alert: &AlertEvent) -> Value {
    let marker = match alert.severity {
        Severity::Info => "[OK]",
        Severity::Error => "[ALERT]",
    };
    let time = alert
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    json!({
        "msg_type": "post",
        "content": {
            "post": {
                "zh_cn": {
                    "title": format!("{marker} {}", alert.title),
                    "content": [
                        [{ "tag": "text", "text": alert.body }],
                        [{ "tag": "text", "text": format!("time: {time}") }]
                    ]
                }
            }
        }
    })
}

impl AlertSink for WebhookSink {
    async fn send(&self, alert: &AlertEvent) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&post_payload(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        tracing::info!(title = %alert.title, "alert delivered");
        Ok(())
    }
}

/// The sink chosen from configuration.
#[derive(Debug, Clone)]
pub enum Notifier {
    Webhook(WebhookSink),
    LogOnly,
}

impl Notifier {
    /// A webhook notifier when `url` is non-empty, otherwise log-only.
    pub fn from_url(url: &str) -> Result<Self, AlertError> {
        if url.trim().is_empty() {
            Ok(Notifier::LogOnly)
        } else {
            Ok(Notifier::Webhook(WebhookSink::new(url.trim())?))
        }
    }
}

impl AlertSink for Notifier {
    async fn send(&self, alert: &AlertEvent) -> Result<(), AlertError> {
        match self {
            Notifier::Webhook(sink) => sink.send(alert).await,
            Notifier::LogOnly => {
                tracing::warn!(
                    severity = %alert.severity,
                    title = %alert.title,
                    body = %alert.body,
                    "no webhook configured, alert logged only"
                );
                Ok(())
            }
        }
    }
}
