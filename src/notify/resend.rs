//! Resend email provider.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::NotificationConfig;
use crate::notify::{Notification, Notifier, NotifyError};

const SUBJECT: &str = "User prompt";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Sends one email per notification through the Resend HTTP API.
pub struct ResendNotifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: String,
    recipient: String,
}

impl ResendNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/emails", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
            recipient: config.recipient.clone(),
        })
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let request = SendEmailRequest {
            from: &self.sender,
            to: &self.recipient,
            subject: SUBJECT,
            html: render_html(&notification),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// `<p>User {addr} sent <strong>{prompt}</strong> prompt.</p>`, escaped.
pub fn render_html(notification: &Notification) -> String {
    format!(
        "<p>User {} sent <strong>{}</strong> prompt.</p>",
        escape_html(&notification.client_address),
        escape_html(notification.prompt.as_deref().unwrap_or_default()),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
