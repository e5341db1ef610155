use async_trait::async_trait;
use tracing::warn;

use super::alert::AlertMessage;
use super::backend::NotifyBackend;
use super::error::{NotifyError, Result};

/// Slack incoming webhook notification backend.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: String) -> Self {
        Self::with_client(webhook_url, reqwest::Client::new())
    }

    /// Reuse a preconfigured client (timeouts, proxies).
    pub fn with_client(webhook_url: String, http: reqwest::Client) -> Self {
        Self { webhook_url, http }
    }
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn deliver(&self, message: &AlertMessage) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
