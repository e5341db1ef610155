use async_trait::async_trait;

use super::alert::AlertMessage;
use super::backend::NotifyBackend;
use super::error::Result;

/// Used when no webhook is configured. Alerts are logged at debug and dropped.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn deliver(&self, message: &AlertMessage) -> Result<()> {
        tracing::debug!(blocks = message.blocks.len(), "Notifications disabled, dropping alert");
        Ok(())
    }
}
