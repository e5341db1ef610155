use async_trait::async_trait;

use super::alert::AlertMessage;
use super::error::Result;

/// Pluggable transport for new-result alerts.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Deliver one alert. Single attempt, no retry.
    async fn deliver(&self, message: &AlertMessage) -> Result<()>;
}
