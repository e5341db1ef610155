use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    /// Webhook URLs embed their credential, so the URL is stripped.
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.without_url().to_string())
    }
}
