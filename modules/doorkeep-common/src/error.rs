use thiserror::Error;

#[derive(Error, Debug)]
pub enum DoorkeepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invocation deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
}
