pub mod alert;
pub mod backend;
pub mod error;
pub mod noop;
pub mod slack;

pub use alert::{format_alert, AlertMessage, Block, Text};
pub use backend::NotifyBackend;
pub use error::NotifyError;
pub use noop::NoopBackend;
pub use slack::SlackWebhook;
