use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("notify error: {0}")]
    Notify(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("configuration error: {0}")]
    Config(String),
}
