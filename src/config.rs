use std::path::PathBuf;
use tracing::debug;
use crate::domain::error::BillingError;

pub const DEFAULT_BOT_NAME: &str = "gcp-billing-bot";
pub const DEFAULT_MESSAGE_COLOR: &str = "#36a64f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Fs,
}

/// Settings injected into the pipeline at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub webhook_url: String,
    pub bot_name: String,
    pub message_color: String,
    pub storage_backend: StorageBackend,
    pub storage_root: PathBuf,
    pub aws_endpoint_url: Option<String>,
    pub sqs_queue_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, BillingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BillingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let webhook_url = get("WEBHOOK_URL")
            .or_else(|| get("WEBHOOK"))
            .ok_or_else(|| BillingError::Config("WEBHOOK_URL environment variable is required".to_string()))?;

        let storage_backend = match get("STORAGE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("s3") => StorageBackend::S3,
            Some("fs") => StorageBackend::Fs,
            Some(other) => {
                return Err(BillingError::Config(format!("unknown STORAGE_BACKEND '{}'", other)));
            }
        };

        let config = Self {
            webhook_url,
            bot_name: get("BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            message_color: get("MESSAGE_COLOR").unwrap_or_else(|| DEFAULT_MESSAGE_COLOR.to_string()),
            storage_backend,
            storage_root: get("STORAGE_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            aws_endpoint_url: get("AWS_ENDPOINT_URL"),
            sqs_queue_url: get("SQS_QUEUE_URL"),
        };
        debug!("Loaded configuration: backend={:?}, bot={}, queue={:?}",
            config.storage_backend, config.bot_name, config.sqs_queue_url);
        Ok(config)
    }
}
