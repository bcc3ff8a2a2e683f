use async_trait::async_trait;
use crate::domain::{
    error::BillingError,
    models::{BillingRecord, QueuedEvent, SlackMessage},
};

#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Reads the whole object into memory.
    async fn fetch_file(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BillingError>;
}

#[async_trait]
pub trait BillingParser: Send + Sync {
    async fn parse(&self, payload: &[u8]) -> Result<Vec<BillingRecord>, BillingError>;
}

#[async_trait]
pub trait MessageNotifier: Send + Sync {
    async fn post_message(&self, message: &SlackMessage) -> Result<(), BillingError>;
}

/// Source of storage notifications when the pipeline runs as a poller.
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn receive(&self) -> Result<Vec<QueuedEvent>, BillingError>;
    async fn delete(&self, receipt_handle: &str) -> Result<(), BillingError>;
}
