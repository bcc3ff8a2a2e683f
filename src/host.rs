use std::sync::Arc;
use tracing::{info, error, debug, warn};
use crate::{
    application::notify_service::NotifyService,
    config::{AppConfig, StorageBackend},
    domain::{
        error::BillingError,
        message::MessageBuilder,
        models::{ProcessOutcome, QueuedEvent},
        ports::{EventQueue, FileFetcher},
    },
    infrastructure::{
        parsers::billing_parser::JsonBillingParser,
        queue::sqs_queue::SqsQueue,
        slack::webhook_notifier::WebhookNotifier,
        storage::{fs_adapter::FsAdapter, s3_adapter::S3Adapter},
    },
};

/// Wires the pipeline from configuration and feeds it events, either one
/// at a time or from a queue of storage notifications.
pub struct FunctionHost {
    service: NotifyService,
    queue: Option<Arc<dyn EventQueue>>,
}

impl FunctionHost {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        debug!("Initializing function host");

        let needs_aws = config.storage_backend == StorageBackend::S3 || config.sqs_queue_url.is_some();
        let aws_config = if needs_aws {
            debug!("Loading AWS configuration");
            let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(endpoint_url) = &config.aws_endpoint_url {
                info!("Using custom storage endpoint: {}", endpoint_url);
                aws_config_builder = aws_config_builder.endpoint_url(endpoint_url);
            }
            let aws_config = aws_config_builder.load().await;
            debug!("AWS region: {:?}", aws_config.region());
            Some(aws_config)
        } else {
            None
        };

        let file_fetcher: Arc<dyn FileFetcher> = match (config.storage_backend, &aws_config) {
            (StorageBackend::S3, Some(aws_config)) => {
                let mut s3_config = aws_sdk_s3::config::Builder::from(aws_config);
                // Interop endpoints (GCS, LocalStack) want path-style addressing
                if config.aws_endpoint_url.is_some() {
                    s3_config = s3_config.force_path_style(true);
                }
                info!("Using S3-compatible object storage");
                Arc::new(S3Adapter::new(aws_sdk_s3::Client::from_conf(s3_config.build())))
            },
            _ => {
                info!("Using local object storage at {}", config.storage_root.display());
                Arc::new(FsAdapter::new(config.storage_root.clone()))
            }
        };

        let builder = MessageBuilder::new(config.bot_name.clone(), config.message_color.clone())?;
        let notifier = Arc::new(WebhookNotifier::new(config.webhook_url.clone()));
        let service = NotifyService::new(file_fetcher, Arc::new(JsonBillingParser::new()), notifier, builder);

        let queue: Option<Arc<dyn EventQueue>> = match (&config.sqs_queue_url, &aws_config) {
            (Some(queue_url), Some(aws_config)) => {
                info!("Using SQS queue: {}", queue_url);
                let client = aws_sdk_sqs::Client::new(aws_config);
                Some(Arc::new(SqsQueue::new(client, queue_url.clone())))
            },
            _ => None,
        };

        debug!("Function host initialization complete");
        Ok(Self::from_parts(service, queue))
    }

    pub fn from_parts(service: NotifyService, queue: Option<Arc<dyn EventQueue>>) -> Self {
        Self { service, queue }
    }

    pub fn has_queue(&self) -> bool {
        self.queue.is_some()
    }

    pub async fn run_once(&self, raw_event: &str) -> Result<ProcessOutcome, BillingError> {
        self.service.handle_raw_event(raw_event).await
    }

    /// Long-polls the queue until receiving or deleting fails.
    pub async fn run_queue(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let queue = self.queue
            .as_ref()
            .ok_or_else(|| BillingError::Config("SQS_QUEUE_URL is not set".to_string()))?;
        info!("Polling event queue");

        let mut poll_count: u64 = 0;
        loop {
            poll_count += 1;
            debug!("Polling event queue (attempt {})", poll_count);
            self.poll_once(&**queue).await?;
        }
    }

    /// Receives one batch and handles it in order. Returns the batch size.
    pub async fn poll_once(&self, queue: &dyn EventQueue) -> Result<usize, BillingError> {
        let messages = queue.receive().await?;
        if messages.is_empty() {
            debug!("No messages received");
            return Ok(0);
        }
        info!("Received {} messages", messages.len());

        for (i, message) in messages.iter().enumerate() {
            self.handle_message(queue, i + 1, message).await?;
        }
        Ok(messages.len())
    }

    /// Runs the pipeline for one message, then deletes it whatever the
    /// outcome. Pipeline failures are logged, not returned; only a failed
    /// delete is an error here.
    pub async fn handle_message(
        &self,
        queue: &dyn EventQueue,
        index: usize,
        message: &QueuedEvent,
    ) -> Result<Option<ProcessOutcome>, BillingError> {
        let outcome = match &message.body {
            Some(body) => {
                debug!("Message {} body: {}", index, body);
                match self.service.handle_raw_event(body).await {
                    Ok(outcome) => {
                        info!("Message {} handled: {:?}", index, outcome);
                        Some(outcome)
                    },
                    Err(e) => {
                        error!("Message {} failed: {}", index, e);
                        None
                    }
                }
            },
            None => {
                warn!("Message {} has no body", index);
                None
            }
        };

        match &message.receipt_handle {
            Some(receipt_handle) => {
                queue.delete(receipt_handle).await?;
                debug!("Message {} deleted from queue", index);
            },
            None => warn!("Message {} has no receipt handle, leaving it on the queue", index),
        }
        Ok(outcome)
    }
}
