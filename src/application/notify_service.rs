use std::sync::Arc;
use tracing::{info, debug, error, warn};
use uuid::Uuid;
use crate::domain::{
    error::BillingError,
    message::MessageBuilder,
    models::{EventEnvelope, FileToProcess, ProcessOutcome, ResourceState, StorageEvent},
    ports::{BillingParser, FileFetcher, MessageNotifier},
};

pub struct NotifyService {
    file_fetcher: Arc<dyn FileFetcher>,
    parser: Arc<dyn BillingParser>,
    notifier: Arc<dyn MessageNotifier>,
    builder: MessageBuilder,
}

impl NotifyService {
    pub fn new(
        file_fetcher: Arc<dyn FileFetcher>,
        parser: Arc<dyn BillingParser>,
        notifier: Arc<dyn MessageNotifier>,
        builder: MessageBuilder,
    ) -> Self {
        Self {
            file_fetcher,
            parser,
            notifier,
            builder,
        }
    }

    /// Entry point for a raw trigger payload (queue message body, file, stdin).
    pub async fn handle_raw_event(&self, raw: &str) -> Result<ProcessOutcome, BillingError> {
        debug!("Decoding storage event envelope");
        let envelope: EventEnvelope = serde_json::from_str(raw)
            .map_err(|e| {
                error!("Failed to decode storage event: {}", e);
                BillingError::Validation(format!("undecodable storage event: {}", e))
            })?;
        self.handle_event(&envelope).await
    }

    pub async fn handle_event(&self, envelope: &EventEnvelope) -> Result<ProcessOutcome, BillingError> {
        let event_id = envelope
            .event_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let file = &envelope.data;

        info!("Event ID: {}", event_id);
        info!("Event type: {}", envelope.event_type().unwrap_or("unknown"));
        info!("Bucket: {}", file.bucket.as_deref().unwrap_or(""));
        info!("File: {}", file.name.as_deref().unwrap_or(""));
        debug!("Metageneration: {}", file.metageneration.as_deref().unwrap_or("-"));
        debug!("Created: {:?}", file.time_created);
        debug!("Updated: {:?}", file.updated);

        let result = self.run_pipeline(file).await;
        match &result {
            Ok(outcome) => {
                info!("✅ File {} processed ({:?}) [event {}]",
                    file.name.as_deref().unwrap_or(""), outcome, event_id);
            },
            Err(e) => {
                error!("Event {} failed: {}", event_id, e);
            }
        }
        result
    }

    async fn run_pipeline(&self, event: &StorageEvent) -> Result<ProcessOutcome, BillingError> {
        if event.resource_state == ResourceState::NotExists {
            info!("This is a deletion event, nothing to notify");
            return Ok(ProcessOutcome::Deleted);
        }

        let file = validate_event(event)?;
        self.process_file(file).await
    }

    pub async fn process_file(&self, file: FileToProcess) -> Result<ProcessOutcome, BillingError> {
        info!("Starting billing file processing: {}/{}", file.bucket, file.name);

        // Step 1: Fetch the export
        debug!("Step 1: Fetching object {}/{}", file.bucket, file.name);
        let payload = self.file_fetcher.fetch_file(&file.bucket, &file.name).await
            .map_err(|e| {
                error!("Failed to fetch file {}/{}: {}", file.bucket, file.name, e);
                e
            })?;
        info!("Successfully fetched file, size: {} bytes", payload.len());

        // Step 2: Parse, format and post
        debug!("Step 2: Notifying for {}", file.name);
        self.notify(&file.name, &payload).await
    }

    pub async fn notify(&self, file_name: &str, payload: &[u8]) -> Result<ProcessOutcome, BillingError> {
        let records = self.parser.parse(payload).await
            .map_err(|e| {
                error!("Failed to parse file {}: {}", file_name, e);
                e
            })?;

        if records.is_empty() {
            warn!("File {} is empty, skipping notification", file_name);
            return Ok(ProcessOutcome::Empty);
        }

        let message = self.builder.build(file_name, &records)
            .map_err(|e| {
                error!("Failed to build message for {}: {}", file_name, e);
                e
            })?;
        debug!("Built message '{}' with {} fields", message.pretext, message.fields.len());

        self.notifier.post_message(&message).await
            .map_err(|e| {
                error!("Failed to post message for {}: {}", file_name, e);
                e
            })?;

        Ok(ProcessOutcome::Notified { fields: message.fields.len() })
    }
}

fn validate_event(event: &StorageEvent) -> Result<FileToProcess, BillingError> {
    let bucket = match event.bucket.as_deref() {
        Some(b) if !b.is_empty() => b,
        _ => {
            warn!("Storage event has no bucket");
            return Err(BillingError::Validation(
                "Bucket not provided. Make sure the event has a \"bucket\" property".to_string(),
            ));
        }
    };
    let name = match event.name.as_deref() {
        Some(n) if !n.is_empty() => n,
        _ => {
            warn!("Storage event has no file name");
            return Err(BillingError::Validation(
                "Filename not provided. Make sure the event has a \"name\" property".to_string(),
            ));
        }
    };

    Ok(FileToProcess {
        bucket: bucket.to_string(),
        name: name.to_string(),
    })
}
