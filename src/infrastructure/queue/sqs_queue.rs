use async_trait::async_trait;
use aws_sdk_sqs::{error::DisplayErrorContext, Client};
use tracing::{debug, error};
use crate::domain::{error::BillingError, models::QueuedEvent, ports::EventQueue};

const MAX_MESSAGES: i32 = 10;
const WAIT_TIME_SECONDS: i32 = 20;

/// Long-polls an SQS queue whose messages carry storage notifications.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl EventQueue for SqsQueue {
    async fn receive(&self) -> Result<Vec<QueuedEvent>, BillingError> {
        let response = self.client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(MAX_MESSAGES)
            .wait_time_seconds(WAIT_TIME_SECONDS)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to receive messages from SQS: {}", DisplayErrorContext(&e));
                BillingError::Queue(DisplayErrorContext(&e).to_string())
            })?;

        let events: Vec<QueuedEvent> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| QueuedEvent {
                body: m.body,
                receipt_handle: m.receipt_handle,
            })
            .collect();
        debug!("Received {} messages from {}", events.len(), self.queue_url);
        Ok(events)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), BillingError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete message from SQS: {}", DisplayErrorContext(&e));
                BillingError::Queue(DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}
