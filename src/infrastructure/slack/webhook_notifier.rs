use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, warn};
use crate::domain::{error::BillingError, models::SlackMessage, ports::MessageNotifier};

/// Posts messages to an incoming-webhook URL. The response status is only
/// logged; a transport failure is the sole error case.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl MessageNotifier for WebhookNotifier {
    async fn post_message(&self, message: &SlackMessage) -> Result<(), BillingError> {
        debug!("Posting message with {} fields to webhook", message.fields.len());

        let response = self.client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                error!("Webhook request failed: {}", e);
                BillingError::Notify(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            info!("Webhook accepted message ({})", status);
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook answered {}: {}", status, body);
        }
        Ok(())
    }
}
