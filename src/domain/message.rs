use regex::Regex;
use tracing::debug;
use crate::domain::{
    error::BillingError,
    models::{BillingRecord, SlackField, SlackMessage},
};

const LABEL_PATTERN: &str = r"billing-(.*)\.json";

/// Turns parsed billing exports into chat messages.
pub struct MessageBuilder {
    bot_name: String,
    color: String,
    label_pattern: Regex,
}

impl MessageBuilder {
    pub fn new(bot_name: impl Into<String>, color: impl Into<String>) -> Result<Self, BillingError> {
        let label_pattern = Regex::new(LABEL_PATTERN)
            .map_err(|e| BillingError::Config(e.to_string()))?;
        Ok(Self {
            bot_name: bot_name.into(),
            color: color.into(),
            label_pattern,
        })
    }

    /// Pulls the period label out of `billing-<label>.json`. The match is a
    /// search, so prefixes such as a folder path are allowed.
    pub fn extract_label<'a>(&self, file_name: &'a str) -> Result<&'a str, BillingError> {
        self.label_pattern
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| BillingError::Format(format!(
                "file name '{}' does not match billing-<label>.json", file_name
            )))
    }

    pub fn build(&self, file_name: &str, records: &[BillingRecord]) -> Result<SlackMessage, BillingError> {
        let label = self.extract_label(file_name)?;
        debug!("Building message for label '{}' with {} fields", label, records.len());

        let fields = records
            .iter()
            .map(|r| SlackField {
                title: format!("{}: {}", r.project_id, r.description),
                value: format!("{}ドル（USD）", r.cost.amount),
            })
            .collect();

        Ok(SlackMessage {
            username: self.bot_name.clone(),
            pretext: format!("{}の請求書", label),
            color: self.color.clone(),
            fields,
        })
    }
}
