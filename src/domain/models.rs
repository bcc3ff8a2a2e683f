use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

/// Inbound notification as delivered by the storage trigger. Older
/// deliveries put the event metadata at the top level, newer ones nest it
/// under `context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub data: StorageEvent,
    #[serde(default)]
    pub context: Option<EventContext>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
}

impl EventEnvelope {
    pub fn event_id(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.event_id.as_deref())
            .or(self.event_id.as_deref())
    }

    pub fn event_type(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.event_type.as_deref())
            .or(self.event_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    pub timestamp: Option<String>,
    pub resource: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    pub bucket: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub resource_state: ResourceState,
    pub metageneration: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    #[default]
    Exists,
    NotExists,
}

#[derive(Debug, Clone)]
pub struct FileToProcess {
    pub bucket: String,
    pub name: String,
}

/// A queue message carrying one storage notification.
#[derive(Debug, Clone, Default)]
pub struct QueuedEvent {
    pub body: Option<String>,
    pub receipt_handle: Option<String>,
}

/// One line item of a billing export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub project_id: String,
    pub description: String,
    pub cost: Cost,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub line_item_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub project_number: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cost {
    pub amount: Amount,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    #[serde(default)]
    pub measurement_id: Option<String>,
    #[serde(default)]
    pub sum: Option<Amount>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Exporters write amounts either as JSON numbers or as decimal strings.
/// Both are rendered exactly as they appeared in the file; a number keeps
/// its source token (`0.0`, `1.50`, `1e-6`) instead of going through `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Number(String),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let token = raw.get().trim();

        if token.starts_with('"') {
            let text: String = serde_json::from_str(token).map_err(de::Error::custom)?;
            return Ok(Amount::Text(text));
        }
        serde_json::from_str::<serde_json::Number>(token)
            .map(|_| Amount::Number(token.to_string()))
            .map_err(|_| de::Error::custom(format!("expected a number or a string amount, found {}", token)))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Amount::Number(token) => token
                .parse::<serde_json::Number>()
                .map_err(ser::Error::custom)?
                .serialize(serializer),
            Amount::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(token) | Amount::Text(token) => f.write_str(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub username: String,
    pub pretext: String,
    pub color: String,
    pub fields: Vec<SlackField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackField {
    pub title: String,
    pub value: String,
}

/// How a single invocation finished when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The object was deleted; nothing to report.
    Deleted,
    /// The export contained no line items.
    Empty,
    Notified { fields: usize },
}
