use async_trait::async_trait;
use tracing::{debug, info, error};
use crate::domain::{error::BillingError, models::BillingRecord, ports::BillingParser};

pub struct JsonBillingParser;

impl JsonBillingParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonBillingParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingParser for JsonBillingParser {
    async fn parse(&self, payload: &[u8]) -> Result<Vec<BillingRecord>, BillingError> {
        parse_billing(payload)
    }
}

/// Decodes a billing export: a top-level JSON array of line items.
pub fn parse_billing(bytes: &[u8]) -> Result<Vec<BillingRecord>, BillingError> {
    debug!("Decoding billing export of {} bytes", bytes.len());

    let records: Vec<BillingRecord> = serde_json::from_slice(bytes)
        .map_err(|e| {
            error!("Failed to decode billing JSON at line {}, column {}: {}", e.line(), e.column(), e);
            BillingError::Parse(e.to_string())
        })?;

    info!("Parsed {} billing records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Amount;

    #[test]
    fn test_parse_single_record() {
        let raw = br#"[{"projectId":"p1","description":"compute","cost":{"amount":12.5}}]"#;
        let records = parse_billing(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_id, "p1");
        assert_eq!(records[0].description, "compute");
        assert_eq!(records[0].cost.amount.to_string(), "12.5");
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_billing(b"[]").unwrap().is_empty());
        assert!(parse_billing(b"  [ ]\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_string_amount() {
        let raw = br#"[{"projectId":"p","description":"d","cost":{"amount":"0.01","currency":"USD"}}]"#;
        let records = parse_billing(raw).unwrap();
        assert_eq!(records[0].cost.amount, Amount::Text("0.01".to_string()));
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(matches!(parse_billing(b"{not valid"), Err(BillingError::Parse(_))));
        assert!(matches!(parse_billing(b""), Err(BillingError::Parse(_))));
    }

    #[tokio::test]
    async fn test_parser_port_decodes_export() {
        let parser = JsonBillingParser::new();
        let records = parser
            .parse(br#"[{"projectId":"p1","description":"compute","cost":{"amount":0.0}}]"#)
            .await
            .unwrap();
        assert_eq!(records[0].cost.amount.to_string(), "0.0");
        assert!(matches!(parser.parse(b"{not valid").await, Err(BillingError::Parse(_))));
    }

    #[test]
    fn test_parse_wrong_shape() {
        assert!(matches!(parse_billing(br#"{"projectId":"p"}"#), Err(BillingError::Parse(_))));
        assert!(matches!(
            parse_billing(br#"[{"projectId":"p","description":"d"}]"#),
            Err(BillingError::Parse(_))
        ));
    }
}
