//! JSON parser for the safety-events dataset.

use serde_json::Value;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::RawEvent;

/// Decodes a JSON array of flat records into [`RawEvent`]s.
///
/// Array elements that are not objects are skipped.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array.
pub fn parse_events(bytes: &[u8]) -> Result<Vec<RawEvent>, PipelineError> {
    let records: Vec<Value> = serde_json::from_slice(bytes)?;
    let total = records.len();

    let events: Vec<RawEvent> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Value::Object(map) => Some(RawEvent::from_record(map)),
            other => {
                debug!(index, kind = json_kind(other), "Skipping non-object record");
                None
            }
        })
        .collect();

    if events.len() < total {
        debug!(skipped = total - events.len(), "Non-object records skipped");
    }

    Ok(events)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_array() {
        let events = parse_events(b"[]").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let result = parse_events(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_top_level_object() {
        let result = parse_events(br#"{ "agency": "MTA" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_skips_non_objects() {
        let bytes = br#"[
            { "agency": "MTA New York City Transit", "total_fatalities": "1" },
            42,
            null,
            { "agency": "LA Metro" }
        ]"#;
        let events = parse_events(bytes).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].agency.as_deref(), Some("MTA New York City Transit"));
        assert_eq!(events[0].total_fatalities.as_deref(), Some("1"));
        assert_eq!(events[1].agency.as_deref(), Some("LA Metro"));
    }
}
