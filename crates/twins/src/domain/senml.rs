//! Telemetry decoder
//!
//! Payloads are JSON arrays of SenML-style records. Records are used as
//! published: base fields are not resolved and values are not normalized.

use crate::error::{TwinError, TwinResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single telemetry record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "bn", default, skip_serializing_if = "Option::is_none")]
    pub base_name: Option<String>,
    #[serde(rename = "bt", default, skip_serializing_if = "Option::is_none")]
    pub base_time: Option<f64>,
    #[serde(rename = "bu", default, skip_serializing_if = "Option::is_none")]
    pub base_unit: Option<String>,
    #[serde(rename = "bv", default, skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
    #[serde(rename = "bs", default, skip_serializing_if = "Option::is_none")]
    pub base_sum: Option<f64>,
    #[serde(rename = "bver", default, skip_serializing_if = "Option::is_none")]
    pub base_version: Option<u64>,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "vs", default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(rename = "vb", default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(rename = "vd", default, skip_serializing_if = "Option::is_none")]
    pub data_value: Option<String>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(rename = "ut", default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<f64>,
}

impl Record {
    /// The record's value: numeric first, then string, boolean and data.
    pub fn captured_value(&self) -> Option<Value> {
        if let Some(v) = self.value {
            return Some(Value::from(v));
        }
        if let Some(vs) = &self.string_value {
            return Some(Value::from(vs.as_str()));
        }
        if let Some(vb) = self.bool_value {
            return Some(Value::from(vb));
        }
        self.data_value.as_deref().map(Value::from)
    }
}

/// Decode a telemetry payload into its ordered records.
///
/// An empty batch decodes to no records.
pub fn decode_records(payload: &[u8]) -> TwinResult<Vec<Record>> {
    serde_json::from_slice(payload).map_err(|e| TwinError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_preserves_order() {
        let payload = br#"[{"bn":"pump:","n":"temp","u":"Cel","v":21.5},{"n":"state","vs":"on"}]"#;
        let records = decode_records(payload).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].base_name.as_deref(), Some("pump:"));
        assert_eq!(records[0].captured_value(), Some(json!(21.5)));
        assert_eq!(records[1].captured_value(), Some(json!("on")));
    }

    #[test]
    fn test_numeric_value_takes_precedence() {
        let record = Record {
            value: Some(3.0),
            bool_value: Some(true),
            ..Record::default()
        };
        assert_eq!(record.captured_value(), Some(json!(3.0)));
    }

    #[test]
    fn test_record_without_value() {
        let records = decode_records(br#"[{"n":"temp","t":1700000000}]"#).unwrap();
        assert_eq!(records[0].captured_value(), None);
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(decode_records(b"not json"), Err(TwinError::Decode(_))));
        assert!(matches!(decode_records(br#"{"v":1}"#), Err(TwinError::Decode(_))));
    }

    #[test]
    fn test_empty_batch_decodes_to_nothing() {
        assert!(decode_records(b"[]").unwrap().is_empty());
    }
}
