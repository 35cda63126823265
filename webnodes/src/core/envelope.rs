//! Per-item output envelopes.

use serde::{Deserialize, Serialize};

use crate::errors::NodeError;
use crate::utils::iso_timestamp;

/// Points an output record back at the input record it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairedItem {
    /// Index of the originating input item.
    pub item: usize,
}

/// One output record.
///
/// The JSON object always carries `success` and `timestamp`. Successful
/// records also carry `operation` and the operation payload flattened into
/// the top level; error records carry `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// The record payload.
    pub json: serde_json::Value,
    /// The originating input position.
    pub paired_item: PairedItem,
}

impl ResultEnvelope {
    /// Creates a success envelope for `operation` with the given payload.
    ///
    /// The payload must serialize to a JSON object; its fields are merged into
    /// the envelope.
    pub fn success<P: Serialize>(
        index: usize,
        operation: &str,
        payload: &P,
    ) -> Result<Self, NodeError> {
        let mut json = serde_json::Map::new();
        json.insert("success".to_string(), serde_json::json!(true));
        json.insert("operation".to_string(), serde_json::json!(operation));

        match serde_json::to_value(payload)? {
            serde_json::Value::Object(fields) => json.extend(fields),
            other => {
                return Err(NodeError::Serialization(format!(
                    "envelope payload must be an object, got {other}"
                )))
            }
        }

        json.insert("timestamp".to_string(), serde_json::json!(iso_timestamp()));

        Ok(Self {
            json: serde_json::Value::Object(json),
            paired_item: PairedItem { item: index },
        })
    }

    /// Creates an error record for a recovered hard failure.
    #[must_use]
    pub fn failure(index: usize, error: &NodeError) -> Self {
        Self {
            json: serde_json::json!({
                "success": false,
                "error": error.to_string(),
                "timestamp": iso_timestamp(),
            }),
            paired_item: PairedItem { item: index },
        }
    }

    /// Index of the originating input item.
    #[must_use]
    pub fn index(&self) -> usize {
        self.paired_item.item
    }

    /// The top-level `success` flag.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.json
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// The operation tag, absent on error records.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.json.get("operation").and_then(serde_json::Value::as_str)
    }

    /// The error message, present only on error records.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.json.get("error").and_then(serde_json::Value::as_str)
    }

    /// Gets a top-level field of the record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.json.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        total_found: usize,
    }

    #[test]
    fn test_success_envelope_merges_payload() {
        let env = ResultEnvelope::success(3, "extract_links", &Payload { total_found: 2 }).unwrap();

        assert_eq!(env.index(), 3);
        assert!(env.is_success());
        assert_eq!(env.operation(), Some("extract_links"));
        assert_eq!(env.get("totalFound"), Some(&serde_json::json!(2)));
        assert!(env.get("timestamp").is_some());
        assert!(env.error().is_none());
    }

    #[test]
    fn test_success_envelope_rejects_non_object_payload() {
        let result = ResultEnvelope::success(0, "search", &vec![1, 2, 3]);
        assert!(matches!(result, Err(NodeError::Serialization(_))));
    }

    #[test]
    fn test_failure_envelope() {
        let err: NodeError = ValidationError::new("Query parameter is required").into();
        let env = ResultEnvelope::failure(1, &err);

        assert_eq!(env.index(), 1);
        assert!(!env.is_success());
        assert_eq!(env.error(), Some("Query parameter is required"));
        assert!(env.operation().is_none());
    }

    #[test]
    fn test_envelope_serializes_paired_item() {
        let err: NodeError = ValidationError::new("x").into();
        let value = serde_json::to_value(ResultEnvelope::failure(4, &err)).unwrap();
        assert_eq!(value["pairedItem"]["item"], 4);
    }
}
