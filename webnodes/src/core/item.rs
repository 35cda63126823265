//! Input records handed to a node by the host.

use serde::{Deserialize, Serialize};

/// One record of the host's input batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    /// The record's JSON payload.
    #[serde(default)]
    pub json: serde_json::Map<String, serde_json::Value>,
}

impl InputItem {
    /// Creates an empty input item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input item from a JSON value.
    ///
    /// Non-object values are wrapped under a `data` key.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(json) => Self { json },
            other => {
                let mut json = serde_json::Map::new();
                json.insert("data".to_string(), other);
                Self { json }
            }
        }
    }

    /// Gets a field of the payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.json.get(key)
    }
}
