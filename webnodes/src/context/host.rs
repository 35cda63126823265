//! In-memory host implementation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::{CredentialData, ExecuteFunctions};
use crate::core::InputItem;
use crate::errors::{NodeError, ParameterError};

static FIELD_EXPRESSION: OnceLock<Option<Regex>> = OnceLock::new();

fn field_expression() -> Option<&'static Regex> {
    FIELD_EXPRESSION
        .get_or_init(|| Regex::new(r"^=\{\{\s*\$json\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}$").ok())
        .as_ref()
}

/// A host backed by plain data.
///
/// Parameters are looked up per item first, then at node level. A string
/// parameter of the form `={{ $json.field }}` resolves to that field of the
/// current input item. Deserializable so that a whole batch can be described
/// in one JSON document:
///
/// ```json
/// {
///   "items": [{"json": {"q": "rust"}}],
///   "parameters": {"operation": "search", "query": "={{ $json.q }}"},
///   "credentials": {"serperApi": {"apiKey": "..."}},
///   "continueOnFail": true
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticExecutionContext {
    #[serde(default)]
    items: Vec<InputItem>,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    item_parameters: HashMap<usize, serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    credentials: HashMap<String, CredentialData>,
    #[serde(default)]
    continue_on_fail: bool,
}

impl StaticExecutionContext {
    /// Creates a context over the given items.
    #[must_use]
    pub fn new(items: Vec<InputItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Creates a context with `count` empty items.
    #[must_use]
    pub fn with_item_count(count: usize) -> Self {
        Self::new(vec![InputItem::new(); count])
    }

    /// Parses a batch description.
    pub fn from_json_str(json: &str) -> Result<Self, NodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets a node-level parameter shared by all items.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Sets a parameter for one item, overriding the node-level value.
    #[must_use]
    pub fn with_item_parameter(
        mut self,
        index: usize,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.item_parameters
            .entry(index)
            .or_default()
            .insert(name.into(), value);
        self
    }

    /// Stores a credential record under a type name.
    #[must_use]
    pub fn with_credentials(mut self, name: impl Into<String>, data: CredentialData) -> Self {
        self.credentials.insert(name.into(), data);
        self
    }

    /// Sets the continue-on-fail flag.
    #[must_use]
    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    fn resolve_expression(
        &self,
        name: &str,
        index: usize,
        value: serde_json::Value,
    ) -> Result<serde_json::Value, ParameterError> {
        let serde_json::Value::String(ref raw) = value else {
            return Ok(value);
        };
        if !raw.starts_with("={{") {
            return Ok(value);
        }

        let captures = field_expression()
            .and_then(|re| re.captures(raw))
            .ok_or_else(|| ParameterError::unresolvable(name, format!("unsupported expression {raw}")))?;

        Ok(self.items[index]
            .get(&captures[1])
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }
}

impl ExecuteFunctions for StaticExecutionContext {
    fn input_items(&self) -> &[InputItem] {
        &self.items
    }

    fn node_parameter(
        &self,
        name: &str,
        index: usize,
    ) -> Result<Option<serde_json::Value>, ParameterError> {
        if index >= self.items.len() {
            return Err(ParameterError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let value = self
            .item_parameters
            .get(&index)
            .and_then(|params| params.get(name))
            .or_else(|| self.parameters.get(name))
            .cloned();

        value
            .map(|v| self.resolve_expression(name, index, v))
            .transpose()
    }

    fn credentials(&self, name: &str) -> Result<Option<CredentialData>, NodeError> {
        Ok(self.credentials.get(name).cloned())
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_parameter_overrides_node_parameter() {
        let ctx = StaticExecutionContext::with_item_count(2)
            .with_parameter("query", serde_json::json!("shared"))
            .with_item_parameter(1, "query", serde_json::json!("second"));

        assert_eq!(
            ctx.node_parameter("query", 0).unwrap(),
            Some(serde_json::json!("shared"))
        );
        assert_eq!(
            ctx.node_parameter("query", 1).unwrap(),
            Some(serde_json::json!("second"))
        );
        assert_eq!(ctx.node_parameter("missing", 0).unwrap(), None);
    }

    #[test]
    fn test_field_expression_reads_item_json() {
        let ctx = StaticExecutionContext::new(vec![
            InputItem::from_value(serde_json::json!({"q": "first"})),
            InputItem::from_value(serde_json::json!({"other": 1})),
        ])
        .with_parameter("query", serde_json::json!("={{ $json.q }}"));

        assert_eq!(
            ctx.node_parameter("query", 0).unwrap(),
            Some(serde_json::json!("first"))
        );
        assert_eq!(
            ctx.node_parameter("query", 1).unwrap(),
            Some(serde_json::Value::Null)
        );
    }

    #[test]
    fn test_unsupported_expression_is_an_error() {
        let ctx = StaticExecutionContext::with_item_count(1)
            .with_parameter("query", serde_json::json!("={{ $node.other }}"));

        assert!(matches!(
            ctx.node_parameter("query", 0),
            Err(ParameterError::Unresolvable { .. })
        ));
    }

    #[test]
    fn test_from_json_batch() {
        let ctx = StaticExecutionContext::from_json_str(
            r#"{
                "items": [{"json": {"q": "rust"}}, {}],
                "parameters": {"operation": "search"},
                "itemParameters": {"1": {"query": "tokio"}},
                "credentials": {"serperApi": {"apiKey": "k"}},
                "continueOnFail": true
            }"#,
        )
        .unwrap();

        assert_eq!(ctx.input_items().len(), 2);
        assert!(ctx.continue_on_fail());
        assert_eq!(
            ctx.node_parameter("query", 1).unwrap(),
            Some(serde_json::json!("tokio"))
        );
        let creds = ctx.credentials("serperApi").unwrap().unwrap();
        assert_eq!(creds.get("apiKey"), Some(&serde_json::json!("k")));
        assert!(ctx.credentials("other").unwrap().is_none());
    }
}
