//! Static node descriptions.
//!
//! A description tells the host how to render a node: its parameters, the
//! option sets they accept and which credential types it needs. It carries
//! no behaviour.

use serde::{Deserialize, Serialize};

/// Value type of a node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Free text.
    String,
    /// A number.
    Number,
    /// One of a fixed set of options.
    Options,
}

/// One choice of an options property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOption {
    /// Label shown to users.
    pub name: String,
    /// Stored value.
    pub value: String,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Action label used when the node runs as a tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl PropertyOption {
    /// Creates an option.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
            action: None,
        }
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the action label.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// One configurable parameter of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    /// Label shown to users.
    pub display_name: String,
    /// Parameter name.
    pub name: String,
    /// Value type.
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    /// Default value.
    pub default: serde_json::Value,
    /// Input placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accepted values for [`PropertyKind::Options`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
    /// Operations for which the property is shown. Empty means always.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_for_operations: Vec<String>,
    /// Text area height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    /// Whether expressions are disallowed.
    #[serde(default)]
    pub no_data_expression: bool,
}

impl NodeProperty {
    /// Creates a property.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        name: impl Into<String>,
        kind: PropertyKind,
        default: serde_json::Value,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            name: name.into(),
            kind,
            default,
            placeholder: None,
            description: None,
            options: Vec::new(),
            show_for_operations: Vec::new(),
            rows: None,
            no_data_expression: false,
        }
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the option set.
    #[must_use]
    pub fn with_options(mut self, options: Vec<PropertyOption>) -> Self {
        self.options = options;
        self
    }

    /// Shows the property only for the given operation.
    #[must_use]
    pub fn shown_for(mut self, operation: impl Into<String>) -> Self {
        self.show_for_operations.push(operation.into());
        self
    }

    /// Sets the text area height.
    #[must_use]
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Disallows expressions.
    #[must_use]
    pub fn without_expressions(mut self) -> Self {
        self.no_data_expression = true;
        self
    }

    /// Returns true if `value` is an accepted option.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.kind != PropertyKind::Options || self.options.iter().any(|o| o.value == value)
    }
}

/// A credential type a node needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequirement {
    /// Credential type name.
    pub name: String,
    /// Whether execution fails without it.
    pub required: bool,
}

/// Static description of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Label shown to users.
    pub display_name: String,
    /// Node type name.
    pub name: String,
    /// Icon reference.
    pub icon: String,
    /// Palette groups.
    pub group: Vec<String>,
    /// Description version.
    pub version: u32,
    /// Subtitle expression.
    pub subtitle: String,
    /// Help text.
    pub description: String,
    /// Input connection names.
    pub inputs: Vec<String>,
    /// Output connection names.
    pub outputs: Vec<String>,
    /// Credential types used.
    #[serde(default)]
    pub credentials: Vec<CredentialRequirement>,
    /// Parameters.
    pub properties: Vec<NodeProperty>,
    /// Whether agents may call the node as a tool.
    pub usable_as_tool: bool,
}

impl NodeDescription {
    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Accepted values of the `operation` property.
    #[must_use]
    pub fn operations(&self) -> Vec<&str> {
        self.property("operation")
            .map(|p| p.options.iter().map(|o| o.value.as_str()).collect())
            .unwrap_or_default()
    }

    /// Returns true if the node needs the named credential type.
    #[must_use]
    pub fn requires_credential(&self, name: &str) -> bool {
        self.credentials.iter().any(|c| c.name == name && c.required)
    }
}
