//! Error types for webnodes.
//!
//! Every per-item failure is a [`NodeError`]. Whether it aborts the batch or
//! is turned into an error envelope is decided by the item loop in
//! [`crate::pipeline`], never by the error itself.

use std::collections::HashMap;
use thiserror::Error;

use crate::core::ResultEnvelope;

/// The main error type for node execution.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    /// A required input was missing or malformed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An outbound HTTP call failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A node parameter could not be resolved.
    #[error("{0}")]
    Parameter(#[from] ParameterError),

    /// The host could not provide the requested credentials.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NodeError {
    /// Short type name used in logs and dictionaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Transport(_) => "TransportError",
            Self::Parameter(_) => "ParameterError",
            Self::Credentials(_) => "CredentialsError",
            Self::Serialization(_) => "SerializationError",
        }
    }

    /// Returns true if this is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a transport failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Validation(err) => err.to_dict(),
            Self::Transport(err) => err.to_dict(),
            _ => HashMap::new(),
        };
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when a required input is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The parameter that failed validation, if known.
    pub parameter: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameter: None,
        }
    }

    /// Sets the offending parameter name.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter = Some(name.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(ref parameter) = self.parameter {
            map.insert("parameter".to_string(), serde_json::json!(parameter));
        }
        map
    }
}

/// Error raised when an outbound request fails.
///
/// Covers network errors, timeouts, DNS failures and HTTP-level failures
/// (non-2xx responses where the caller treats them as errors).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// The error message.
    pub message: String,
    /// HTTP status code for HTTP-level failures.
    pub status_code: Option<u16>,
    /// Whether the request timed out.
    pub timed_out: bool,
}

impl TransportError {
    /// Creates a new transport error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            timed_out: false,
        }
    }

    /// Creates an HTTP-level failure for the given status.
    #[must_use]
    pub fn http_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
            timed_out: false,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            timed_out: true,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(status) = self.status_code {
            map.insert("status_code".to_string(), serde_json::json!(status));
        }
        map.insert("timed_out".to_string(), serde_json::json!(self.timed_out));
        map
    }
}

/// Errors raised while resolving node parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// The parameter has a value of the wrong type.
    #[error("Parameter '{name}' has invalid type: expected {expected}")]
    InvalidType {
        /// The parameter name.
        name: String,
        /// The expected type.
        expected: &'static str,
    },

    /// The item index is outside the input batch.
    #[error("Item index {index} is out of range (batch has {len} items)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The batch length.
        len: usize,
    },

    /// The host failed to resolve the parameter.
    #[error("Could not get parameter '{name}': {reason}")]
    Unresolvable {
        /// The parameter name.
        name: String,
        /// Why resolution failed.
        reason: String,
    },
}

impl ParameterError {
    /// Creates an invalid type error.
    #[must_use]
    pub fn invalid_type(name: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidType {
            name: name.into(),
            expected,
        }
    }

    /// Creates an unresolvable parameter error.
    #[must_use]
    pub fn unresolvable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// A hard failure that aborted a batch.
///
/// Envelopes produced before the failing item are kept in `completed`.
#[derive(Debug, Clone, Error)]
#[error("Item {index} failed: {source}")]
pub struct BatchError {
    /// Index of the item that failed.
    pub index: usize,
    /// The underlying failure.
    #[source]
    pub source: NodeError,
    /// Envelopes emitted before the failure.
    pub completed: Vec<ResultEnvelope>,
}

impl BatchError {
    /// Creates a new batch error.
    #[must_use]
    pub fn new(index: usize, source: NodeError, completed: Vec<ResultEnvelope>) -> Self {
        Self {
            index,
            source,
            completed,
        }
    }

    /// The message of the underlying failure.
    #[must_use]
    pub fn message(&self) -> String {
        self.source.to_string()
    }
}
