//! Logging setup and span attributes.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Fails if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true),
            )
            .try_init(),
    }
    .context("failed to install tracing subscriber")
}

/// Attributes recorded on every item span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpanAttributes {
    /// Node type name.
    pub node: String,
    /// Batch execution ID.
    pub execution_id: Uuid,
    /// Item index.
    pub index: usize,
}

impl NodeSpanAttributes {
    /// Creates span attributes.
    #[must_use]
    pub fn new(node: impl Into<String>, execution_id: Uuid, index: usize) -> Self {
        Self {
            node: node.into(),
            execution_id,
            index,
        }
    }

    /// Flat key/value form for exporters.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        HashMap::from([
            ("node.name".to_string(), self.node.clone()),
            ("node.execution_id".to_string(), self.execution_id.to_string()),
            ("node.item_index".to_string(), self.index.to_string()),
        ])
    }
}
