//! The execution contract a host offers to a node.

use std::collections::HashMap;

use crate::core::InputItem;
use crate::errors::{NodeError, ParameterError};

/// Fields of a stored credential record.
pub type CredentialData = HashMap<String, serde_json::Value>;

/// Functions a host exposes to a node during one execution.
pub trait ExecuteFunctions: Send + Sync {
    /// The input batch, in order.
    fn input_items(&self) -> &[InputItem];

    /// Resolves a node parameter for the item at `index`.
    ///
    /// Returns `Ok(None)` when the parameter is not set.
    fn node_parameter(
        &self,
        name: &str,
        index: usize,
    ) -> Result<Option<serde_json::Value>, ParameterError>;

    /// Looks up a stored credential by type name.
    fn credentials(&self, name: &str) -> Result<Option<CredentialData>, NodeError>;

    /// Whether item failures become error records instead of aborting.
    fn continue_on_fail(&self) -> bool;
}
