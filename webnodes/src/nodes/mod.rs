//! Workflow nodes.
//!
//! A node receives the whole input batch from its host and returns one
//! envelope per item, in input order.

mod description;
mod serper;
mod unsubscribe;


use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::NodesConfig;
use crate::context::ExecuteFunctions;
use crate::errors::BatchError;
use crate::http::HttpClient;
use crate::pipeline::BatchReport;

pub use description::{
    CredentialRequirement, NodeDescription, NodeProperty, PropertyKind, PropertyOption,
};
pub use serper::{
    serper_description, SafeSearch, SearchOperation, SearchParameters, SearchRequest,
    SearchResult, SerperNode,
};
pub use unsubscribe::{unsubscribe_description, ClickResult, UnsubscribeNode, UnsubscribeOperation};

/// Trait for workflow nodes.
#[async_trait]
pub trait Node: Send + Sync + Debug {
    /// Returns the static description of the node.
    fn description(&self) -> &NodeDescription;

    /// Returns the node type name.
    fn name(&self) -> &str {
        &self.description().name
    }

    /// Runs the node over the host's input batch.
    ///
    /// Items are processed one at a time in index order. A hard failure
    /// without continue-on-fail aborts the batch; the envelopes produced
    /// before it are kept in the returned [`BatchError`].
    async fn execute(&self, ctx: &dyn ExecuteFunctions) -> Result<BatchReport, BatchError>;
}

/// Registry of node instances by type name.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<String, Arc<dyn Node>>>,
}

impl NodeRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the search and unsubscribe nodes.
    #[must_use]
    pub fn with_defaults(config: &NodesConfig, client: Arc<dyn HttpClient>) -> Self {
        let registry = Self::new();
        registry.register(Arc::new(SerperNode::new(
            config.search.clone(),
            Arc::clone(&client),
        )));
        registry.register(Arc::new(UnsubscribeNode::new(config.fetch.clone(), client)));
        registry
    }

    /// Registers a node under its type name, replacing any previous one.
    pub fn register(&self, node: Arc<dyn Node>) {
        let name = node.name().to_string();
        self.nodes.write().insert(name, node);
    }

    /// Gets a node by type name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.read().get(name).cloned()
    }

    /// Checks if a node type is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.read().contains_key(name)
    }

    /// Lists registered type names, sorted.
    pub fn list_nodes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptions of every registered node, sorted by name.
    pub fn descriptions(&self) -> Vec<NodeDescription> {
        let nodes = self.nodes.read();
        let mut descriptions: Vec<NodeDescription> =
            nodes.values().map(|n| n.description().clone()).collect();
        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        descriptions
    }
}

impl Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.list_nodes())
            .finish()
    }
}
