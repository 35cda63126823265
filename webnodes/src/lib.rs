//! # Webnodes
//!
//! Search and unsubscribe-link nodes for workflow automation hosts.
//!
//! A host hands a node an ordered batch of input items together with
//! per-item parameters, stored credentials and a continue-on-fail flag. The
//! node returns one envelope per item, paired back to its input position.
//!
//! - **Serper search**: one authenticated search request per item, with the
//!   response normalized to a fixed shape
//! - **Unsubscribe**: visit an unsubscribe URL and scrape the page, or pull
//!   unsubscribe links out of email text
//! - **Failure tolerance**: hard failures abort the batch or become error
//!   records, page-fetch failures are always recovered in place
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webnodes::prelude::*;
//!
//! let client = Arc::new(ReqwestHttpClient::new()?);
//! let registry = NodeRegistry::with_defaults(&NodesConfig::default(), client);
//!
//! let ctx = StaticExecutionContext::with_item_count(1)
//!     .with_parameter("operation", serde_json::json!("extract_links"))
//!     .with_parameter("emailContent", serde_json::json!(email_body));
//!
//! let report = registry.get("unsubscribe").unwrap().execute(&ctx).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod credentials;
pub mod errors;
pub mod extract;
pub mod http;
pub mod nodes;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{FetchConfig, NodesConfig, SearchConfig};
    pub use crate::context::{
        CredentialData, ExecuteFunctions, ParameterResolver, StaticExecutionContext,
    };
    pub use crate::core::{InputItem, PairedItem, ResultEnvelope};
    pub use crate::credentials::SerperApiCredentials;
    pub use crate::errors::{
        BatchError, NodeError, ParameterError, TransportError, ValidationError,
    };
    pub use crate::extract::{extract_links, ExtractedLinks, WebpageInfo};
    #[cfg(feature = "http")]
    pub use crate::http::ReqwestHttpClient;
    pub use crate::http::{HttpClient, HttpMethod, HttpResponse, RequestOptions};
    pub use crate::nodes::{
        Node, NodeDescription, NodeRegistry, SerperNode, UnsubscribeNode,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{BatchReport, BatchSummary, FailureMode, ItemLoop};
    pub use crate::utils::{iso_timestamp, Timestamp};
}
