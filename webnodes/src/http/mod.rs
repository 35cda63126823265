//! Outbound HTTP.
//!
//! Nodes only talk to the [`HttpClient`] protocol. The reqwest-backed
//! implementation lives behind the `http` feature.

#[cfg(feature = "http")]
mod client;
mod protocols;

#[cfg(feature = "http")]
pub use client::ReqwestHttpClient;
#[cfg(test)]
pub use protocols::MockHttpClient;
pub use protocols::{HttpClient, HttpMethod, HttpResponse, Redirect, RequestOptions};
