//! Testing utilities for webnodes.
//!
//! This module provides:
//! - A scripted HTTP client that records every request
//! - Context builders and canned responses

mod fixtures;
mod mocks;

pub use fixtures::{
    click_context, extract_context, search_context, serper_credentials, serper_response,
    serper_response_json, unsubscribe_page_response, UNSUBSCRIBE_PAGE_HTML,
};
pub use mocks::ScriptedHttpClient;
