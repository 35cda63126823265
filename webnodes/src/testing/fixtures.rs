//! Test fixtures for node batches.

use crate::context::{CredentialData, StaticExecutionContext};
use crate::credentials::SerperApiCredentials;
use crate::http::HttpResponse;

/// A page confirming an unsubscribe.
pub const UNSUBSCRIBE_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Unsubscribe Confirmation</title>
  <meta name="description" content="Manage your email preferences">
</head>
<body>
  <h1>You have been successfully unsubscribed.</h1>
  <p>You will no longer receive marketing emails from us.</p>
</body>
</html>"#;

/// A stored Serper credential record.
#[must_use]
pub fn serper_credentials(api_key: &str) -> CredentialData {
    CredentialData::from([(
        SerperApiCredentials::API_KEY_FIELD.to_string(),
        serde_json::json!(api_key),
    )])
}

/// A search batch with one item per query and a stored API key.
#[must_use]
pub fn search_context(queries: &[&str]) -> StaticExecutionContext {
    let ctx = StaticExecutionContext::with_item_count(queries.len())
        .with_parameter("operation", serde_json::json!("search"))
        .with_credentials(SerperApiCredentials::NAME, serper_credentials("test-key"));

    queries.iter().enumerate().fold(ctx, |ctx, (index, query)| {
        ctx.with_item_parameter(index, "query", serde_json::json!(query))
    })
}

/// A `click_link` batch with one item per URL.
#[must_use]
pub fn click_context(urls: &[&str]) -> StaticExecutionContext {
    let ctx = StaticExecutionContext::with_item_count(urls.len())
        .with_parameter("operation", serde_json::json!("click_link"));

    urls.iter().enumerate().fold(ctx, |ctx, (index, url)| {
        ctx.with_item_parameter(index, "url", serde_json::json!(url))
    })
}

/// An `extract_links` batch with one item per email body.
#[must_use]
pub fn extract_context(contents: &[&str]) -> StaticExecutionContext {
    let ctx = StaticExecutionContext::with_item_count(contents.len())
        .with_parameter("operation", serde_json::json!("extract_links"));

    contents.iter().enumerate().fold(ctx, |ctx, (index, content)| {
        ctx.with_item_parameter(index, "emailContent", serde_json::json!(content))
    })
}

/// A search API response body with every section populated.
#[must_use]
pub fn serper_response_json() -> serde_json::Value {
    serde_json::json!({
        "searchParameters": {"q": "rust async", "type": "search", "engine": "google"},
        "organic": [
            {
                "title": "Asynchronous Programming in Rust",
                "link": "https://rust-lang.github.io/async-book/",
                "snippet": "Getting started with async Rust.",
                "position": 1
            },
            {
                "title": "Tokio",
                "link": "https://tokio.rs/",
                "snippet": "An asynchronous runtime for Rust.",
                "position": 2
            }
        ],
        "peopleAlsoAsk": [
            {"question": "Is Rust async single threaded?", "snippet": "No."}
        ],
        "relatedSearches": [
            {"query": "rust async trait"}
        ],
        "searchInformation": {"totalResults": "1230000", "timeTaken": 0.31}
    })
}

/// A successful search API response.
#[must_use]
pub fn serper_response() -> HttpResponse {
    HttpResponse::new(200, serper_response_json().to_string())
        .with_status_message("OK")
        .with_header("content-type", "application/json")
}

/// A successful unsubscribe page response reached through one redirect.
#[must_use]
pub fn unsubscribe_page_response(final_url: &str) -> HttpResponse {
    HttpResponse::new(200, UNSUBSCRIBE_PAGE_HTML)
        .with_status_message("OK")
        .with_header("content-type", "text/html; charset=utf-8")
        .with_header("content-length", UNSUBSCRIBE_PAGE_HTML.len().to_string())
        .with_final_url(final_url)
        .with_redirect(302, final_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecuteFunctions;

    #[test]
    fn test_search_context() {
        let ctx = search_context(&["a", "b"]);
        assert_eq!(ctx.input_items().len(), 2);
        assert_eq!(
            ctx.node_parameter("query", 1).unwrap(),
            Some(serde_json::json!("b"))
        );
        assert!(ctx.credentials("serperApi").unwrap().is_some());
    }

    #[test]
    fn test_serper_response_is_json() {
        let body = serper_response().json().unwrap();
        assert_eq!(body["organic"].as_array().map(Vec::len), Some(2));
    }
}
