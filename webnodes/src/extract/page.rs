//! Metadata scraped from a fetched unsubscribe page.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::http::{HttpResponse, Redirect};

/// Title reported when a page has no `<title>` element.
pub const NO_TITLE: &str = "No title found";

/// Phrases that indicate the unsubscribe went through.
pub const CONFIRMATION_KEYWORDS: [&str; 7] = [
    "unsubscribed",
    "unsubscribe successful",
    "successfully unsubscribed",
    "removed from mailing list",
    "no longer receive",
    "opt-out successful",
    "cancelled subscription",
];

const UNKNOWN: &str = "unknown";

static TITLE: OnceLock<Option<Regex>> = OnceLock::new();

fn title_pattern() -> Option<&'static Regex> {
    TITLE
        .get_or_init(|| Regex::new(r"(?i)<title[^>]*>([^<]*)</title>").ok())
        .as_ref()
}

/// The trimmed text of the first `<title>` element, or [`NO_TITLE`].
#[must_use]
pub fn extract_title(html: &str) -> String {
    title_pattern()
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| NO_TITLE.to_string(), |m| m.as_str().trim().to_string())
}

/// Returns true if the page text contains any confirmation phrase.
#[must_use]
pub fn has_unsubscribe_confirmation(html: &str) -> bool {
    let lower = html.to_lowercase();
    CONFIRMATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Content of `<meta name="description">`, if present and non-empty.
#[must_use]
pub fn extract_description(html: &str) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// What was learned from visiting an unsubscribe URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpageInfo {
    /// HTTP status code.
    pub status_code: u16,
    /// Reason phrase.
    pub status_message: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Effective URL.
    pub url: String,
    /// URL after redirects, or the requested URL when not tracked.
    pub final_url: String,
    /// `content-type` header or `"unknown"`.
    pub content_type: String,
    /// `content-length` header or `"unknown"`.
    pub content_length: String,
    /// Page title or [`NO_TITLE`].
    pub title: String,
    /// Meta description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the page confirms the unsubscribe.
    pub has_unsubscribe_confirmation: bool,
    /// Redirects followed to reach the page.
    pub redirects: Vec<Redirect>,
}

impl WebpageInfo {
    /// Builds page info from a response to a request for `requested_url`.
    #[must_use]
    pub fn from_response(requested_url: &str, response: &HttpResponse) -> Self {
        let final_url = response
            .final_url
            .clone()
            .unwrap_or_else(|| requested_url.to_string());
        let header_or_unknown = |name: &str| {
            response
                .header(name)
                .map_or_else(|| UNKNOWN.to_string(), str::to_string)
        };

        Self {
            status_code: response.status_code,
            status_message: response.status_message.clone(),
            headers: response.headers.clone(),
            url: final_url.clone(),
            final_url,
            content_type: header_or_unknown("content-type"),
            content_length: header_or_unknown("content-length"),
            title: extract_title(&response.body),
            description: extract_description(&response.body),
            has_unsubscribe_confirmation: has_unsubscribe_confirmation(&response.body),
            redirects: response.redirects.clone(),
        }
    }
}
