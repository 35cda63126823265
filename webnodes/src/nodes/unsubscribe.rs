//! Unsubscribe link handling.
//!
//! `click_link` visits an unsubscribe URL and reports what the page says.
//! `extract_links` finds unsubscribe URLs in email text without any I/O.
//!
//! A failed visit is reported inside a success envelope with
//! `result.success = false` and never aborts the batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::description::{NodeDescription, NodeProperty, PropertyKind, PropertyOption};
use super::Node;
use crate::config::FetchConfig;
use crate::context::{ExecuteFunctions, ParameterResolver};
use crate::core::ResultEnvelope;
use crate::errors::{BatchError, NodeError, ValidationError};
use crate::extract::{extract_links, WebpageInfo};
use crate::http::{HttpClient, RequestOptions};
use crate::pipeline::{BatchReport, FailureMode, ItemLoop, ItemOutcome};

/// Operations of the unsubscribe node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsubscribeOperation {
    /// Visit an unsubscribe URL.
    ClickLink,
    /// Find unsubscribe URLs in email text.
    ExtractLinks,
}

impl UnsubscribeOperation {
    /// The operation tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClickLink => "click_link",
            Self::ExtractLinks => "extract_links",
        }
    }

    /// Parses an operation tag.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "click_link" => Ok(Self::ClickLink),
            "extract_links" => Ok(Self::ExtractLinks),
            other => Err(ValidationError::new(format!("Unsupported operation: {other}"))
                .with_parameter("operation")),
        }
    }
}

/// Outcome of visiting an unsubscribe URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResult {
    /// Whether the page could be fetched.
    pub success: bool,
    /// Page details, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_info: Option<WebpageInfo>,
    /// Transport failure message, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Summary line.
    pub message: String,
}

impl ClickResult {
    /// A fetched page.
    #[must_use]
    pub fn fetched(info: WebpageInfo) -> Self {
        Self {
            success: true,
            message: format!(
                "Successfully accessed unsubscribe page. Status: {}",
                info.status_code
            ),
            webpage_info: Some(info),
            error: None,
        }
    }

    /// A visit that produced no response.
    #[must_use]
    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            webpage_info: None,
            error: Some(error.into()),
            message: format!("Failed to access unsubscribe URL: {url}"),
        }
    }
}

#[derive(Serialize)]
struct ClickPayload<'a> {
    url: &'a str,
    result: &'a ClickResult,
}

/// Description of the unsubscribe node.
#[must_use]
pub fn unsubscribe_description() -> NodeDescription {
    let click = UnsubscribeOperation::ClickLink.as_str();
    let extract = UnsubscribeOperation::ExtractLinks.as_str();

    NodeDescription {
        display_name: "Unsubscribe".to_string(),
        name: "unsubscribe".to_string(),
        icon: "file:unsubscribe.png".to_string(),
        group: vec!["transform".to_string()],
        version: 1,
        subtitle: r#"={{$parameter["operation"] + ": " + $parameter["url"]}}"#.to_string(),
        description: "Click unsubscribe links and get webpage information".to_string(),
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: Vec::new(),
        properties: vec![
            NodeProperty::new("Operation", "operation", PropertyKind::Options, serde_json::json!(click))
                .with_options(vec![
                    PropertyOption::new("Click Unsubscribe Link", click)
                        .with_description("Click an unsubscribe link and get webpage info")
                        .with_action("Click unsubscribe link"),
                    PropertyOption::new("Extract Links from Email", extract)
                        .with_description("Extract unsubscribe links from email content")
                        .with_action("Extract unsubscribe links"),
                ])
                .without_expressions(),
            NodeProperty::new("Unsubscribe URL", "url", PropertyKind::String, serde_json::json!(""))
                .with_placeholder("https://example.com/unsubscribe")
                .with_description("The unsubscribe URL to click")
                .shown_for(click),
            NodeProperty::new("Email Content", "emailContent", PropertyKind::String, serde_json::json!(""))
                .with_rows(5)
                .with_placeholder("Paste email content here...")
                .with_description("Email content to extract unsubscribe links from")
                .shown_for(extract),
        ],
        usable_as_tool: true,
    }
}

/// Node visiting unsubscribe URLs or extracting them from text.
pub struct UnsubscribeNode {
    description: NodeDescription,
    config: FetchConfig,
    client: Arc<dyn HttpClient>,
}

impl UnsubscribeNode {
    /// Creates an unsubscribe node.
    #[must_use]
    pub fn new(config: FetchConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            description: unsubscribe_description(),
            config,
            client,
        }
    }

    async fn execute_item(
        &self,
        ctx: &dyn ExecuteFunctions,
        index: usize,
    ) -> Result<ItemOutcome, NodeError> {
        let params = ParameterResolver::new(ctx, index);
        let operation =
            params.string_or("operation", UnsubscribeOperation::ClickLink.as_str())?;

        match UnsubscribeOperation::parse(&operation)? {
            UnsubscribeOperation::ClickLink => {
                let url = params.string("url")?;
                if url.is_empty() {
                    return Err(ValidationError::new("URL is required")
                        .with_parameter("url")
                        .into());
                }
                self.click_link(index, &url).await
            }
            UnsubscribeOperation::ExtractLinks => {
                let content = params.string("emailContent")?;
                if content.is_empty() {
                    return Err(ValidationError::new("Email content is required")
                        .with_parameter("emailContent")
                        .into());
                }

                let found = extract_links(&content);
                debug!(total_found = found.total_found, "Extracted links");
                let envelope = ResultEnvelope::success(
                    index,
                    UnsubscribeOperation::ExtractLinks.as_str(),
                    &found,
                )?;
                Ok(ItemOutcome::Completed(envelope))
            }
        }
    }

    async fn click_link(&self, index: usize, url: &str) -> Result<ItemOutcome, NodeError> {
        let options = RequestOptions::get(url)
            .with_headers(self.config.request_headers())
            .with_timeout(Some(self.config.timeout()))
            .with_redirects(self.config.follow_redirects, self.config.max_redirects);

        debug!(url = %url, "Visiting unsubscribe link");
        let operation = UnsubscribeOperation::ClickLink.as_str();

        match self.client.request(options).await {
            Ok(response) => {
                let info = WebpageInfo::from_response(url, &response);
                info!(
                    url = %url,
                    status = info.status_code,
                    confirmed = info.has_unsubscribe_confirmation,
                    redirects = info.redirects.len(),
                    "Visited unsubscribe link"
                );
                let result = ClickResult::fetched(info);
                let envelope =
                    ResultEnvelope::success(index, operation, &ClickPayload { url, result: &result })?;
                Ok(ItemOutcome::Completed(envelope))
            }
            Err(err) => {
                let result = ClickResult::failed(url, err.message.clone());
                let envelope =
                    ResultEnvelope::success(index, operation, &ClickPayload { url, result: &result })?;
                Ok(ItemOutcome::SoftFailure {
                    envelope,
                    error: err.message,
                })
            }
        }
    }
}

impl std::fmt::Debug for UnsubscribeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsubscribeNode")
            .field("name", &self.description.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Node for UnsubscribeNode {
    fn description(&self) -> &NodeDescription {
        &self.description
    }

    async fn execute(&self, ctx: &dyn ExecuteFunctions) -> Result<BatchReport, BatchError> {
        let item_loop = ItemLoop::new(
            self.description.name.as_str(),
            FailureMode::from_continue_on_fail(ctx.continue_on_fail()),
        );
        item_loop
            .run(ctx.input_items().len(), |index| self.execute_item(ctx, index))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::http::{HttpMethod, MockHttpClient};
    use crate::testing::{click_context, extract_context, unsubscribe_page_response};
    use pretty_assertions::assert_eq;

    fn node_with(client: MockHttpClient) -> UnsubscribeNode {
        UnsubscribeNode::new(FetchConfig::default(), Arc::new(client))
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!(
            UnsubscribeOperation::parse("click_link").unwrap(),
            UnsubscribeOperation::ClickLink
        );
        assert_eq!(
            UnsubscribeOperation::parse("extract_links").unwrap(),
            UnsubscribeOperation::ExtractLinks
        );
        assert!(UnsubscribeOperation::parse("unsubscribe_all").is_err());
    }

    #[test]
    fn test_description() {
        let desc = unsubscribe_description();
        assert_eq!(desc.name, "unsubscribe");
        assert!(desc.credentials.is_empty());
        assert_eq!(desc.operations(), vec!["click_link", "extract_links"]);
        assert_eq!(desc.property("emailContent").unwrap().rows, Some(5));
    }

    #[tokio::test]
    async fn test_click_link_reports_page() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .withf(|opts| {
                opts.method == HttpMethod::Get
                    && opts.url == "https://example.com/unsubscribe"
                    && opts.timeout == Some(std::time::Duration::from_secs(30))
                    && opts.follow_redirects
                    && opts.header("User-Agent").is_some()
                    && opts.header("Accept-Language") == Some("en-US,en;q=0.5")
            })
            .times(1)
            .returning(|_| Ok(unsubscribe_page_response("https://example.com/unsubscribe/done")));

        let report = node_with(client)
            .execute(&click_context(&["https://example.com/unsubscribe"]))
            .await
            .unwrap();

        let env = &report.envelopes[0];
        assert!(env.is_success());
        assert_eq!(env.operation(), Some("click_link"));
        assert_eq!(env.get("url"), Some(&serde_json::json!("https://example.com/unsubscribe")));

        let result = &env.json["result"];
        assert_eq!(result["success"], true);
        assert_eq!(
            result["message"],
            "Successfully accessed unsubscribe page. Status: 200"
        );
        let info = &result["webpageInfo"];
        assert_eq!(info["title"], "Unsubscribe Confirmation");
        assert_eq!(info["hasUnsubscribeConfirmation"], true);
        assert_eq!(info["finalUrl"], "https://example.com/unsubscribe/done");
        assert_eq!(info["redirects"][0]["statusCode"], 302);
        assert_eq!(info["description"], "Manage your email preferences");
    }

    #[tokio::test]
    async fn test_non_2xx_page_is_not_a_failure() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .times(1)
            .returning(|_| Ok(crate::http::HttpResponse::new(404, "<p>gone</p>").with_status_message("Not Found")));

        let report = node_with(client)
            .execute(&click_context(&["https://example.com/u"]))
            .await
            .unwrap();

        let result = &report.envelopes[0].json["result"];
        assert_eq!(result["success"], true);
        assert_eq!(result["webpageInfo"]["statusCode"], 404);
        assert_eq!(result["webpageInfo"]["title"], "No title found");
        assert_eq!(result["webpageInfo"]["contentType"], "unknown");
        assert_eq!(result["webpageInfo"]["finalUrl"], "https://example.com/u");
        assert!(!report.summary.has_failures());
    }

    #[tokio::test]
    async fn test_transport_failure_is_soft_in_both_modes() {
        for continue_on_fail in [false, true] {
            let mut client = MockHttpClient::new();
            client
                .expect_request()
                .times(1)
                .returning(|_| Err(TransportError::timeout("Request timed out after 30000ms")));

            let ctx = click_context(&["https://slow.example.com/u"])
                .with_continue_on_fail(continue_on_fail);
            let report = node_with(client).execute(&ctx).await.unwrap();

            let env = &report.envelopes[0];
            assert!(env.is_success());
            assert_eq!(env.json["result"]["success"], false);
            assert_eq!(env.json["result"]["error"], "Request timed out after 30000ms");
            assert_eq!(
                env.json["result"]["message"],
                "Failed to access unsubscribe URL: https://slow.example.com/u"
            );
            assert!(env.json["result"].get("webpageInfo").is_none());
            assert_eq!(report.summary.recovered, 1);
        }
    }

    #[tokio::test]
    async fn test_empty_url_is_hard_failure() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let err = node_with(client)
            .execute(&click_context(&[""]))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "URL is required");
    }

    #[tokio::test]
    async fn test_empty_url_with_continue_on_fail_is_error_record() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .times(1)
            .returning(|_| Ok(unsubscribe_page_response("https://example.com/done")));

        let report = node_with(client)
            .execute(&click_context(&["", "https://example.com/u"]).with_continue_on_fail(true))
            .await
            .unwrap();

        let failed = &report.envelopes[0];
        assert_eq!(failed.index(), 0);
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("URL is required"));
        assert_eq!(failed.operation(), None);
        assert_eq!(report.envelopes[1].index(), 1);
        assert!(report.envelopes[1].is_success());
    }

    #[tokio::test]
    async fn test_unusable_timeout_falls_back_to_default() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .withf(|opts| opts.timeout == Some(std::time::Duration::from_secs(30)))
            .times(1)
            .returning(|_| Ok(unsubscribe_page_response("https://x.com/done")));

        let node = UnsubscribeNode::new(FetchConfig::new().with_timeout(-1.0), Arc::new(client));
        let report = node.execute(&click_context(&["https://x.com/u"])).await.unwrap();

        assert!(report.envelopes[0].is_success());
    }

    #[tokio::test]
    async fn test_extract_links_makes_no_request() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let report = node_with(client)
            .execute(&extract_context(&[
                "Click here to unsubscribe: https://example.com/unsubscribe or visit https://example.com/opt-out",
                "Nothing to see here",
            ]))
            .await
            .unwrap();

        let first = &report.envelopes[0];
        assert_eq!(first.operation(), Some("extract_links"));
        assert_eq!(
            first.get("links"),
            Some(&serde_json::json!([
                "https://example.com/unsubscribe",
                "https://example.com/opt-out"
            ]))
        );
        assert_eq!(first.get("totalFound"), Some(&serde_json::json!(2)));

        let second = &report.envelopes[1];
        assert!(second.is_success());
        assert_eq!(second.get("links"), Some(&serde_json::json!([])));
        assert_eq!(second.get("totalFound"), Some(&serde_json::json!(0)));
    }

    #[tokio::test]
    async fn test_empty_email_content_is_hard_failure() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let err = node_with(client)
            .execute(&extract_context(&[""]))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Email content is required");
    }
}
