//! Web search through the Serper API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::description::{
    CredentialRequirement, NodeDescription, NodeProperty, PropertyKind, PropertyOption,
};
use super::Node;
use crate::config::SearchConfig;
use crate::context::{ExecuteFunctions, ParameterResolver};
use crate::core::ResultEnvelope;
use crate::credentials::SerperApiCredentials;
use crate::errors::{BatchError, NodeError, TransportError, ValidationError};
use crate::http::{HttpClient, HttpResponse, RequestOptions};
use crate::pipeline::{BatchReport, FailureMode, ItemLoop, ItemOutcome};

const MIN_RESULTS: i64 = 1;
const MAX_RESULTS: i64 = 100;

/// Operations of the search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOperation {
    /// A web search.
    Search,
}

impl SearchOperation {
    /// The operation tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
        }
    }

    /// Parses an operation tag.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "search" => Ok(Self::Search),
            other => Err(ValidationError::new(format!("Unsupported operation: {other}"))
                .with_parameter("operation")),
        }
    }
}

/// Safe search filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    /// No filtering.
    #[default]
    Off,
    /// Filter explicit results.
    Active,
}

impl SafeSearch {
    /// Parses a filter value.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "off" => Ok(Self::Off),
            "active" => Ok(Self::Active),
            other => Err(
                ValidationError::new(format!("Invalid safe search mode: {other}"))
                    .with_parameter("safe"),
            ),
        }
    }
}

/// Body sent to the search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text.
    pub q: String,
    /// Result count, always within `1..=100`.
    pub num: i64,
    /// Country code.
    pub gl: String,
    /// Language code.
    pub hl: String,
    /// Safe search filter.
    pub safe: SafeSearch,
}

/// The knobs as requested, before clamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Requested result count.
    pub num: i64,
    /// Country code.
    pub gl: String,
    /// Language code.
    pub hl: String,
    /// Safe search filter.
    pub safe: SafeSearch,
}

impl SearchParameters {
    /// Builds the request body, clamping the result count.
    #[must_use]
    pub fn to_request(&self, query: &str) -> SearchRequest {
        SearchRequest {
            q: query.to_string(),
            num: self.num.clamp(MIN_RESULTS, MAX_RESULTS),
            gl: self.gl.clone(),
            hl: self.hl.clone(),
            safe: self.safe,
        }
    }
}

/// Normalized search output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The query.
    pub query: String,
    /// The knobs as requested.
    pub search_parameters: SearchParameters,
    /// Organic results, empty when absent upstream.
    pub organic: serde_json::Value,
    /// Related questions, empty when absent upstream.
    pub people_also_ask: serde_json::Value,
    /// Related searches, empty when absent upstream.
    pub related_searches: serde_json::Value,
    /// Search metadata, empty when absent upstream.
    pub search_information: serde_json::Value,
}

impl SearchResult {
    /// Normalizes an API response body.
    #[must_use]
    pub fn from_response(
        query: &str,
        search_parameters: SearchParameters,
        body: &serde_json::Value,
    ) -> Self {
        let field_or = |name: &str, empty: serde_json::Value| {
            body.get(name)
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or(empty)
        };

        Self {
            query: query.to_string(),
            search_parameters,
            organic: field_or("organic", serde_json::json!([])),
            people_also_ask: field_or("peopleAlsoAsk", serde_json::json!([])),
            related_searches: field_or("relatedSearches", serde_json::json!([])),
            search_information: field_or("searchInformation", serde_json::json!({})),
        }
    }
}

/// Description of the search node.
#[must_use]
pub fn serper_description() -> NodeDescription {
    let search = SearchOperation::Search.as_str();

    NodeDescription {
        display_name: "Serper".to_string(),
        name: "serper".to_string(),
        icon: "file:serper.svg".to_string(),
        group: vec!["transform".to_string()],
        version: 1,
        subtitle: r#"={{$parameter["operation"] + ": " + $parameter["query"]}}"#.to_string(),
        description: "Search the web using Serper API".to_string(),
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: vec![CredentialRequirement {
            name: SerperApiCredentials::NAME.to_string(),
            required: true,
        }],
        properties: vec![
            NodeProperty::new("Operation", "operation", PropertyKind::Options, serde_json::json!(search))
                .with_options(vec![PropertyOption::new("Search", search)
                    .with_description("Perform a web search")
                    .with_action("Search the web")])
                .without_expressions(),
            NodeProperty::new("Query", "query", PropertyKind::String, serde_json::json!(""))
                .with_placeholder("Enter your search query")
                .with_description("The search query to execute")
                .shown_for(search),
            NodeProperty::new("Number of Results", "num", PropertyKind::Number, serde_json::json!(10))
                .with_description("Number of search results to return (1-100)")
                .shown_for(search),
            NodeProperty::new("Country", "gl", PropertyKind::String, serde_json::json!("us"))
                .with_description("Country code for localized results (e.g., us, uk, ca)")
                .shown_for(search),
            NodeProperty::new("Language", "hl", PropertyKind::String, serde_json::json!("en"))
                .with_description("Language code for results (e.g., en, es, fr)")
                .shown_for(search),
            NodeProperty::new("Safe Search", "safe", PropertyKind::Options, serde_json::json!("off"))
                .with_options(vec![
                    PropertyOption::new("Off", "off"),
                    PropertyOption::new("Active", "active"),
                ])
                .with_description("Safe search filter")
                .shown_for(search),
        ],
        usable_as_tool: true,
    }
}

/// Node issuing one authenticated search request per item.
pub struct SerperNode {
    description: NodeDescription,
    credentials: SerperApiCredentials,
    config: SearchConfig,
    client: Arc<dyn HttpClient>,
}

impl SerperNode {
    /// Creates a search node.
    #[must_use]
    pub fn new(config: SearchConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            description: serper_description(),
            credentials: SerperApiCredentials::new(),
            config,
            client,
        }
    }

    /// The credential type used by this node.
    #[must_use]
    pub fn credential_type(&self) -> &SerperApiCredentials {
        &self.credentials
    }

    async fn execute_item(
        &self,
        ctx: &dyn ExecuteFunctions,
        index: usize,
    ) -> Result<ItemOutcome, NodeError> {
        let params = ParameterResolver::new(ctx, index);

        let operation = params.string_or("operation", SearchOperation::Search.as_str())?;
        let query = params.string("query")?;
        if query.is_empty() {
            return Err(ValidationError::new("Query parameter is required")
                .with_parameter("query")
                .into());
        }

        match SearchOperation::parse(&operation)? {
            SearchOperation::Search => {
                let search_parameters = SearchParameters {
                    num: params.integer_or("num", 10)?,
                    gl: params.string_or("gl", "us")?,
                    hl: params.string_or("hl", "en")?,
                    safe: SafeSearch::parse(&params.string_or("safe", "off")?)?,
                };

                let stored = ctx.credentials(SerperApiCredentials::NAME)?;
                let api_key = SerperApiCredentials::api_key(stored.as_ref())?;

                let result = self.search(&query, search_parameters, &api_key).await?;
                let envelope = ResultEnvelope::success(index, SearchOperation::Search.as_str(), &result)?;
                Ok(ItemOutcome::Completed(envelope))
            }
        }
    }

    async fn search(
        &self,
        query: &str,
        search_parameters: SearchParameters,
        api_key: &str,
    ) -> Result<SearchResult, NodeError> {
        let body = search_parameters.to_request(query);
        debug!(
            endpoint = %self.config.endpoint,
            num = body.num,
            gl = %body.gl,
            hl = %body.hl,
            "Sending search request"
        );

        let options = RequestOptions::post(&self.config.endpoint)
            .with_header("Content-Type", "application/json")
            .with_json_body(serde_json::to_value(&body)?)
            .with_timeout(self.config.timeout());
        let options = SerperApiCredentials::authenticate(options, api_key);

        let response = self.client.request(options).await?;
        if !response.is_success() {
            return Err(search_failure(&response).into());
        }

        Ok(SearchResult::from_response(
            query,
            search_parameters,
            &response.json()?,
        ))
    }
}

impl std::fmt::Debug for SerperNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperNode")
            .field("name", &self.description.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Node for SerperNode {
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

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn search_failure(response: &HttpResponse) -> TransportError {
    let message = match serde_json::from_str::<ErrorBody>(&response.body) {
        Ok(body) => format!(
            "Search request failed with status {}: {}",
            response.status_code, body.message
        ),
        Err(_) => format!("Search request failed with status {}", response.status_code),
    };
    TransportError::http_status(response.status_code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticExecutionContext;
    use crate::http::MockHttpClient;
    use crate::testing::{search_context, serper_response};
    use pretty_assertions::assert_eq;

    fn node_with(client: MockHttpClient) -> SerperNode {
        SerperNode::new(SearchConfig::default(), Arc::new(client))
    }

    fn expect_num(expected: i64) -> MockHttpClient {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .withf(move |opts| {
                opts.body.as_ref().and_then(|b| b.get("num")) == Some(&serde_json::json!(expected))
            })
            .times(1)
            .returning(|_| Ok(serper_response()));
        client
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!(SearchOperation::parse("search").unwrap(), SearchOperation::Search);
        let err = SearchOperation::parse("images").unwrap_err();
        assert_eq!(err.message, "Unsupported operation: images");
    }

    #[test]
    fn test_safe_search_parsing() {
        assert_eq!(SafeSearch::parse("off").unwrap(), SafeSearch::Off);
        assert_eq!(SafeSearch::parse("active").unwrap(), SafeSearch::Active);
        assert!(SafeSearch::parse("strict").is_err());
    }

    #[test]
    fn test_clamp_bounds() {
        let params = |num| SearchParameters {
            num,
            gl: "us".to_string(),
            hl: "en".to_string(),
            safe: SafeSearch::Off,
        };

        assert_eq!(params(150).to_request("q").num, 100);
        assert_eq!(params(0).to_request("q").num, 1);
        assert_eq!(params(-3).to_request("q").num, 1);
        assert_eq!(params(5).to_request("q").num, 5);
        assert_eq!(params(100).to_request("q").num, 100);
    }

    #[test]
    fn test_missing_sections_normalize_to_empty() {
        let params = SearchParameters {
            num: 10,
            gl: "us".to_string(),
            hl: "en".to_string(),
            safe: SafeSearch::Off,
        };
        let result = SearchResult::from_response(
            "rust",
            params,
            &serde_json::json!({"organic": [{"title": "x"}], "peopleAlsoAsk": null}),
        );

        assert_eq!(result.organic, serde_json::json!([{"title": "x"}]));
        assert_eq!(result.people_also_ask, serde_json::json!([]));
        assert_eq!(result.related_searches, serde_json::json!([]));
        assert_eq!(result.search_information, serde_json::json!({}));
    }

    #[test]
    fn test_search_failure_message() {
        let err = search_failure(&HttpResponse::new(401, r#"{"message":"Unauthorized."}"#));
        assert_eq!(err.message, "Search request failed with status 401: Unauthorized.");
        assert_eq!(err.status_code, Some(401));

        let err = search_failure(&HttpResponse::new(502, "<html>bad gateway</html>"));
        assert_eq!(err.message, "Search request failed with status 502");
    }

    #[test]
    fn test_description() {
        let desc = serper_description();
        assert_eq!(desc.name, "serper");
        assert!(desc.requires_credential("serperApi"));
        assert_eq!(desc.operations(), vec!["search"]);
        assert_eq!(desc.property("num").unwrap().default, serde_json::json!(10));
        assert!(desc.property("safe").unwrap().accepts("active"));
        assert!(desc.usable_as_tool);
    }

    #[tokio::test]
    async fn test_search_sends_one_authenticated_request() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .withf(|opts| {
                opts.url == "https://google.serper.dev/search"
                    && opts.method == crate::http::HttpMethod::Post
                    && opts.header("X-API-KEY") == Some("test-key")
                    && opts.header("Content-Type") == Some("application/json")
                    && opts.timeout.is_none()
                    && opts.body
                        == Some(serde_json::json!({
                            "q": "rust async",
                            "num": 10,
                            "gl": "us",
                            "hl": "en",
                            "safe": "off"
                        }))
            })
            .times(1)
            .returning(|_| Ok(serper_response()));

        let report = node_with(client)
            .execute(&search_context(&["rust async"]))
            .await
            .unwrap();

        assert_eq!(report.envelopes.len(), 1);
        let env = &report.envelopes[0];
        assert!(env.is_success());
        assert_eq!(env.operation(), Some("search"));
        assert_eq!(env.get("query"), Some(&serde_json::json!("rust async")));
        assert_eq!(
            env.get("searchParameters"),
            Some(&serde_json::json!({"num": 10, "gl": "us", "hl": "en", "safe": "off"}))
        );
        assert_eq!(env.get("organic").and_then(|v| v.as_array()).map(Vec::len), Some(2));
        assert!(env.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_result_count_clamped_in_request_only() {
        for (requested, sent) in [(150, 100), (0, 1), (5, 5)] {
            let ctx = search_context(&["q"]).with_parameter("num", serde_json::json!(requested));
            let report = node_with(expect_num(sent)).execute(&ctx).await.unwrap();

            assert_eq!(
                report.envelopes[0].get("searchParameters").and_then(|p| p.get("num")),
                Some(&serde_json::json!(requested))
            );
        }
    }

    #[tokio::test]
    async fn test_empty_query_sends_nothing() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let err = node_with(client)
            .execute(&search_context(&[""]))
            .await
            .unwrap_err();

        assert_eq!(err.index, 0);
        assert_eq!(err.message(), "Query parameter is required");
        assert!(err.source.is_validation());
        assert!(err.completed.is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let ctx = StaticExecutionContext::with_item_count(1)
            .with_parameter("query", serde_json::json!("rust"));
        let err = node_with(client).execute(&ctx).await.unwrap_err();

        assert_eq!(err.message(), "API key is required");
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_validation_error() {
        let mut client = MockHttpClient::new();
        client.expect_request().never();

        let ctx = search_context(&["rust"])
            .with_parameter("operation", serde_json::json!("news"))
            .with_continue_on_fail(true);
        let report = node_with(client).execute(&ctx).await.unwrap();

        assert_eq!(report.envelopes[0].error(), Some("Unsupported operation: news"));
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(403, r#"{"message":"Invalid API key"}"#)));

        let err = node_with(client)
            .execute(&search_context(&["rust"]))
            .await
            .unwrap_err();

        assert!(err.source.is_transport());
        assert_eq!(
            err.message(),
            "Search request failed with status 403: Invalid API key"
        );
    }

    #[tokio::test]
    async fn test_configured_timeout_is_sent() {
        let mut client = MockHttpClient::new();
        client
            .expect_request()
            .withf(|opts| opts.timeout == Some(std::time::Duration::from_secs(5)))
            .times(1)
            .returning(|_| Ok(serper_response()));

        let node = SerperNode::new(SearchConfig::default().with_timeout(5.0), Arc::new(client));
        assert!(node.execute(&search_context(&["rust"])).await.is_ok());
    }
}
