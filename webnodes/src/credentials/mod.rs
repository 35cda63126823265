//! Credential types.
//!
//! A credential type declares the fields it stores, how those fields
//! authenticate a request, and a request that checks they work.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::CredentialData;
use crate::errors::{NodeError, ValidationError};
use crate::http::{HttpClient, HttpMethod, RequestOptions};

/// A field stored in a credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProperty {
    /// Human-readable label.
    pub display_name: String,
    /// Field name in the stored record.
    pub name: String,
    /// Whether the value is masked in the host UI.
    pub password: bool,
    /// Default value.
    pub default: String,
    /// Help text.
    pub description: String,
}

/// Request used to check that stored credentials work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTestRequest {
    /// Base URL of the API.
    pub base_url: String,
    /// Path appended to the base URL.
    pub url: String,
    /// Request method.
    pub method: HttpMethod,
    /// JSON body.
    pub body: serde_json::Value,
}

impl CredentialTestRequest {
    /// The full URL.
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.url)
    }
}

/// Outcome of a credential test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTestResult {
    /// Whether the credentials were accepted.
    pub ok: bool,
    /// Explanation.
    pub message: String,
}

/// Credentials for the Serper search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerperApiCredentials {
    /// Credential type name.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Where to get a key.
    pub documentation_url: String,
    /// Stored fields.
    pub properties: Vec<CredentialProperty>,
    /// Check request.
    pub test: CredentialTestRequest,
}

impl SerperApiCredentials {
    /// Credential type name.
    pub const NAME: &'static str = "serperApi";
    /// Field holding the key.
    pub const API_KEY_FIELD: &'static str = "apiKey";
    /// Header the key is sent in.
    pub const AUTH_HEADER: &'static str = "X-API-KEY";

    /// Creates the credential type definition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Self::NAME.to_string(),
            display_name: "Serper API".to_string(),
            documentation_url: "https://serper.dev/docs".to_string(),
            properties: vec![CredentialProperty {
                display_name: "API Key".to_string(),
                name: Self::API_KEY_FIELD.to_string(),
                password: true,
                default: String::new(),
                description: "Your Serper API key. Get it from https://serper.dev/".to_string(),
            }],
            test: CredentialTestRequest {
                base_url: "https://google.serper.dev".to_string(),
                url: "/search".to_string(),
                method: HttpMethod::Post,
                body: serde_json::json!({"q": "test", "num": 1}),
            },
        }
    }

    /// Extracts a non-empty API key from a stored record.
    pub fn api_key(data: Option<&CredentialData>) -> Result<String, ValidationError> {
        data.and_then(|d| d.get(Self::API_KEY_FIELD))
            .and_then(serde_json::Value::as_str)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ValidationError::new("API key is required").with_parameter(Self::API_KEY_FIELD))
    }

    /// Adds the authentication header to a request.
    #[must_use]
    pub fn authenticate(options: RequestOptions, api_key: &str) -> RequestOptions {
        options.with_header(Self::AUTH_HEADER, api_key)
    }

    /// Sends the check request with the given record.
    ///
    /// A missing key or a rejected request is a failed test; only a failure
    /// to reach the API is an error.
    pub async fn test(
        &self,
        client: &dyn HttpClient,
        data: Option<&CredentialData>,
    ) -> Result<CredentialTestResult, NodeError> {
        let api_key = match Self::api_key(data) {
            Ok(key) => key,
            Err(err) => {
                return Ok(CredentialTestResult {
                    ok: false,
                    message: err.message,
                })
            }
        };

        let options = RequestOptions::new(self.test.method, self.test.full_url())
            .with_header("Content-Type", "application/json")
            .with_json_body(self.test.body.clone());
        let options = Self::authenticate(options, &api_key);

        debug!(url = %options.url, "Testing credentials");
        let response = client.request(options).await?;

        if response.is_success() {
            Ok(CredentialTestResult {
                ok: true,
                message: "Connection successful".to_string(),
            })
        } else {
            Ok(CredentialTestResult {
                ok: false,
                message: format!("Credential test failed with status {}", response.status_code),
            })
        }
    }
}

impl Default for SerperApiCredentials {
    fn default() -> Self {
        Self::new()
    }
}
