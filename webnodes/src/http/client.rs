//! reqwest-backed [`HttpClient`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{StatusCode, Url};
use std::collections::HashMap;
use tracing::debug;

use super::protocols::{HttpClient, HttpMethod, HttpResponse, Redirect, RequestOptions};
use crate::errors::TransportError;

/// HTTP client built on reqwest.
///
/// Redirects are followed here rather than inside reqwest so that every hop
/// can be recorded in [`HttpResponse::redirects`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a client with automatic redirects disabled.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::new(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    ///
    /// The client must be built with `redirect::Policy::none()`, otherwise
    /// redirect hops are not recorded.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send_once(
        &self,
        options: &RequestOptions,
        method: HttpMethod,
        url: Url,
        body: Option<&serde_json::Value>,
        strip_credentials: bool,
    ) -> Result<reqwest::Response, TransportError> {
        let method = match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url);
        for (key, value) in &options.headers {
            if strip_credentials && is_sensitive_header(key) {
                continue;
            }
            builder = builder.header(key, value);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(transport_error)
    }

    async fn follow(&self, options: &RequestOptions) -> Result<HttpResponse, TransportError> {
        let mut url = Url::parse(&options.url)
            .map_err(|e| TransportError::new(format!("Invalid URL '{}': {e}", options.url)))?;
        let mut method = options.method;
        let mut body = options.body.clone();
        let mut redirects = Vec::new();
        // Once a hop leaves the original origin, credentials stay off.
        let mut strip_credentials = false;

        loop {
            let response = self
                .send_once(options, method, url.clone(), body.as_ref(), strip_credentials)
                .await?;
            let status = response.status();

            let location = if options.follow_redirects && status.is_redirection() {
                response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            } else {
                None
            };

            let Some(location) = location else {
                return read_response(response, &url, redirects).await;
            };

            if redirects.len() >= options.max_redirects {
                return Err(TransportError::new(format!(
                    "Exceeded maximum redirects ({}) for {}",
                    options.max_redirects, options.url
                )));
            }

            let next = url.join(&location).map_err(|e| {
                TransportError::new(format!("Invalid redirect location '{location}': {e}"))
            })?;
            debug!(from = %url, to = %next, status = status.as_u16(), "Following redirect");

            redirects.push(Redirect {
                status_code: status.as_u16(),
                redirect_uri: next.to_string(),
            });
            method = redirect_method(status, method);
            if method == HttpMethod::Get {
                body = None;
            }
            strip_credentials |= !same_origin(&url, &next);
            url = next;
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(&self, options: RequestOptions) -> Result<HttpResponse, TransportError> {
        debug!(method = %options.method, url = %options.url, "Sending request");

        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.follow(&options))
                .await
                .map_err(|_| {
                    TransportError::timeout(format!(
                        "Request to {} timed out after {}ms",
                        options.url,
                        limit.as_millis()
                    ))
                })?,
            None => self.follow(&options).await,
        }
    }
}

/// The method used for the request following a redirect response.
fn redirect_method(status: StatusCode, method: HttpMethod) -> HttpMethod {
    match status {
        StatusCode::SEE_OTHER | StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => {
            HttpMethod::Get
        }
        _ => method,
    }
}

/// Headers that carry credentials and must not follow a cross-origin redirect.
fn is_sensitive_header(name: &str) -> bool {
    ["authorization", "proxy-authorization", "cookie", "x-api-key"]
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

async fn read_response(
    response: reqwest::Response,
    url: &Url,
    redirects: Vec<Redirect>,
) -> Result<HttpResponse, TransportError> {
    let status = response.status();
    let headers = collect_headers(response.headers());
    let body = response.text().await.map_err(transport_error)?;

    Ok(HttpResponse {
        status_code: status.as_u16(),
        status_message: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
        final_url: Some(url.to_string()),
        redirects,
    })
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::http_status(status.as_u16(), err.to_string())
    } else {
        TransportError::new(err.to_string())
    }
}
