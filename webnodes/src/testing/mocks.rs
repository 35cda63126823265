//! Mock HTTP clients for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::errors::TransportError;
use crate::http::{HttpClient, HttpResponse, RequestOptions};

/// An HTTP client that replays queued outcomes and records requests.
///
/// Outcomes are consumed in order. A request with nothing queued fails with
/// a [`TransportError`].
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<RequestOptions>>,
}

impl ScriptedHttpClient {
    /// Creates a client with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    #[must_use]
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn with_error(self, error: TransportError) -> Self {
        self.push_error(error);
        self
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.outcomes.lock().push_back(Ok(response));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: TransportError) {
        self.outcomes.lock().push_back(Err(error));
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestOptions> {
        self.requests.lock().clone()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<RequestOptions> {
        self.requests.lock().last().cloned()
    }

    /// Returns the number of outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn request(&self, options: RequestOptions) -> Result<HttpResponse, TransportError> {
        let url = options.url.clone();
        self.requests.lock().push(options);
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new(format!("No scripted response for {url}"))))
    }
}
