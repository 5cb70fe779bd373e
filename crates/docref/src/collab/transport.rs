//! Default HTTP transport
//!
//! A `reqwest`-backed [`Transport`] with configurable timeout and a
//! bounded retry loop. Non-2xx responses are errors; redirects are
//! followed by the client.

use crate::collab::Transport;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Docref/1.0";

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first attempt
const DEFAULT_RETRIES: u32 = 2;

/// Delay between retry attempts
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// HTTP transport for fetching raw documentation HTML
pub struct HttpTransport {
    client: reqwest::Client,
    retries: u32,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Start configuring a transport
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

/// Builder for [`HttpTransport`]
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    retries: Option<u32>,
}

impl HttpTransportBuilder {
    /// Set a custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set how many times a failed request is retried
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<HttpTransport, FetchError> {
        let mut headers = HeaderMap::new();
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html, text/plain, */*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(HttpTransport {
            client,
            retries: self.retries.unwrap_or(DEFAULT_RETRIES),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }

        let mut last_err = FetchError::Request("no attempt made".to_string());
        for attempt in 0..=self.retries {
            if attempt > 0 {
                debug!(url, attempt, "Retrying fetch");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        last_err = FetchError::Status(status.as_u16());
                        // 4xx will not improve on retry
                        if status.is_client_error() {
                            return Err(last_err);
                        }
                        continue;
                    }
                    return response
                        .text()
                        .await
                        .map_err(FetchError::from_reqwest);
                }
                Err(err) => {
                    warn!(url, attempt, error = %err, "Fetch attempt failed");
                    last_err = FetchError::from_reqwest(err);
                }
            }
        }
        Err(last_err)
    }
}
