// HTTP execution layer shared by every provider adapter

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = "Colloquy/1.0";

/// Uniform result of one HTTP exchange.
///
/// `status_code` is `0` when no response was received at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub success: bool,
    pub error_message: String,
}

impl HttpResponse {
    pub fn ok(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(status_code: u16, error_message: impl Into<String>) -> Self {
        Self {
            status_code,
            success: false,
            error_message: error_message.into(),
            ..Self::default()
        }
    }
}

/// Provider-unaware request executor. Failures are reported in the
/// returned value, never as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: &str, headers: &HashMap<String, String>) -> HttpResponse;

    async fn get(&self, url: &str, headers: &HashMap<String, String>) -> HttpResponse;
}

/// reqwest-backed transport (no retries)
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl ReqwestTransport {
    /// Transport with the default timeout and user agent
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn execute(
        &self,
        mut request: reqwest::RequestBuilder,
        headers: &HashMap<String, String>,
    ) -> HttpResponse {
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("Request timed out: {}", e)
                } else {
                    format!("Request failed: {}", e)
                };
                tracing::debug!(error = %e, "HTTP request failed before a response arrived");
                return HttpResponse::failed(0, message);
            }
        };

        let status = response.status();
        let response_headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return HttpResponse {
                    headers: response_headers,
                    ..HttpResponse::failed(status.as_u16(), format!("Failed to read response body: {}", e))
                };
            }
        };

        let success = status.is_success();
        HttpResponse {
            status_code: status.as_u16(),
            body,
            headers: response_headers,
            success,
            error_message: if success {
                String::new()
            } else {
                format!("HTTP {}", status.as_u16())
            },
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, url: &str, body: &str, headers: &HashMap<String, String>) -> HttpResponse {
        let request = self.http_client.post(url).body(body.to_string());
        self.execute(request, headers).await
    }

    async fn get(&self, url: &str, headers: &HashMap<String, String>) -> HttpResponse {
        let request = self.http_client.get(url);
        self.execute(request, headers).await
    }
}

pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(ReqwestTransport {
            http_client,
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}
