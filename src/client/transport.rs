//! HTTP transport seam between the client and the generator API

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Status and raw body of an API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, untouched
    pub body: Bytes,
}

impl ApiResponse {
    /// Build a response from a status and body
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends a form-encoded POST and hands back the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `form` to `url`
    async fn post_form(&self, url: &str, form: &[(&'static str, String)]) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport used against the real API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default client settings (no explicit timeout).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("qrgen/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, url: &str, form: &[(&'static str, String)]) -> Result<ApiResponse> {
        let response = self.client.post(url).form(form).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        tracing::debug!(status, bytes = body.len(), "API responded");
        Ok(ApiResponse { status, body })
    }
}
