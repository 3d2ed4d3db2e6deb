use crate::error::{Result, TwinklyError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Proxy};
use std::time::Duration;
use url::Url;

pub const AUTH_HEADER: &str = "X-Auth-Token";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single POST to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    pub url: Url,
    /// Sent as `X-Auth-Token` when present.
    pub auth_token: Option<String>,
    pub content_type: &'static str,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    pub status: u16,
    pub body: Bytes,
}

impl DeviceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Carries requests to the device.
///
/// Implementations report a `Network` error only when no HTTP response was
/// obtained. Every status code, success or not, comes back as a response.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Outbound HTTP proxy, e.g. `http://127.0.0.1:8888` for traffic inspection.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// `reqwest`-backed transport used against real devices.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        // Devices sit on the local network; environment proxies are ignored
        // unless one is configured explicitly.
        builder = match config.proxy.as_deref() {
            None => builder.no_proxy(),
            Some(proxy) => {
                let invalid = |err: &dyn std::fmt::Display| {
                    TwinklyError::Config(format!("invalid proxy '{proxy}': {err}"))
                };
                let proxy_url = Url::parse(proxy).map_err(|err| invalid(&err))?;
                builder.proxy(Proxy::all(proxy_url).map_err(|err| invalid(&err))?)
            }
        };
        let client = builder
            .build()
            .map_err(|err| TwinklyError::Config(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse> {
        let DeviceRequest {
            url,
            auth_token,
            content_type,
            body,
        } = request;

        tracing::debug!(
            target: "twinkly::transport",
            url = %url,
            content_type,
            bytes = body.len(),
            "POST"
        );

        let mut builder = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        if let Some(token) = auth_token {
            builder = builder.header(AUTH_HEADER, token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(DeviceResponse { status, body })
    }
}
