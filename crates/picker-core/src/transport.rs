//! Transport seam
//!
//! The fetcher never talks to the network directly. It hands a
//! [`RequestDescriptor`] to a [`Transport`] and classifies what comes back.

use crate::config::HttpConfig;
use crate::error::{Error, Result, TransportError};
use crate::outcome::{classify_response, Method, Outcome, RawResponse, RequestDescriptor};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// One attempt against an upstream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one attempt, without retrying.
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError>;

    /// Classify one attempt's result. Override to map upstream-specific
    /// signals (e.g. a rate-limit error body on a 200) onto outcomes.
    fn classify(&self, result: std::result::Result<RawResponse, TransportError>) -> Outcome {
        classify_response(result)
    }
}

/// HTTP transport over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Build a client from configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(header_map(&config.default_headers)?)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Io(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Io(e.to_string())
            }
        })?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidConfig {
                field: "http.default_headers".to_string(),
                message: format!("{name}: {e}"),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| Error::InvalidConfig {
            field: "http.default_headers".to_string(),
            message: format!("{name}: {e}"),
        })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}
