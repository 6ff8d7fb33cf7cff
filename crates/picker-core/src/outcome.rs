//! Request descriptors and classified outcomes

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// HTTP method for a request descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Method name as sent on the wire
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to perform one logical upstream call.
///
/// Immutable once built; the fetcher may send it several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    cache_key: Option<String>,
    body: Option<String>,
}

impl RequestDescriptor {
    /// Describe a GET request to `url`
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            cache_key: None,
            body: None,
        }
    }

    /// Describe a POST request to `url` with a body
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::get(url).with_method(Method::Post).with_body(body)
    }

    /// Set method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Append a header, keeping insertion order
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the logical identity used for response caching
    #[must_use]
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Target URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request method
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Headers in insertion order
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether a header with this name (case-insensitive) is set
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Logical cache key, if any
    #[must_use]
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    /// Request body, if any
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Response as received from the transport, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers, names lower-cased
    pub headers: Vec<(String, String)>,
    /// Body text
    pub body: String,
}

impl RawResponse {
    /// Create a response with no headers
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header, lower-casing its name
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }

    /// First value of a header (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is in the 2xx family
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classified result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx response
    Success(RawResponse),
    /// 429 response with the upstream's retry hint, if any
    RateLimited {
        /// Raw `Retry-After` header value
        retry_after: Option<String>,
    },
    /// 5xx response other than those above
    ServerError {
        /// HTTP status code
        status: u16,
    },
    /// Any other non-2xx status
    ClientError {
        /// HTTP status code
        status: u16,
    },
    /// 404 response, a terminal empty result
    NotFound,
    /// The request never produced a response
    TransportFailure {
        /// Transport error description
        message: String,
    },
}

impl Outcome {
    /// Whether the fetcher retries this outcome within its budget
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::TransportFailure { .. }
        )
    }

    /// Whether this outcome feeds the breaker streak
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether this is a success
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Upstream retry hint carried by a rate-limited outcome
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::RateLimited { retry_after } => retry_after.as_deref(),
            _ => None,
        }
    }

    /// Successful response, if any
    #[must_use]
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Success(response) => Some(response),
            _ => None,
        }
    }

    /// Consume into the successful response, if any
    #[must_use]
    pub fn into_response(self) -> Option<RawResponse> {
        match self {
            Self::Success(response) => Some(response),
            _ => None,
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ClientError { .. } => "client_error",
            Self::NotFound => "not_found",
            Self::TransportFailure { .. } => "transport_failure",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(response) => write!(f, "success ({})", response.status),
            Self::RateLimited {
                retry_after: Some(hint),
            } => write!(f, "rate limited (retry after {hint})"),
            Self::RateLimited { retry_after: None } => write!(f, "rate limited"),
            Self::ServerError { status } => write!(f, "server error ({status})"),
            Self::ClientError { status } => write!(f, "client error ({status})"),
            Self::NotFound => write!(f, "not found"),
            Self::TransportFailure { message } => write!(f, "transport failure: {message}"),
        }
    }
}

/// Default classification of one transport result.
///
/// 2xx is success, 429 rate limited, 404 not found, other 5xx a server
/// error. Every other status, including 1xx and 3xx, is a client error.
#[must_use]
pub fn classify_response(result: Result<RawResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            return Outcome::TransportFailure {
                message: err.to_string(),
            }
        }
    };

    match response.status {
        200..=299 => Outcome::Success(response),
        429 => Outcome::RateLimited {
            retry_after: response.header("retry-after").map(str::to_string),
        },
        404 => Outcome::NotFound,
        500..=599 => Outcome::ServerError {
            status: response.status,
        },
        status => Outcome::ClientError { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = RequestDescriptor::get("https://example.com/users/42")
            .with_header("x-api-key", "test")
            .with_header("Accept", "application/json")
            .with_cache_key("user:42");

        assert_eq!(descriptor.url(), "https://example.com/users/42");
        assert_eq!(descriptor.method(), Method::Get);
        assert_eq!(descriptor.headers().len(), 2);
        assert_eq!(descriptor.headers()[0].0, "x-api-key");
        assert!(descriptor.has_header("accept"));
        assert_eq!(descriptor.cache_key(), Some("user:42"));
        assert_eq!(descriptor.body(), None);
    }

    #[test]
    fn test_descriptor_post() {
        let descriptor = RequestDescriptor::post("https://example.com/v1/responses", "{}");
        assert_eq!(descriptor.method(), Method::Post);
        assert_eq!(descriptor.body(), Some("{}"));
        assert_eq!(descriptor.method().to_string(), "POST");
    }

    #[test]
    fn test_response_header_lookup() {
        let response = RawResponse::new(429, "").with_header("Retry-After", "7");
        assert_eq!(response.headers[0].0, "retry-after");
        assert_eq!(response.header("RETRY-AFTER"), Some("7"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_classify_statuses() {
        let classify = |status| classify_response(Ok(RawResponse::new(status, "body")));

        assert!(matches!(classify(200), Outcome::Success(_)));
        assert!(matches!(classify(204), Outcome::Success(_)));
        assert_eq!(classify(404), Outcome::NotFound);
        assert_eq!(classify(500), Outcome::ServerError { status: 500 });
        assert_eq!(classify(503), Outcome::ServerError { status: 503 });
        assert_eq!(classify(400), Outcome::ClientError { status: 400 });
        assert_eq!(classify(403), Outcome::ClientError { status: 403 });
        assert_eq!(classify(302), Outcome::ClientError { status: 302 });
        assert_eq!(classify(101), Outcome::ClientError { status: 101 });
    }

    #[test]
    fn test_classify_rate_limited_keeps_hint() {
        let outcome =
            classify_response(Ok(RawResponse::new(429, "").with_header("Retry-After", "5")));
        assert!(outcome.is_rate_limited());
        assert_eq!(outcome.retry_after(), Some("5"));

        let outcome = classify_response(Ok(RawResponse::new(429, "")));
        assert_eq!(outcome, Outcome::RateLimited { retry_after: None });
    }

    #[test]
    fn test_classify_transport_error() {
        let outcome = classify_response(Err(TransportError::Timeout));
        assert_eq!(
            outcome,
            Outcome::TransportFailure {
                message: "request timed out".to_string()
            }
        );
        assert!(outcome.is_retryable());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(Outcome::RateLimited { retry_after: None }.is_retryable());
        assert!(Outcome::ServerError { status: 502 }.is_retryable());
        assert!(!Outcome::NotFound.is_retryable());
        assert!(!Outcome::ClientError { status: 401 }.is_retryable());
        assert!(!Outcome::Success(RawResponse::new(200, "")).is_retryable());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::NotFound.to_string(), "not found");
        assert_eq!(
            Outcome::RateLimited {
                retry_after: Some("3".to_string())
            }
            .to_string(),
            "rate limited (retry after 3)"
        );
        assert_eq!(
            Outcome::Success(RawResponse::new(201, "")).to_string(),
            "success (201)"
        );
    }
}
