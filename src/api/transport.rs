use futures::future::BoxFuture;
use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::ErrorBody;

/// HTTP status the server uses for an expired or missing session.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Errors surfaced by a [`Transport`].
///
/// Non-2xx responses always arrive as [`ApiError::Status`] so callers can
/// tell an authorization failure apart from everything else.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server answered with a non-success status code
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request failed"))]
    Status { status: u16, message: Option<String> },
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the JSON shape we expected
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Request path could not be joined onto the base URL
    #[error("Invalid request path: {0}")]
    InvalidPath(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }

    /// Human-readable message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Build a status error from a raw response body.
    ///
    /// Prefers the `message` field of a JSON body; falls back to the trimmed
    /// body text; `None` when the body is empty.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            });
        ApiError::Status { status, message }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> = BoxFuture<'a, Result<ApiResponse, ApiError>>;

/// The channel used to reach the server.
///
/// Implementations must map HTTP 401 to `ApiError::Status { status: 401, .. }`.
/// Any retry policy lives inside the implementation; callers never retry.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, method: Method, path: &'a str) -> TransportFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_prefers_json_message() {
        let err = ApiError::from_status(500, br#"{"message":"Failed to delete feed"}"#);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.server_message(), Some("Failed to delete feed"));
        assert_eq!(err.to_string(), "HTTP 500: Failed to delete feed");
    }

    #[test]
    fn test_from_status_plain_text_body() {
        let err = ApiError::from_status(502, b"  Bad Gateway \n");
        assert_eq!(err.server_message(), Some("Bad Gateway"));
    }

    #[test]
    fn test_from_status_empty_body_has_no_message() {
        let err = ApiError::from_status(500, b"");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.to_string(), "HTTP 500: request failed");
    }

    #[test]
    fn test_json_without_message_falls_back_to_text() {
        let err = ApiError::from_status(400, br#"{"error":"nope"}"#);
        assert_eq!(err.server_message(), Some(r#"{"error":"nope"}"#));
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::from_status(401, br#"{"message":"Unauthorized"}"#).is_unauthorized());
        assert!(!ApiError::from_status(403, b"").is_unauthorized());
        assert!(!ApiError::Timeout.is_unauthorized());
    }

    #[test]
    fn test_empty_message_is_treated_as_absent() {
        let err = ApiError::Status {
            status: 500,
            message: Some(String::new()),
        };
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_response_json_decode_error() {
        let resp = ApiResponse {
            status: 200,
            body: b"not json".to_vec(),
        };
        let result: Result<Vec<i64>, _> = resp.json();
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
