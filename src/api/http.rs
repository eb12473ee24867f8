use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::redirect::Policy;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::transport::{ApiError, ApiResponse, Transport, TransportFuture};

/// Errors raised while constructing an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum TransportBuildError {
    #[error("Session cookie contains characters not allowed in an HTTP header")]
    InvalidCookie,
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// reqwest-backed [`Transport`] talking to a SUPRSS server.
///
/// Authentication rides on the server's session cookie. The cookie value is
/// marked sensitive so it never shows up in reqwest's debug output.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(
        base_url: Url,
        session_cookie: Option<&SecretString>,
        timeout: Duration,
    ) -> Result<Self, TransportBuildError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = session_cookie {
            let mut value = HeaderValue::from_str(cookie.expose_secret())
                .map_err(|_| TransportBuildError::InvalidCookie)?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        // API endpoints answer directly; a redirect means the server is
        // bouncing us to its login flow, which the caller must see as-is.
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .default_headers(headers)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    async fn execute(&self, method: Method, path: &str) -> Result<ApiResponse, ApiError> {
        let url = self.base_url.join(path)?;
        tracing::debug!(method = %method, url = %url, "Sending request");

        let response = self
            .client
            .request(method.clone(), url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        if !(200..300).contains(&status) {
            let err = ApiError::from_status(status, &body);
            tracing::debug!(method = %method, path, status, error = %err, "Request rejected");
            return Err(err);
        }

        Ok(ApiResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e)
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, method: Method, path: &'a str) -> TransportFuture<'a> {
        Box::pin(self.execute(method, path))
    }
}
