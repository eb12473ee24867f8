use thiserror::Error;
use url::Url;

/// Errors from validating the configured server address or a navigation target.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("Navigation target must stay on the server: {0}")]
    OffServer(String),
}

/// Parse and check the server base URL.
///
/// Unlike feed URLs, localhost and private addresses are fine here: the
/// server is typically self-hosted.
pub fn parse_server_url(raw: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

/// Resolve a server-relative navigation target to an absolute URL.
///
/// SEC: the result is handed to the system opener, so it must be an
/// http(s) URL on the same origin as `base`.
pub fn resolve_on_server(base: &Url, target: &str) -> Result<Url, UrlValidationError> {
    let url = base.join(target)?;
    if url.origin() != base.origin() {
        return Err(UrlValidationError::OffServer(url.to_string()));
    }
    Ok(url)
}
