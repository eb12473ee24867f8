//! Server API surface: the transport seam, its reqwest implementation,
//! a scriptable mock, and the wire types.

mod http;
pub mod mock;
mod transport;
mod types;

pub use http::{HttpTransport, TransportBuildError};
pub use transport::{ApiError, ApiResponse, Transport, TransportFuture, STATUS_UNAUTHORIZED};
pub use types::{Article, Collection, Feed, User};

/// Endpoint paths used by the client.
pub mod paths {
    pub const FEEDS: &str = "/api/feeds";
    pub const COLLECTIONS: &str = "/api/collections";
    pub const ARTICLES: &str = "/api/articles";
    pub const AUTH_USER: &str = "/api/auth/user";
    pub const LOGIN: &str = "/api/login";
    pub const LOGOUT: &str = "/api/logout";

    pub fn feed(id: i64) -> String {
        format!("{}/{}", FEEDS, id)
    }
}
