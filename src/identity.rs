//! Who is signed in, as reported by the server.
//!
//! A 401 from the user endpoint is the normal "not signed in" answer, not a
//! session fault: nothing was expected to be authorized yet.

use parking_lot::Mutex;
use reqwest::Method;
use std::sync::Arc;

use crate::api::{paths, ApiError, Transport, User};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// Not asked yet.
    #[default]
    Unknown,
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }
}

/// Current identity, refreshed over the transport.
pub struct IdentityProvider {
    transport: Arc<dyn Transport>,
    current: Mutex<Identity>,
}

impl IdentityProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            current: Mutex::new(Identity::Unknown),
        }
    }

    pub fn current(&self) -> Identity {
        self.current.lock().clone()
    }

    /// Ask the server who we are.
    ///
    /// On error the previous identity is kept.
    pub async fn refresh(&self) -> Result<Identity, ApiError> {
        let identity = match self.transport.send(Method::GET, paths::AUTH_USER).await {
            Ok(response) => Identity::User(response.json::<User>()?),
            Err(e) if e.is_unauthorized() => Identity::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load current user");
                return Err(e);
            }
        };
        tracing::debug!(authenticated = identity.is_authenticated(), "Identity refreshed");
        *self.current.lock() = identity.clone();
        Ok(identity)
    }

    /// Forget the user. Used at logout.
    pub fn clear(&self) {
        *self.current.lock() = Identity::Anonymous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockReply, MockTransport};

    fn provider(mock: &MockTransport) -> IdentityProvider {
        IdentityProvider::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_signed_in_user() {
        let mock = MockTransport::new();
        mock.reply(
            Method::GET,
            paths::AUTH_USER,
            MockReply::Json(serde_json::json!({
                "id": "42",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            })),
        );
        let p = provider(&mock);
        assert_eq!(p.current(), Identity::Unknown);

        let identity = p.refresh().await.unwrap();
        let user = identity.user().unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert!(p.current().is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_means_anonymous() {
        let mock = MockTransport::new();
        mock.reply(
            Method::GET,
            paths::AUTH_USER,
            MockReply::Status {
                status: 401,
                message: Some("Unauthorized".to_string()),
            },
        );
        let p = provider(&mock);
        assert_eq!(p.refresh().await.unwrap(), Identity::Anonymous);
        assert_eq!(p.current(), Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_server_error_keeps_previous_identity() {
        let mock = MockTransport::new();
        mock.reply(
            Method::GET,
            paths::AUTH_USER,
            MockReply::Status {
                status: 500,
                message: None,
            },
        );
        let p = provider(&mock);
        let err = p.refresh().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(p.current(), Identity::Unknown);
    }
}
