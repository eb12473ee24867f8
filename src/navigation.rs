//! Navigation collaborator: where the user is, and how to leave.
//!
//! In-app routing is not handled here. This only covers reading the current
//! path and the full-page redirect used for login/logout.

use parking_lot::Mutex;
use tokio::sync::watch;
use url::Url;

use crate::util::resolve_on_server;

pub trait Navigator: Send + Sync {
    /// Current in-app path, e.g. `/feeds/3`.
    fn current_path(&self) -> String;

    /// Full navigation away from the application to a server-relative target.
    fn redirect(&self, target: &str);
}

/// Navigator for the terminal front end.
///
/// A redirect opens the target in the system browser (where the server's
/// login flow lives) and publishes it on a watch channel so the UI loop can
/// shut down; the terminal session is no longer authenticated.
pub struct BrowserNavigator {
    base_url: Url,
    path: Mutex<String>,
    left_for: watch::Sender<Option<String>>,
}

impl BrowserNavigator {
    pub fn new(base_url: Url) -> Self {
        let (left_for, _) = watch::channel(None);
        Self {
            base_url,
            path: Mutex::new("/".to_string()),
            left_for,
        }
    }

    /// In-app navigation: only moves the current path.
    pub fn navigate(&self, path: &str) {
        *self.path.lock() = path.to_string();
    }

    /// Receiver that becomes `Some(target)` once a redirect happened.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.left_for.subscribe()
    }
}

impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn redirect(&self, target: &str) {
        match resolve_on_server(&self.base_url, target) {
            Ok(url) => {
                tracing::info!(url = %url, "Leaving application");
                if let Err(e) = open::that(url.as_str()) {
                    tracing::warn!(url = %url, error = %e, "Failed to open browser");
                }
            }
            Err(e) => {
                tracing::error!(target, error = %e, "Refusing redirect");
            }
        }
        self.left_for.send_replace(Some(target.to_string()));
    }
}

/// Navigator that only records redirects. For tests and headless use.
pub struct RecordingNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_path(&self, path: &str) {
        *self.path.lock() = path.to_string();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn redirect(&self, target: &str) {
        self.redirects.lock().push(target.to_string());
    }
}
