//! Session-fault detection and recovery.
//!
//! A 401 from the server means the login session is gone. Recovery tells the
//! user, then after a short delay navigates to the login entry point. The
//! delay only gives the notification time to render; the redirect runs as a
//! cancellable background task so nothing else waits on it.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{paths, ApiError};
use crate::navigation::Navigator;
use crate::notify::{Notification, NotificationSink};

/// Delay between the "Unauthorized" notification and the login redirect.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(500);

pub const UNAUTHORIZED_TITLE: &str = "Unauthorized";
pub const UNAUTHORIZED_DESCRIPTION: &str = "You are logged out. Logging in again...";

/// Classification of a failed server operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    SessionExpired,
    Ordinary,
}

/// Pure classification: only an explicit 401 counts as an expired session.
pub fn classify(err: &ApiError) -> Fault {
    if err.is_unauthorized() {
        Fault::SessionExpired
    } else {
        Fault::Ordinary
    }
}

/// Runs the redirect-to-login flow for session faults.
pub struct SessionRecovery {
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRecovery {
    pub fn new(
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        delay: Duration,
    ) -> Self {
        Self {
            notifier,
            navigator,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Classify `err` and start recovery if the session expired.
    ///
    /// Ordinary faults are left to the caller. Must be called from within a
    /// tokio runtime.
    pub fn handle(&self, err: &ApiError) -> Fault {
        let fault = classify(err);
        if fault == Fault::SessionExpired {
            self.begin();
        }
        fault
    }

    fn begin(&self) {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("Login redirect already scheduled");
            return;
        }

        tracing::warn!(delay_ms = self.delay.as_millis() as u64, "Session expired, redirecting to login");
        self.notifier.notify(Notification::destructive(
            UNAUTHORIZED_TITLE,
            UNAUTHORIZED_DESCRIPTION,
        ));

        let navigator = Arc::clone(&self.navigator);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.redirect(paths::LOGIN);
        }));
    }

    /// Cancel a scheduled redirect because a later operation succeeded.
    ///
    /// Returns true if a redirect was actually cancelled.
    pub fn supersede(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                tracing::info!("Login redirect superseded by successful request");
                true
            }
            _ => false,
        }
    }
}

impl Drop for SessionRecovery {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::notify::{RecordingSink, Severity};

    fn unauthorized() -> ApiError {
        ApiError::Status {
            status: 401,
            message: Some("Unauthorized".to_string()),
        }
    }

    fn setup() -> (SessionRecovery, Arc<RecordingSink>, Arc<RecordingNavigator>) {
        let sink = Arc::new(RecordingSink::new());
        let nav = Arc::new(RecordingNavigator::new("/"));
        let recovery = SessionRecovery::new(sink.clone(), nav.clone(), DEFAULT_REDIRECT_DELAY);
        (recovery, sink, nav)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&unauthorized()), Fault::SessionExpired);
        assert_eq!(
            classify(&ApiError::from_status(500, b"")),
            Fault::Ordinary
        );
        assert_eq!(classify(&ApiError::from_status(403, b"")), Fault::Ordinary);
        assert_eq!(classify(&ApiError::Timeout), Fault::Ordinary);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirect_after_delay_not_before() {
        let (recovery, sink, nav) = setup();

        assert_eq!(recovery.handle(&unauthorized()), Fault::SessionExpired);
        let notes = sink.all();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, UNAUTHORIZED_TITLE);
        assert_eq!(notes[0].severity, Severity::Destructive);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(nav.redirects().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(nav.redirects(), vec!["/api/login".to_string()]);
        assert!(!recovery.supersede());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordinary_fault_does_nothing() {
        let (recovery, sink, nav) = setup();
        assert_eq!(
            recovery.handle(&ApiError::from_status(500, b"boom")),
            Fault::Ordinary
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.is_empty());
        assert!(nav.redirects().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_401_while_pending_is_absorbed() {
        let (recovery, sink, nav) = setup();
        recovery.handle(&unauthorized());
        recovery.handle(&unauthorized());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.len(), 1);
        assert_eq!(nav.redirects().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_cancels_redirect() {
        let (recovery, _sink, nav) = setup();
        recovery.handle(&unauthorized());
        assert!(recovery.supersede());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(nav.redirects().is_empty());
        assert!(!recovery.supersede());
    }
}
