//! Toast-style notifications emitted by the core.
//!
//! The core never waits on a notification: sinks are fire-and-forget.

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }
}

/// Receives notifications. Must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications over a bounded channel to the UI loop.
///
/// A full or closed channel drops the notification with a warning.
pub struct ChannelSink {
    tx: mpsc::Sender<Notification>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, severity = ?notification.severity, "Notification");
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!(error = %e, "Notification channel send failed, dropping");
        }
    }
}

/// Keeps every notification in memory. Used by tests and headless runs.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn with_title(&self, title: &str) -> Vec<Notification> {
        self.seen
            .lock()
            .iter()
            .filter(|n| n.title == title)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
