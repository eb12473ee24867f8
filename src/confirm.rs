//! Confirmation gate in front of destructive feed operations.
//!
//! `Idle -> AwaitingConfirmation -> Idle`. The pending target outlives the
//! transition back to `Idle` on confirm: it stays set while the delete is in
//! flight (the dialog shows "Deleting...") and is only dropped when the
//! delete succeeds. After a failed delete the workflow re-arms so confirming
//! again retries.

use crate::api::Feed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    AwaitingConfirmation,
}

/// Result of [`ConfirmationWorkflow::request_delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Dialog opened for the feed.
    Opened,
    /// Dialog was showing another feed; it now shows this one.
    Replaced { previous: Feed },
    /// Dialog already showed this feed.
    Unchanged,
    /// A confirmed delete is still in flight; the request was ignored.
    Busy { deleting: i64 },
}

#[derive(Debug, Clone)]
pub struct ConfirmationWorkflow {
    state: ConfirmState,
    target: Option<Feed>,
}

impl Default for ConfirmationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationWorkflow {
    pub fn new() -> Self {
        Self {
            state: ConfirmState::Idle,
            target: None,
        }
    }

    pub fn state(&self) -> ConfirmState {
        self.state
    }

    /// Feed awaiting (or undergoing) deletion, if the dialog is open.
    pub fn pending_target(&self) -> Option<&Feed> {
        self.target.as_ref()
    }

    /// Whether the confirmation surface should be shown.
    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Ask for confirmation before deleting `feed`.
    ///
    /// A request for a different feed replaces the current target. While a
    /// confirmed delete is in flight every request is ignored, so the target
    /// survives until the delete settles.
    pub fn request_delete(&mut self, feed: Feed) -> RequestOutcome {
        if self.state == ConfirmState::Idle {
            if let Some(current) = &self.target {
                tracing::debug!(
                    deleting = current.id,
                    feed_id = feed.id,
                    "Delete in flight, ignoring request"
                );
                return RequestOutcome::Busy {
                    deleting: current.id,
                };
            }
        }

        let outcome = match self.target.take() {
            Some(current) if current.id == feed.id => RequestOutcome::Unchanged,
            Some(current) => {
                tracing::info!(
                    previous = current.id,
                    feed_id = feed.id,
                    "Replacing pending delete confirmation"
                );
                RequestOutcome::Replaced { previous: current }
            }
            _ => RequestOutcome::Opened,
        };
        self.target = Some(feed);
        self.state = ConfirmState::AwaitingConfirmation;
        outcome
    }

    /// Accept the pending deletion.
    ///
    /// Returns the feed to delete, or `None` when nothing awaits confirmation.
    /// The target is kept until [`settle_success`](Self::settle_success).
    pub fn confirm(&mut self) -> Option<Feed> {
        if self.state != ConfirmState::AwaitingConfirmation {
            return None;
        }
        self.state = ConfirmState::Idle;
        self.target.clone()
    }

    /// Dismiss the dialog without touching the server.
    ///
    /// Ignored unless awaiting confirmation (a delete already in flight
    /// cannot be cancelled).
    pub fn cancel(&mut self) -> bool {
        if self.state != ConfirmState::AwaitingConfirmation {
            return false;
        }
        self.state = ConfirmState::Idle;
        self.target = None;
        true
    }

    /// The delete of `feed_id` was confirmed by the server.
    pub fn settle_success(&mut self, feed_id: i64) {
        if self.target.as_ref().is_some_and(|f| f.id == feed_id) {
            self.target = None;
            self.state = ConfirmState::Idle;
        }
    }

    /// The delete of `feed_id` failed; keep the target and allow retry.
    pub fn settle_failure(&mut self, feed_id: i64) {
        if self.target.as_ref().is_some_and(|f| f.id == feed_id) {
            self.state = ConfirmState::AwaitingConfirmation;
        }
    }
}
