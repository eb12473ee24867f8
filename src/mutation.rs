//! Server mutations and their cache side effects.
//!
//! Every mutation claims its target id in the [`InFlightSet`] before the
//! first `.await` and releases it when the request settles, whatever the
//! outcome. A second mutation for an id that is still claimed is rejected
//! on the spot; nothing is queued.
//!
//! Cache invalidation only happens after the server confirmed success.

use parking_lot::Mutex;
use reqwest::Method;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{paths, ApiError, Transport};
use crate::cache::{CacheKey, EntityCache};
use crate::confirm::ConfirmationWorkflow;
use crate::notify::{Notification, NotificationSink};
use crate::session::{Fault, SessionRecovery};

pub const DELETE_SUCCESS_TITLE: &str = "Feed deleted";
pub const DELETE_SUCCESS_DESCRIPTION: &str = "RSS feed has been successfully deleted.";
pub const DELETE_ERROR_TITLE: &str = "Error";
/// Shown when a failed delete carries no server message.
pub const DELETE_FAILED_FALLBACK: &str = "Failed to delete RSS feed. Please try again.";
pub const DELETE_IN_PROGRESS_TITLE: &str = "Delete in progress";

/// Why a mutation did not complete.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Rejected locally; no request was sent.
    #[error("A delete for feed {0} is already in flight")]
    AlreadyInFlight(i64),
    /// Server answered 401; the login redirect has been scheduled.
    #[error("Session expired")]
    SessionExpired(#[source] ApiError),
    /// Any other failure; already reported to the user.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// Ids with a mutating request outstanding.
#[derive(Clone, Default)]
pub struct InFlightSet {
    ids: Arc<Mutex<HashSet<i64>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`; `None` if it is already claimed.
    ///
    /// The claim is released when the returned guard drops.
    pub fn try_acquire(&self, id: i64) -> Option<InFlightGuard> {
        if !self.ids.lock().insert(id) {
            return None;
        }
        Some(InFlightGuard {
            set: self.clone(),
            id,
        })
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.lock().contains(&id)
    }

    pub fn snapshot(&self) -> HashSet<i64> {
        self.ids.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}

/// Releases an [`InFlightSet`] claim on drop, including when the owning
/// future is dropped mid-request.
#[must_use = "the claim is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    set: InFlightSet,
    id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.ids.lock().remove(&self.id);
    }
}

pub struct MutationCoordinator {
    transport: Arc<dyn Transport>,
    cache: EntityCache,
    in_flight: InFlightSet,
    workflow: Arc<Mutex<ConfirmationWorkflow>>,
    recovery: Arc<SessionRecovery>,
    notifier: Arc<dyn NotificationSink>,
}

impl MutationCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: EntityCache,
        workflow: Arc<Mutex<ConfirmationWorkflow>>,
        recovery: Arc<SessionRecovery>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            transport,
            cache,
            in_flight: InFlightSet::new(),
            workflow,
            recovery,
            notifier,
        }
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub fn is_in_flight(&self, feed_id: i64) -> bool {
        self.in_flight.contains(feed_id)
    }

    /// Delete a feed on the server.
    ///
    /// Outcomes are reported through the notification sink; the returned
    /// error is informational and callers are free to drop it.
    pub async fn delete_feed(&self, feed_id: i64) -> Result<(), MutationError> {
        let guard = self.claim(feed_id)?;
        self.execute_delete(feed_id, guard).await
    }

    /// Like [`delete_feed`](Self::delete_feed), but runs in the background.
    ///
    /// The id is claimed before this returns, so the busy state is visible
    /// to the very next render.
    pub fn spawn_delete(
        self: &Arc<Self>,
        feed_id: i64,
    ) -> Result<JoinHandle<Result<(), MutationError>>, MutationError> {
        let guard = self.claim(feed_id)?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            this.execute_delete(feed_id, guard).await
        }))
    }

    fn claim(&self, feed_id: i64) -> Result<InFlightGuard, MutationError> {
        self.in_flight.try_acquire(feed_id).ok_or_else(|| {
            tracing::debug!(feed_id, "Delete already in flight, rejecting duplicate");
            self.notifier.notify(Notification::info(
                DELETE_IN_PROGRESS_TITLE,
                "This feed is already being deleted.",
            ));
            MutationError::AlreadyInFlight(feed_id)
        })
    }

    async fn execute_delete(
        &self,
        feed_id: i64,
        guard: InFlightGuard,
    ) -> Result<(), MutationError> {
        tracing::info!(feed_id, "Deleting feed");
        let path = paths::feed(feed_id);
        let result = self.transport.send(Method::DELETE, &path).await;
        drop(guard);

        match result {
            Ok(_) => {
                tracing::info!(feed_id, "Feed deleted");
                self.cache.invalidate(CacheKey::Feeds);
                self.cache.invalidate(CacheKey::Articles);
                self.workflow.lock().settle_success(feed_id);
                self.recovery.supersede();
                self.notifier.notify(Notification::info(
                    DELETE_SUCCESS_TITLE,
                    DELETE_SUCCESS_DESCRIPTION,
                ));
                Ok(())
            }
            Err(e) => {
                self.workflow.lock().settle_failure(feed_id);
                match self.recovery.handle(&e) {
                    Fault::SessionExpired => Err(MutationError::SessionExpired(e)),
                    Fault::Ordinary => {
                        let message = e
                            .server_message()
                            .unwrap_or(DELETE_FAILED_FALLBACK)
                            .to_string();
                        tracing::error!(feed_id, error = %e, "Failed to delete feed");
                        self.notifier
                            .notify(Notification::destructive(DELETE_ERROR_TITLE, message.clone()));
                        Err(MutationError::Failed { message, source: e })
                    }
                }
            }
        }
    }
}
