//! The surface presentation code talks to.
//!
//! [`FeedController`] owns one instance of each core component and wires
//! them together. Nothing here blocks; deletes and fetches run as tasks.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{paths, ApiError, Collection, Feed, Transport};
use crate::cache::{CacheKey, EntityCache, Snapshot};
use crate::confirm::{ConfirmState, ConfirmationWorkflow, RequestOutcome};
use crate::identity::{Identity, IdentityProvider};
use crate::mutation::{MutationCoordinator, MutationError};
use crate::navigation::Navigator;
use crate::notify::NotificationSink;
use crate::projection::{project, ProjectionInput, SidebarView};
use crate::session::{SessionRecovery, DEFAULT_REDIRECT_DELAY};

/// Tunables for [`FeedController::new`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub redirect_delay: Duration,
    /// Cached lists older than this are refetched on read.
    pub stale_after: Option<Duration>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            stale_after: None,
        }
    }
}

pub struct FeedController {
    cache: EntityCache,
    workflow: Arc<Mutex<ConfirmationWorkflow>>,
    coordinator: Arc<MutationCoordinator>,
    recovery: Arc<SessionRecovery>,
    identity: IdentityProvider,
    navigator: Arc<dyn Navigator>,
}

impl FeedController {
    /// Must be called from within a tokio runtime.
    pub fn new(
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        options: ControllerOptions,
    ) -> Self {
        let cache = EntityCache::new(Arc::clone(&transport), options.stale_after);
        let workflow = Arc::new(Mutex::new(ConfirmationWorkflow::new()));
        let recovery = Arc::new(SessionRecovery::new(
            Arc::clone(&notifier),
            Arc::clone(&navigator),
            options.redirect_delay,
        ));
        let coordinator = Arc::new(MutationCoordinator::new(
            Arc::clone(&transport),
            cache.clone(),
            Arc::clone(&workflow),
            Arc::clone(&recovery),
            notifier,
        ));
        Self {
            cache,
            workflow,
            coordinator,
            recovery,
            identity: IdentityProvider::new(transport),
            navigator,
        }
    }

    // ------------------------------------------------------------------------
    // Delete workflow
    // ------------------------------------------------------------------------

    /// Open the delete confirmation for `feed`.
    pub fn request_delete(&self, feed: Feed) -> RequestOutcome {
        tracing::debug!(feed_id = feed.id, "Delete requested");
        self.workflow.lock().request_delete(feed)
    }

    /// Confirm the pending delete and dispatch it.
    ///
    /// Returns the delete task, or `None` if nothing awaited confirmation or
    /// the feed was already being deleted.
    pub fn confirm(&self) -> Option<JoinHandle<Result<(), MutationError>>> {
        let feed = self.workflow.lock().confirm()?;
        match self.coordinator.spawn_delete(feed.id) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::debug!(feed_id = feed.id, error = %e, "Delete not dispatched");
                None
            }
        }
    }

    /// Dismiss the confirmation. Returns false if there was nothing to
    /// cancel or the delete is already on the wire.
    pub fn cancel(&self) -> bool {
        self.workflow.lock().cancel()
    }

    pub fn confirm_state(&self) -> ConfirmState {
        self.workflow.lock().state()
    }

    pub fn pending_target(&self) -> Option<Feed> {
        self.workflow.lock().pending_target().cloned()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn feeds(&self) -> Snapshot<Feed> {
        self.cache.feeds()
    }

    pub fn collections(&self) -> Snapshot<Collection> {
        self.cache.collections()
    }

    /// Ids with a delete on the wire.
    pub fn busy_set(&self) -> HashSet<i64> {
        self.coordinator.in_flight().snapshot()
    }

    pub fn identity(&self) -> Identity {
        self.identity.current()
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Bumped whenever cached data or fetch status changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }

    /// Sidebar for the given location.
    pub fn sidebar(&self, path: &str) -> SidebarView {
        let feeds = self.cache.feeds();
        let collections = self.cache.collections();
        let in_flight = self.busy_set();
        let pending = self.pending_target();
        let identity = self.identity.current();

        project(&ProjectionInput {
            path,
            feeds: &feeds,
            collections: &collections,
            in_flight: &in_flight,
            pending: pending.as_ref(),
            user: identity.user(),
        })
    }

    /// Sidebar for wherever the navigator says we are.
    pub fn current_sidebar(&self) -> SidebarView {
        self.sidebar(&self.navigator.current_path())
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Force a refetch of every partition.
    pub fn refresh_all(&self) {
        tracing::info!("Refreshing all partitions");
        for key in CacheKey::ALL {
            self.cache.refresh(key);
        }
    }

    /// Ask the server who is signed in.
    pub async fn load_identity(&self) -> Result<Identity, ApiError> {
        self.identity.refresh().await
    }

    /// Leave for the server's login flow.
    pub fn login(&self) {
        self.navigator.redirect(paths::LOGIN);
    }

    /// Drop all cached state and leave for the server's logout endpoint.
    pub fn logout(&self) {
        tracing::info!("Logging out");
        self.recovery.supersede();
        self.cache.clear();
        self.identity.clear();
        *self.workflow.lock() = ConfirmationWorkflow::new();
        self.navigator.redirect(paths::LOGOUT);
    }
}
