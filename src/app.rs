use std::sync::Arc;
use std::time::Duration;
use suprss::identity::Identity;
use suprss::navigation::{BrowserNavigator, Navigator};
use suprss::notify::Notification;
use suprss::projection::SidebarView;
use suprss::FeedController;
use tokio::time::Instant;

// ============================================================================
// Event Types
// ============================================================================

/// Results of background tasks, delivered to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    IdentityLoaded(Result<Identity, String>),
    /// A delete task finished; its outcome was already notified.
    DeleteSettled { feed_id: i64 },
    TaskPanicked { task: &'static str, error: String },
}

/// One selectable line of the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    /// Set for feed rows, the only deletable entries.
    pub feed_id: Option<i64>,
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub controller: Arc<FeedController>,
    pub navigator: Arc<BrowserNavigator>,
    /// Last projection; rebuilt by [`refresh_view`](Self::refresh_view).
    pub view: SidebarView,
    pub identity: Identity,
    /// Index into [`entries`](Self::entries).
    pub selected: usize,
    pub toast: Option<(Notification, Instant)>,
    toast_ttl: Duration,
    pub show_help: bool,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        controller: Arc<FeedController>,
        navigator: Arc<BrowserNavigator>,
        toast_ttl: Duration,
    ) -> Self {
        let mut app = Self {
            controller,
            navigator,
            view: SidebarView::default(),
            identity: Identity::Unknown,
            selected: 0,
            toast: None,
            toast_ttl,
            show_help: false,
            needs_redraw: true,
        };
        app.refresh_view();
        app
    }

    /// Re-project the sidebar from the controller's current state.
    pub fn refresh_view(&mut self) {
        self.view = self.controller.current_sidebar();
        self.identity = self.controller.identity();
        self.clamp_selection();
    }

    /// Server said nobody is signed in; show the landing screen.
    pub fn is_landing(&self) -> bool {
        self.identity == Identity::Anonymous
    }

    pub fn entries(&self) -> Vec<Entry> {
        let nav = self.view.nav.iter().map(|e| Entry {
            path: e.path.clone(),
            feed_id: None,
        });
        let feeds = self.view.feeds.iter().map(|r| Entry {
            path: r.path.clone(),
            feed_id: Some(r.id),
        });
        let collections = self.view.collections.iter().map(|r| Entry {
            path: r.path.clone(),
            feed_id: None,
        });
        nav.chain(feeds).chain(collections).collect()
    }

    pub fn selected_entry(&self) -> Option<Entry> {
        self.entries().into_iter().nth(self.selected)
    }

    pub fn clamp_selection(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn nav_down(&mut self) {
        let max_index = self.entries().len().saturating_sub(1);
        self.selected = self.selected.saturating_add(1).min(max_index);
    }

    /// Move the in-app location to the selected entry.
    pub fn open_selected(&mut self) {
        if let Some(entry) = self.selected_entry() {
            tracing::debug!(path = %entry.path, "Navigating");
            self.navigator.navigate(&entry.path);
            self.refresh_view();
        }
    }

    /// Open the delete confirmation for the selected feed.
    ///
    /// Returns false when the selection is not a feed.
    pub fn request_delete_selected(&mut self) -> bool {
        let Some(feed_id) = self.selected_entry().and_then(|e| e.feed_id) else {
            return false;
        };
        let feeds = self.controller.feeds();
        let Some(feed) = feeds.items.iter().find(|f| f.id == feed_id) else {
            return false;
        };
        self.controller.request_delete(feed.clone());
        self.refresh_view();
        true
    }

    pub fn push_notification(&mut self, notification: Notification) {
        self.toast = Some((notification, Instant::now()));
    }

    /// Drop the toast once it outlived its TTL. Returns true if one was cleared.
    pub fn clear_expired_toast(&mut self) -> bool {
        if let Some((_, shown_at)) = &self.toast {
            if shown_at.elapsed() >= self.toast_ttl {
                self.toast = None;
                return true;
            }
        }
        false
    }

    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use suprss::api::mock::MockTransport;
    use suprss::api::{paths, Feed};
    use suprss::notify::RecordingSink;
    use suprss::ControllerOptions;
    use tokio::time;
    use url::Url;

    fn feed(id: i64, title: &str) -> Feed {
        Feed {
            id,
            title: title.to_string(),
            url: format!("https://example.com/{}/rss", id),
            active: id % 2 == 1,
            unread_count: None,
        }
    }

    async fn test_app() -> App {
        let mock = MockTransport::new();
        mock.reply_json(Method::GET, paths::FEEDS, &vec![feed(1, "A"), feed(2, "B")]);
        mock.reply_json(Method::GET, paths::COLLECTIONS, &Vec::<Feed>::new());
        let navigator = Arc::new(BrowserNavigator::new(
            Url::parse("http://localhost:5000").unwrap(),
        ));
        let controller = Arc::new(FeedController::new(
            Arc::new(mock),
            Arc::new(RecordingSink::new()),
            navigator.clone(),
            ControllerOptions::default(),
        ));
        let mut app = App::new(controller, navigator, Duration::from_secs(4));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        app.refresh_view();
        app
    }

    #[tokio::test]
    async fn test_entries_cover_nav_and_feeds() {
        let app = test_app().await;
        let entries = app.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].path, "/");
        assert_eq!(entries[3].feed_id, Some(1));
    }

    #[tokio::test]
    async fn test_nav_clamps_at_ends() {
        let mut app = test_app().await;
        app.nav_up();
        assert_eq!(app.selected, 0);
        for _ in 0..20 {
            app.nav_down();
        }
        assert_eq!(app.selected, 4);
    }

    #[tokio::test]
    async fn test_open_selected_moves_active_entry() {
        let mut app = test_app().await;
        app.selected = 4;
        app.open_selected();
        assert_eq!(app.current_path(), "/feeds/2");
        assert_eq!(app.view.active_path(), Some("/feeds/2"));
    }

    #[tokio::test]
    async fn test_delete_only_for_feed_rows() {
        let mut app = test_app().await;
        app.selected = 1;
        assert!(!app.request_delete_selected());
        assert!(app.view.confirm.is_none());

        app.selected = 3;
        assert!(app.request_delete_selected());
        let dialog = app.view.confirm.as_ref().unwrap();
        assert_eq!(dialog.feed_id, 1);
        assert_eq!(dialog.action_label, "Delete Feed");
    }

    #[tokio::test]
    async fn test_toast_expires_after_ttl() {
        let mut app = test_app().await;
        time::pause();
        app.push_notification(Notification::info("Feed deleted", "gone"));

        time::advance(Duration::from_millis(3999)).await;
        assert!(!app.clear_expired_toast());
        assert!(app.toast.is_some());

        time::advance(Duration::from_millis(2)).await;
        assert!(app.clear_expired_toast());
        assert!(app.toast.is_none());
    }
}
