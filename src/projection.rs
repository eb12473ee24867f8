//! Sidebar view derived from cache snapshots and navigation state.
//!
//! [`project`] is a pure function: same inputs, same view. It does not read
//! the cache itself (that would schedule fetches), so callers take the
//! snapshots first and pass them in.

use std::collections::HashSet;

use crate::api::{Collection, Feed, User};
use crate::cache::Snapshot;
use crate::util::strip_control_chars;

pub const CONFIRM_TITLE: &str = "Delete RSS Feed";
pub const CONFIRM_ACTION: &str = "Delete Feed";
pub const CONFIRM_ACTION_BUSY: &str = "Deleting...";
pub const CONFIRM_CANCEL: &str = "Cancel";

/// Fixed entries at the top of the sidebar.
pub const STATIC_NAV: [(&str, &str); 3] = [
    ("Dashboard", "/"),
    ("All Articles", "/articles"),
    ("Favorites", "/favorites"),
];

pub fn feed_path(id: i64) -> String {
    format!("/feeds/{}", id)
}

pub fn collection_path(id: i64) -> String {
    format!("/collections/{}", id)
}

// ============================================================================
// View Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    pub path: String,
    pub is_active: bool,
}

/// Upstream polling state shown next to a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub id: i64,
    pub title: String,
    pub path: String,
    pub is_active: bool,
    pub indicator: Indicator,
    pub unread_count: i64,
    /// A delete for this feed is on the wire.
    pub is_deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRow {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub is_active: bool,
    pub member_count: i64,
}

/// The delete confirmation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmView {
    pub feed_id: i64,
    pub title: String,
    pub message: String,
    pub action_label: String,
    pub cancel_label: String,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub display_name: String,
    pub email: Option<String>,
    pub initials: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SidebarView {
    pub nav: Vec<NavEntry>,
    pub feeds: Vec<FeedRow>,
    pub collections: Vec<CollectionRow>,
    pub confirm: Option<ConfirmView>,
    pub profile: Option<ProfileView>,
    /// One line per partition whose last fetch failed.
    pub errors: Vec<String>,
    /// Some partition has never loaded and is still fetching.
    pub loading: bool,
}

impl SidebarView {
    /// Path of the active entry, if any entry matches the current location.
    pub fn active_path(&self) -> Option<&str> {
        self.nav
            .iter()
            .map(|e| (e.path.as_str(), e.is_active))
            .chain(self.feeds.iter().map(|r| (r.path.as_str(), r.is_active)))
            .chain(
                self.collections
                    .iter()
                    .map(|r| (r.path.as_str(), r.is_active)),
            )
            .find(|(_, active)| *active)
            .map(|(path, _)| path)
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Everything the sidebar is derived from.
pub struct ProjectionInput<'a> {
    pub path: &'a str,
    pub feeds: &'a Snapshot<Feed>,
    pub collections: &'a Snapshot<Collection>,
    pub in_flight: &'a HashSet<i64>,
    pub pending: Option<&'a Feed>,
    pub user: Option<&'a User>,
}

pub fn project(input: &ProjectionInput<'_>) -> SidebarView {
    let nav = STATIC_NAV
        .iter()
        .map(|(label, path)| NavEntry {
            label: label.to_string(),
            path: path.to_string(),
            is_active: input.path == *path,
        })
        .collect();

    let feeds = input
        .feeds
        .items
        .iter()
        .map(|feed| {
            let path = feed_path(feed.id);
            FeedRow {
                id: feed.id,
                title: strip_control_chars(&feed.title).into_owned(),
                is_active: input.path == path,
                path,
                indicator: if feed.active {
                    Indicator::Active
                } else {
                    Indicator::Inactive
                },
                unread_count: feed.unread_count.unwrap_or(0),
                is_deleting: input.in_flight.contains(&feed.id),
            }
        })
        .collect();

    let collections = input
        .collections
        .items
        .iter()
        .map(|c| {
            let path = collection_path(c.id);
            CollectionRow {
                id: c.id,
                name: strip_control_chars(&c.name).into_owned(),
                is_active: input.path == path,
                path,
                member_count: c.member_count.unwrap_or(0),
            }
        })
        .collect();

    let mut errors = Vec::new();
    if let Some(e) = &input.feeds.error {
        errors.push(strip_control_chars(&format!("Failed to load feeds: {}", e)).into_owned());
    }
    if let Some(e) = &input.collections.error {
        errors.push(strip_control_chars(&format!("Failed to load collections: {}", e)).into_owned());
    }

    let loading = (input.feeds.items.is_empty() && input.feeds.fetching)
        || (input.collections.items.is_empty() && input.collections.fetching);

    SidebarView {
        nav,
        feeds,
        collections,
        confirm: input.pending.map(|f| confirm_view(f, input.in_flight)),
        profile: input.user.map(profile_view),
        errors,
        loading,
    }
}

fn confirm_view(feed: &Feed, in_flight: &HashSet<i64>) -> ConfirmView {
    let busy = in_flight.contains(&feed.id);
    ConfirmView {
        feed_id: feed.id,
        title: CONFIRM_TITLE.to_string(),
        message: format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone and will remove all articles from this feed.",
            strip_control_chars(&feed.title)
        ),
        action_label: if busy {
            CONFIRM_ACTION_BUSY
        } else {
            CONFIRM_ACTION
        }
        .to_string(),
        cancel_label: CONFIRM_CANCEL.to_string(),
        busy,
    }
}

fn profile_view(user: &User) -> ProfileView {
    let first = user.first_name.as_deref().unwrap_or("").trim();
    let last = user.last_name.as_deref().unwrap_or("").trim();

    let display_name = match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{} {}", first, last),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => user.email.clone().unwrap_or_default(),
    };

    let mut initials: String = [first, last]
        .iter()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        initials = user
            .email
            .as_deref()
            .and_then(|e| e.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string());
    }

    ProfileView {
        display_name: strip_control_chars(&display_name).into_owned(),
        email: user.email.as_deref().map(|e| strip_control_chars(e).into_owned()),
        initials,
        avatar_url: user.profile_image_url.clone().filter(|u| !u.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::cache::ReadStatus;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn snapshot<T>(items: Vec<T>) -> Snapshot<T> {
        Snapshot {
            items: Arc::new(items),
            status: ReadStatus::Fresh,
            fetching: false,
            error: None,
        }
    }

    fn feed(id: i64, title: &str, active: bool) -> Feed {
        Feed {
            id,
            title: title.to_string(),
            url: format!("https://example.com/{}/rss", id),
            active,
            unread_count: None,
        }
    }

    fn view(
        path: &str,
        feeds: &Snapshot<Feed>,
        collections: &Snapshot<Collection>,
        in_flight: &HashSet<i64>,
        pending: Option<&Feed>,
    ) -> SidebarView {
        project(&ProjectionInput {
            path,
            feeds,
            collections,
            in_flight,
            pending,
            user: None,
        })
    }

    #[test]
    fn test_feed_rows() {
        let mut f2 = feed(2, "Beta", false);
        f2.unread_count = Some(7);
        let feeds = snapshot(vec![feed(1, "Alpha", true), f2]);
        let collections = snapshot(Vec::new());
        let in_flight = HashSet::from([2]);

        let v = view("/feeds/1", &feeds, &collections, &in_flight, None);
        assert_eq!(
            v.feeds,
            vec![
                FeedRow {
                    id: 1,
                    title: "Alpha".to_string(),
                    path: "/feeds/1".to_string(),
                    is_active: true,
                    indicator: Indicator::Active,
                    unread_count: 0,
                    is_deleting: false,
                },
                FeedRow {
                    id: 2,
                    title: "Beta".to_string(),
                    path: "/feeds/2".to_string(),
                    is_active: false,
                    indicator: Indicator::Inactive,
                    unread_count: 7,
                    is_deleting: true,
                },
            ]
        );
        assert_eq!(v.active_path(), Some("/feeds/1"));
        assert!(v.nav.iter().all(|e| !e.is_active));
    }

    #[test]
    fn test_exact_path_match_only() {
        let feeds = snapshot(vec![feed(1, "A", true), feed(12, "B", true)]);
        let collections = snapshot(Vec::new());
        let none = HashSet::new();

        let v = view("/feeds/12", &feeds, &collections, &none, None);
        assert_eq!(v.active_path(), Some("/feeds/12"));
        assert!(!v.feeds[0].is_active);

        let v = view("/articles", &feeds, &collections, &none, None);
        assert_eq!(v.active_path(), Some("/articles"));
        assert!(!v.nav[0].is_active);

        let v = view("/feeds/1/edit", &feeds, &collections, &none, None);
        assert_eq!(v.active_path(), None);
    }

    #[test]
    fn test_collection_counts_default_to_zero() {
        let feeds = snapshot(Vec::new());
        let collections = snapshot(vec![
            Collection {
                id: 4,
                name: "Team".to_string(),
                member_count: Some(3),
            },
            Collection {
                id: 5,
                name: "Solo".to_string(),
                member_count: None,
            },
        ]);
        let v = view("/collections/5", &feeds, &collections, &HashSet::new(), None);
        assert_eq!(
            v.collections
                .iter()
                .map(|c| (c.member_count, c.is_active))
                .collect::<Vec<_>>(),
            vec![(3, false), (0, true)]
        );
    }

    #[test]
    fn test_confirm_view_labels() {
        let target = feed(1, "Tech News", true);
        let feeds = snapshot(vec![target.clone()]);
        let collections = snapshot(Vec::new());

        let v = view("/", &feeds, &collections, &HashSet::new(), Some(&target));
        let confirm = v.confirm.unwrap();
        assert_eq!(confirm.title, "Delete RSS Feed");
        assert_eq!(
            confirm.message,
            "Are you sure you want to delete \"Tech News\"? This action cannot be undone and will remove all articles from this feed."
        );
        assert_eq!(confirm.action_label, "Delete Feed");
        assert!(!confirm.busy);

        let busy = HashSet::from([1]);
        let v = view("/", &feeds, &collections, &busy, Some(&target));
        let confirm = v.confirm.unwrap();
        assert_eq!(confirm.action_label, "Deleting...");
        assert!(confirm.busy);
    }

    #[test]
    fn test_no_pending_target_no_dialog() {
        let v = view(
            "/",
            &snapshot(Vec::new()),
            &snapshot(Vec::new()),
            &HashSet::new(),
            None,
        );
        assert!(v.confirm.is_none());
        assert!(v.profile.is_none());
    }

    #[test]
    fn test_errors_and_loading() {
        let mut feeds = snapshot(Vec::<Feed>::new());
        feeds.status = ReadStatus::Missing;
        feeds.error = Some(Arc::new(ApiError::from_status(500, b"{\"message\":\"db down\"}")));
        let mut collections = snapshot(Vec::<Collection>::new());
        collections.status = ReadStatus::Missing;
        collections.fetching = true;

        let v = view("/", &feeds, &collections, &HashSet::new(), None);
        assert_eq!(v.errors, vec!["Failed to load feeds: HTTP 500: db down".to_string()]);
        assert!(v.loading);
    }

    #[test]
    fn test_titles_are_sanitized() {
        let feeds = snapshot(vec![feed(1, "Evil\x1b[2JTitle", true)]);
        let v = view("/", &feeds, &snapshot(Vec::new()), &HashSet::new(), None);
        assert_eq!(v.feeds[0].title, "EvilTitle");
    }

    #[test]
    fn test_profile_view() {
        let user = User {
            id: "u1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            profile_image_url: Some(String::new()),
        };
        assert_eq!(
            profile_view(&user),
            ProfileView {
                display_name: "Ada lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                initials: "AL".to_string(),
                avatar_url: None,
            }
        );

        let bare = User {
            id: "u2".to_string(),
            first_name: None,
            last_name: None,
            email: Some("zed@example.com".to_string()),
            profile_image_url: None,
        };
        let p = profile_view(&bare);
        assert_eq!(p.display_name, "zed@example.com");
        assert_eq!(p.initials, "Z");
    }

    #[test]
    fn test_profile_email_is_sanitized() {
        let user = User {
            id: "u3".to_string(),
            first_name: Some("Eve".to_string()),
            last_name: None,
            email: Some("eve\x1b]0;pwned\x07@example.com".to_string()),
            profile_image_url: None,
        };
        let p = profile_view(&user);
        assert_eq!(p.email.as_deref(), Some("eve@example.com"));
    }
}
