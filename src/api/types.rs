use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

/// A subscribed feed as returned by `GET /api/feeds`.
///
/// Server-owned. The client only ever holds a cached copy; feeds are
/// never created locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: i64,
    pub title: String,
    /// Source address the server polls.
    pub url: String,
    /// Whether polling/aggregation is enabled upstream.
    pub active: bool,
    /// Unread article count as computed by the server, if it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i64>,
}

/// A named grouping of feeds shared between members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
}

/// Article summary from `GET /api/articles`.
///
/// Cached only so the articles partition can be invalidated when the feed
/// that owns them goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// The signed-in user, from `GET /api/auth/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Error body convention used by the server: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
