//! Background task event processing.

use crate::app::{App, AppEvent};
use suprss::identity::Identity;
use suprss::notify::Notification;

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::IdentityLoaded(Ok(identity)) => {
            tracing::debug!(authenticated = identity.is_authenticated(), "Identity loaded");
            if identity == Identity::Anonymous {
                app.selected = 0;
            }
        }
        AppEvent::IdentityLoaded(Err(error)) => {
            app.push_notification(Notification::destructive("Could not load profile", error));
        }
        AppEvent::DeleteSettled { feed_id } => {
            tracing::debug!(feed_id, "Delete settled");
        }
        AppEvent::TaskPanicked { task, error } => {
            app.push_notification(Notification::destructive(
                "Internal error",
                format!("{} failed: {}", task, error),
            ));
        }
    }
    app.refresh_view();
}
