//! Keyboard input handling.
//!
//! Dispatch order: global keys, then whichever surface is on top (help,
//! confirmation dialog, landing screen), then the sidebar.

use crate::app::{App, AppEvent};
use crossterm::event::{KeyCode, KeyModifiers};
use suprss::confirm::ConfirmState;
use suprss::notify::Notification;
use tokio::sync::mpsc;

use super::helpers::watch_delete;
use super::loop_runner::Action;

pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.show_help {
        app.show_help = false;
        return Action::Continue;
    }

    if app.view.confirm.is_some() {
        handle_confirm_input(app, code, event_tx);
        return Action::Continue;
    }

    if app.is_landing() {
        return handle_landing_input(app, code);
    }

    handle_sidebar_input(app, code)
}

fn handle_sidebar_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter | KeyCode::Char('l') => app.open_selected(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if !app.request_delete_selected() {
                app.push_notification(Notification::info(
                    "Nothing to delete",
                    "Select a feed to delete it.",
                ));
            }
        }
        KeyCode::Char('r') => {
            app.controller.refresh_all();
            app.push_notification(Notification::info("Refreshing", "Reloading feeds and collections."));
        }
        KeyCode::Char('L') => app.controller.logout(),
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
    Action::Continue
}

fn handle_confirm_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if app.controller.confirm_state() != ConfirmState::AwaitingConfirmation {
                return;
            }
            let feed_id = app.controller.pending_target().map(|f| f.id);
            if let (Some(feed_id), Some(handle)) = (feed_id, app.controller.confirm()) {
                watch_delete(feed_id, handle, event_tx);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            if !app.controller.cancel() {
                tracing::debug!("Cancel ignored, delete already in flight");
            }
        }
        _ => {}
    }
    app.refresh_view();
}

fn handle_landing_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Enter | KeyCode::Char('g') => {
            app.controller.login();
            Action::Continue
        }
        _ => Action::Continue,
    }
}
