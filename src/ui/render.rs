//! Render functions for the TUI.
//!
//! Everything drawn here comes from the projected [`SidebarView`]; the UI
//! never derives state of its own.
//!
//! [`SidebarView`]: suprss::projection::SidebarView

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use suprss::projection::ConfirmView;

use super::{help, sidebar, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

const SIDEBAR_WIDTH: u16 = 34;

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    if app.is_landing() {
        render_landing(f, rows[0]);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(rows[0]);
        sidebar::render(f, app, columns[0]);
        render_main(f, app, columns[1]);
    }
    status::render(f, app, rows[1]);

    if app.show_help {
        help::render(f);
    }

    if let Some(confirm) = &app.view.confirm {
        render_confirm_overlay(f, confirm);
    }
}

/// Right-hand panel: where we are, plus fetch problems.
fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let path = app.current_path();
    let heading = app
        .view
        .nav
        .iter()
        .find(|e| e.is_active)
        .map(|e| e.label.clone())
        .or_else(|| {
            app.view
                .feeds
                .iter()
                .find(|r| r.is_active)
                .map(|r| r.title.clone())
        })
        .or_else(|| {
            app.view
                .collections
                .iter()
                .find(|r| r.is_active)
                .map(|r| r.name.clone())
        })
        .unwrap_or_else(|| path.clone());

    let mut lines = vec![
        Line::from(Span::styled(
            heading,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(path, Style::default().fg(Color::DarkGray))),
        Line::from(""),
        Line::from(format!(
            "{} feeds, {} collections",
            app.view.feeds.len(),
            app.view.collections.len()
        )),
    ];
    for error in &app.view.errors {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_landing(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "SUPRSS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Your feeds and collections, in one place."),
        Line::from(""),
        Line::from(Span::styled(
            "[ Get Started ]",
            Style::default().bg(Color::Cyan).fg(Color::Black),
        )),
    ];
    let height = text.len() as u16 + 2;
    let overlay = Rect::new(
        area.x,
        area.y + area.height.saturating_sub(height) / 2,
        area.width,
        height.min(area.height),
    );
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        overlay,
    );
}

/// Render the delete confirmation dialog centered on screen.
fn render_confirm_overlay(f: &mut Frame, confirm: &ConfirmView) {
    let area = f.area();

    let width = 56u16.min(area.width.saturating_sub(4));
    let height = 9u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let action_style = if confirm.busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
            .bg(Color::Red)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    };
    let mut buttons = vec![Span::styled(format!(" (y) {} ", confirm.action_label), action_style)];
    if !confirm.busy {
        buttons.push(Span::raw("  "));
        buttons.push(Span::raw(format!("(n/Esc) {}", confirm.cancel_label)));
    }

    let lines = vec![
        Line::from(confirm.message.clone()),
        Line::from(""),
        Line::from(buttons),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} ", confirm.title)),
        );

    f.render_widget(paragraph, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use ratatui::{backend::TestBackend, Terminal};
    use reqwest::Method;
    use std::sync::Arc;
    use std::time::Duration;
    use suprss::api::mock::MockTransport;
    use suprss::api::{paths, Feed};
    use suprss::navigation::BrowserNavigator;
    use suprss::notify::RecordingSink;
    use suprss::{ControllerOptions, FeedController};
    use url::Url;

    async fn app_with(feeds: Vec<Feed>) -> App {
        let mock = MockTransport::new();
        mock.reply_json(Method::GET, paths::FEEDS, &feeds);
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

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn feed(id: i64, title: &str) -> Feed {
        Feed {
            id,
            title: title.to_string(),
            url: format!("https://example.com/{}/rss", id),
            active: true,
            unread_count: Some(2),
        }
    }

    #[tokio::test]
    async fn test_sidebar_lists_feeds() {
        let app = app_with(vec![feed(1, "Tech News")]).await;
        let screen = draw(&app, 100, 30);
        assert!(screen.contains("Dashboard"));
        assert!(screen.contains("Tech News"));
        assert!(screen.contains("RSS FEEDS"));
    }

    #[tokio::test]
    async fn test_confirm_dialog_drawn() {
        let mut app = app_with(vec![feed(1, "Tech News")]).await;
        app.selected = 3;
        assert!(app.request_delete_selected());
        let screen = draw(&app, 100, 30);
        assert!(screen.contains("Delete RSS Feed"));
        assert!(screen.contains("Delete Feed"));
    }

    #[tokio::test]
    async fn test_too_small_terminal() {
        let app = app_with(Vec::new()).await;
        let screen = draw(&app, 40, 8);
        assert!(screen.contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_selection_scrolls_into_view() {
        let feeds = (1..=40).map(|id| feed(id, &format!("Feed {:02}", id))).collect();
        let mut app = app_with(feeds).await;
        assert!(!draw(&app, 100, 20).contains("Feed 40"));

        app.selected = app.entries().len() - 1;
        let screen = draw(&app, 100, 20);
        assert!(screen.contains("Feed 40"));
    }
}
