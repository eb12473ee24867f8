use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use suprss::notify::Severity;

/// Render the status line: the current toast, else key hints.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let line = match &app.toast {
        Some((note, _)) => {
            let accent = match note.severity {
                Severity::Info => Color::Green,
                Severity::Destructive => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", note.title),
                    Style::default()
                        .bg(accent)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" {}", note.description)),
            ])
        }
        None if app.is_landing() => Line::from("[Enter] get started  [q]uit"),
        None => Line::from("[j/k] move  [Enter] open  [d]elete  [r]efresh  [L]ogout  [?] help  [q]uit"),
    };

    let paragraph =
        Paragraph::new(line).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(paragraph, area);
}
