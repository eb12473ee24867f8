use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYS: &[(&str, &str)] = &[
    ("j / Down", "Next entry"),
    ("k / Up", "Previous entry"),
    ("Enter / l", "Open entry"),
    ("d / Del", "Delete selected feed"),
    ("y / Enter", "Confirm delete"),
    ("n / Esc", "Cancel delete"),
    ("r", "Refresh everything"),
    ("L", "Log out"),
    ("q", "Quit"),
];

/// Render the key reference centered on screen.
pub fn render(f: &mut Frame) {
    let area = f.area();
    let width = 44u16.min(area.width.saturating_sub(4));
    let height = (KEYS.len() as u16 + 4).min(area.height.saturating_sub(2));
    let overlay = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    let text = KEYS
        .iter()
        .map(|(key, what)| format!("{:<12} {}", key, what))
        .collect::<Vec<_>>()
        .join("\n");

    f.render_widget(Clear, overlay);
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Left)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Keys (any key closes) "),
            ),
        overlay,
    );
}
