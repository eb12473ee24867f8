use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use suprss::projection::{Indicator, ProfileView};
use suprss::util::truncate_to_width;

/// Render the sidebar: navigation, feeds, collections, profile.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let profile_height = if app.view.profile.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(profile_height)])
        .split(area);

    render_lists(f, app, chunks[0]);
    if let Some(profile) = &app.view.profile {
        render_profile(f, profile, chunks[1]);
    }
}

fn render_lists(f: &mut Frame, app: &App, area: Rect) {
    // Room for borders, the indicator and the count column.
    let title_width = (area.width as usize).saturating_sub(12);
    let selected_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let header_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD);

    let mut items: Vec<ListItem> = Vec::new();
    // Entries are numbered without the header and blank rows; `selected_row`
    // is the selected entry's position in `items`.
    let mut index = 0usize;
    let mut selected_row = None;
    let mut style_for = |row: usize, is_active: bool| {
        let style = if index == app.selected {
            selected_row = Some(row);
            selected_style
        } else if is_active {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        index += 1;
        style
    };

    for entry in &app.view.nav {
        let style = style_for(items.len(), entry.is_active);
        items.push(ListItem::new(Line::from(Span::styled(
            entry.label.clone(),
            style,
        ))));
    }

    items.push(ListItem::new(""));
    items.push(ListItem::new(Span::styled("RSS FEEDS", header_style)));
    if app.view.feeds.is_empty() {
        let placeholder = if app.view.loading { "Loading..." } else { "No feeds yet" };
        items.push(ListItem::new(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        )));
    }
    for row in &app.view.feeds {
        let dot_color = match row.indicator {
            Indicator::Active => Color::Green,
            Indicator::Inactive => Color::DarkGray,
        };
        let style = style_for(items.len(), row.is_active);
        let mut spans = vec![
            Span::styled("● ", Style::default().fg(dot_color)),
            Span::styled(truncate_to_width(&row.title, title_width).into_owned(), style),
        ];
        if row.is_deleting {
            spans.push(Span::styled(" deleting", Style::default().fg(Color::Red)));
        } else if row.unread_count > 0 {
            spans.push(Span::styled(
                format!(" {}", row.unread_count),
                Style::default().fg(Color::Yellow),
            ));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    items.push(ListItem::new(""));
    items.push(ListItem::new(Span::styled("COLLECTIONS", header_style)));
    for row in &app.view.collections {
        let style = style_for(items.len(), row.is_active);
        items.push(ListItem::new(Line::from(vec![
            Span::styled(truncate_to_width(&row.name, title_width).into_owned(), style),
            Span::styled(
                format!(" [{}]", row.member_count),
                Style::default().fg(Color::DarkGray),
            ),
        ])));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" SUPRSS "),
        )
        .highlight_style(Style::default());

    let mut state = ListState::default().with_selected(selected_row);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_profile(f: &mut Frame, profile: &ProfileView, area: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", profile.initials),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::styled(
            profile.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(email) = &profile.email {
        lines.push(Line::from(Span::styled(
            email.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
