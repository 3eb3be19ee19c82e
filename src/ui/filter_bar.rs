use crate::{
    app::{App, FilterField, InputMode},
    theme::Theme,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const FIELDS: [FilterField; 6] = [
    FilterField::Author,
    FilterField::TargetBranch,
    FilterField::Search,
    FilterField::FromDate,
    FilterField::Extension,
    FilterField::MinChanges,
];

fn segment<'a>(label: &str, value: String, active: bool, theme: &Theme) -> Vec<Span<'a>> {
    let value_style = if active {
        Style::default()
            .fg(theme.nav_active())
            .bg(theme.input_bg())
            .add_modifier(Modifier::BOLD)
    } else if value.is_empty() {
        Style::default().fg(theme.subtitle())
    } else {
        Style::default().fg(theme.info())
    };

    let value = match (active, value.is_empty()) {
        (true, _) => format!("{value}_"),
        (false, true) => "-".to_string(),
        (false, false) => value,
    };

    vec![
        Span::styled(format!(" {label}: "), Style::default().fg(theme.fg())),
        Span::styled(value, value_style),
        Span::raw(" "),
    ]
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let filter = app.session.filter();
    let editing = match app.input_mode {
        InputMode::Editing(field) => Some(field),
        _ => None,
    };

    let mut spans = Vec::new();
    for field in FIELDS {
        let active = editing == Some(field);
        let value = if active {
            app.input.clone()
        } else {
            field.current(filter)
        };
        spans.extend(segment(field.label(), value, active, theme));
    }
    spans.extend(segment("Status", filter.status.label().to_string(), false, theme));

    let border_style = if editing.is_some() {
        Style::default().fg(theme.border_focused())
    } else {
        Style::default().fg(theme.border())
    };

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(theme.bg())),
    );
    f.render_widget(paragraph, area);
}
