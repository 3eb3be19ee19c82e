use crate::{app::App, ui::layout::centered_rect};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

/// Text prompt asking for the name of a new saved search
pub fn render_search_name(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let popup_area = centered_rect(50, 20, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Save Search ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused()))
        .style(Style::default().bg(theme.popup_bg()));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Prompt
            Constraint::Length(1), // Input
            Constraint::Min(0),    // Hint
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new("Name:").style(Style::default().fg(theme.fg())),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(format!("{}_", app.input))
            .style(Style::default().fg(theme.fg()).bg(theme.input_bg())),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new("Enter to save, Esc to cancel")
            .style(Style::default().fg(theme.subtitle())),
        chunks[2],
    );
}

/// Saved searches sorted by name, with the filters each one sets
pub fn render_saved_searches(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = &app.theme;
    let popup_area = centered_rect(60, 60, area);
    f.render_widget(Clear, popup_area);

    let searches = crate::saved_search::sorted(&app.settings.saved_searches);
    let items: Vec<ListItem> = if searches.is_empty() {
        vec![ListItem::new(Span::styled(
            "No saved searches yet",
            Style::default().fg(theme.subtitle()),
        ))]
    } else {
        searches
            .iter()
            .map(|search| {
                let filter = search.filter_state();
                let mut summary = Vec::new();
                if !filter.author.is_empty() {
                    summary.push(format!("author={}", filter.author));
                }
                if !filter.target_branch.is_empty() {
                    summary.push(format!("target={}", filter.target_branch));
                }
                if !filter.search_text.is_empty() {
                    summary.push(format!("text={}", filter.search_text));
                }
                summary.push(format!("status={}", filter.status.label()));

                ListItem::new(Line::from(vec![
                    Span::styled(
                        search.name.clone(),
                        Style::default().fg(theme.fg()).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", summary.join(" ")),
                        Style::default().fg(theme.subtitle()),
                    ),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Saved Searches (Enter apply, d delete, Esc close) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_focused()))
                .style(Style::default().bg(theme.popup_bg())),
        )
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg())
                .fg(theme.selection_fg()),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, popup_area, &mut app.saved_state);
}
