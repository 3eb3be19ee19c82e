use crate::{app::App, keybindings::KeyDisplays, theme::Theme};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn hint<'a>(key: String, label: &'a str, theme: &Theme) -> [Span<'a>; 2] {
    [
        Span::styled(
            key,
            Style::default()
                .fg(theme.nav_active())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {label}  "), Style::default().fg(theme.nav_fg())),
    ]
}

fn key_hints<'a>(keys: KeyDisplays, theme: &Theme) -> Line<'a> {
    let mut spans = vec![Span::raw(" ")];
    spans.extend(hint(
        format!("{}/{}", keys.navigate_up, keys.navigate_down),
        "Nav",
        theme,
    ));
    spans.extend(hint(keys.toggle_focus, "Focus", theme));
    spans.extend(hint(keys.refresh, "Refresh", theme));
    spans.extend(hint(
        format!(
            "{}{}{}{}{}{}",
            keys.edit_author,
            keys.edit_target_branch,
            keys.edit_search,
            keys.edit_from_date,
            keys.edit_extension,
            keys.edit_min_changes
        ),
        "Filters",
        theme,
    ));
    spans.extend(hint(keys.cycle_status, "Status", theme));
    spans.extend(hint(keys.clear_filters, "Clear", theme));
    spans.extend(hint(keys.save_search, "Save", theme));
    spans.extend(hint(keys.open_saved_searches, "Searches", theme));
    spans.push(Span::styled(
        keys.quit,
        Style::default()
            .fg(theme.error())
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(" Quit ", Style::default().fg(theme.nav_fg())));
    Line::from(spans)
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let keys = app.settings.keybindings.get_display_keys();

    let status_color = if app.status_text().starts_with("Error") {
        theme.error()
    } else {
        theme.info()
    };

    let paragraph = Paragraph::new(key_hints(keys, theme))
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", app.status_text()),
                    Style::default().fg(status_color),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border()))
                .style(Style::default().bg(theme.nav_bg()).fg(theme.nav_fg())),
        )
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}
