pub mod detail;
pub mod filter_bar;
pub mod layout;
pub mod popups;
pub mod pr_table;
pub mod status_bar;

pub use layout::AppLayout;

use crate::app::{App, InputMode};
use ratatui::{style::Style, widgets::Block, Frame};

/// Draws the whole browser screen
pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(app.theme.bg())), area);

    let layout = AppLayout::split_main(area);
    filter_bar::render(f, layout.filters, app);
    pr_table::render(f, layout.list, app);
    detail::render(f, layout.detail, app);
    status_bar::render(f, layout.status, app);

    match app.input_mode {
        InputMode::SearchName => popups::render_search_name(f, area, app),
        InputMode::SavedSearches => popups::render_saved_searches(f, area, app),
        InputMode::Normal | InputMode::Editing(_) => {}
    }
}
