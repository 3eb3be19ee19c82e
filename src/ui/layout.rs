use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the browser screen
pub struct AppLayout {
    pub filters: Rect,
    pub list: Rect,
    pub detail: Rect,
    pub status: Rect,
}

impl AppLayout {
    pub fn split_main(area: Rect) -> Self {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Filter bar
                Constraint::Min(5),    // Main content area
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        // List on the left, details of the selected request on the right
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[1]);

        Self {
            filters: main_chunks[0],
            list: content_chunks[0],
            detail: content_chunks[1],
            status: main_chunks[2],
        }
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_main() {
        let layout = AppLayout::split_main(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.filters.height, 3);
        assert_eq!(layout.status.height, 3);
        assert_eq!(layout.list.height, 34);
        assert_eq!(layout.list.width + layout.detail.width, 100);
        assert_eq!(layout.list.width, 60);
    }
}
