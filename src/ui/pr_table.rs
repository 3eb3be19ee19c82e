use crate::{
    app::{App, FocusedPane},
    devops::PullRequest,
    settings::COLUMN_COUNT,
};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

/// Columns of the pull request table, in display order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    Id,
    Title,
    Status,
    Approval,
    CreatedBy,
    CreatedDate,
    SourceBranch,
    TargetBranch,
    ModifiedFiles,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Id,
        Column::Title,
        Column::Status,
        Column::Approval,
        Column::CreatedBy,
        Column::CreatedDate,
        Column::SourceBranch,
        Column::TargetBranch,
        Column::ModifiedFiles,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Title => "Title",
            Column::Status => "Status",
            Column::Approval => "Approval",
            Column::CreatedBy => "Created By",
            Column::CreatedDate => "Created",
            Column::SourceBranch => "Source",
            Column::TargetBranch => "Target",
            Column::ModifiedFiles => "Files",
        }
    }

    fn width(self) -> Constraint {
        match self {
            Column::Id => Constraint::Length(7),
            Column::Title => Constraint::Min(20),
            Column::Status => Constraint::Length(13),
            Column::Approval => Constraint::Length(10),
            Column::CreatedBy => Constraint::Length(18),
            Column::CreatedDate => Constraint::Length(16),
            Column::SourceBranch => Constraint::Length(20),
            Column::TargetBranch => Constraint::Length(14),
            Column::ModifiedFiles => Constraint::Length(6),
        }
    }

    pub fn cell_text(self, pr: &PullRequest) -> String {
        match self {
            Column::Id => pr.id.to_string(),
            Column::Title if pr.is_draft => format!("[Draft] {}", pr.title),
            Column::Title => pr.title.clone(),
            Column::Status => format!("{} {}", pr.status_icon(), pr.status),
            Column::Approval => format!("{} {}", pr.approval_icon(), pr.approval_status_short()),
            Column::CreatedBy => pr.created_by.clone(),
            Column::CreatedDate => pr.created_date.format("%Y-%m-%d %H:%M").to_string(),
            Column::SourceBranch => PullRequest::short_branch(&pr.source_branch).to_string(),
            Column::TargetBranch => PullRequest::short_branch(&pr.target_branch).to_string(),
            Column::ModifiedFiles => pr.changed_files().to_string(),
        }
    }
}

pub fn visible_columns(app: &App) -> Vec<Column> {
    Column::ALL
        .iter()
        .enumerate()
        .filter(|(i, _)| app.settings.column_visible(*i))
        .map(|(_, column)| *column)
        .collect()
}

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = &app.theme;
    let is_focused = app.focused_pane == FocusedPane::List;

    let border_style = if is_focused {
        Style::default().fg(theme.border_focused())
    } else {
        Style::default().fg(theme.border())
    };

    let view = app.session.view();
    let title = format!(" Pull Requests ({}/{}) ", view.filtered, view.total);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Style::default().bg(theme.bg()).fg(theme.fg()));

    if view.records.is_empty() {
        let message = if app.session.is_loading() {
            "Loading pull requests..."
        } else if view.total > 0 {
            "No pull requests match the current filters"
        } else {
            "No pull requests found"
        };

        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(theme.subtitle()))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let columns = visible_columns(app);
    if columns.is_empty() {
        let paragraph = Paragraph::new("All columns are hidden, press 1-9 to show them")
            .block(block)
            .style(Style::default().fg(theme.warning()))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let header_style = Style::default()
        .fg(theme.header_fg())
        .bg(theme.header_bg())
        .add_modifier(Modifier::BOLD);
    let header = Row::new(columns.iter().map(|c| Cell::from(c.header())))
        .style(header_style)
        .height(1);

    let rows = view.records.iter().enumerate().map(|(i, pr)| {
        let bg = match i % 2 {
            0 => theme.bg(),
            _ => theme.alt_row_bg(),
        };
        Row::new(columns.iter().map(|c| Cell::from(c.cell_text(pr))))
            .style(Style::default().fg(theme.fg()).bg(bg))
            .height(1)
    });

    let widths: Vec<Constraint> = columns.iter().map(|c| c.width()).collect();
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(theme.selection_bg())
                .fg(theme.selection_fg())
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(table, area, &mut app.table_state);
}
