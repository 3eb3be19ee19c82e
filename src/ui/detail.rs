use crate::{
    app::{App, FocusedPane},
    devops::PullRequest,
    theme::Theme,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{label:<12}"),
            Style::default()
                .fg(theme.subtitle())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, Style::default().fg(theme.fg())),
    ])
}

fn heading<'a>(text: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(Span::styled(
        text,
        Style::default().fg(theme.title()).add_modifier(Modifier::BOLD),
    ))
}

pub fn detail_lines<'a>(pr: &'a PullRequest, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("#{} {}", pr.id, pr.title),
            Style::default().fg(theme.title()).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        field("Status", format!("{} {}", pr.status_icon(), pr.status), theme),
        field("Author", pr.created_by.clone(), theme),
        field(
            "Created",
            pr.created_date.format("%Y-%m-%d %H:%M").to_string(),
            theme,
        ),
    ];

    if let Some(completed) = pr.completed_date {
        lines.push(field(
            "Completed",
            completed.format("%Y-%m-%d %H:%M").to_string(),
            theme,
        ));
    }
    if !pr.closed_by.is_empty() {
        lines.push(field("Closed by", pr.closed_by.clone(), theme));
    }

    lines.extend([
        field(
            "Branches",
            format!(
                "{} -> {}",
                PullRequest::short_branch(&pr.source_branch),
                PullRequest::short_branch(&pr.target_branch)
            ),
            theme,
        ),
        field("Changes", pr.changes_summary(), theme),
        field(
            "Build",
            format!("{} {}", pr.build_status_icon(), pr.build_status),
            theme,
        ),
        field(
            "Conflicts",
            format!(
                "{} {}",
                pr.conflict_icon(),
                if pr.has_merge_conflicts { "yes" } else { "none" }
            ),
            theme,
        ),
        field(
            "Comments",
            format!(
                "{} ({} unresolved)",
                pr.comment_count, pr.unresolved_comment_count
            ),
            theme,
        ),
        field("Approval", pr.approval_status(), theme),
    ]);

    if !pr.reviewers.is_empty() {
        lines.push(field("Reviewers", pr.reviewers_display(), theme));
    }
    if !pr.related_work_items.is_empty() {
        lines.push(field("Work items", pr.work_items_display(), theme));
    }
    lines.push(field("URL", pr.url.clone(), theme));

    if !pr.reviewers.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Reviewers", theme));
        for reviewer in &pr.reviewers {
            let color = if reviewer.approved() {
                theme.success()
            } else if reviewer.rejected() {
                theme.error()
            } else {
                theme.fg()
            };
            let required = if reviewer.is_required { " (required)" } else { "" };
            lines.push(Line::from(Span::styled(
                format!(
                    "  {}: {}{}",
                    reviewer.display_name,
                    reviewer.vote().text(),
                    required
                ),
                Style::default().fg(color),
            )));
        }
    }

    if !pr.related_work_items.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Work items", theme));
        for item in &pr.related_work_items {
            lines.push(Line::raw(format!(
                "  #{} [{}] {} ({})",
                item.id, item.kind, item.title, item.state
            )));
        }
    }

    if !pr.modified_files.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Files", theme));
        lines.extend(pr.modified_files.iter().map(|f| Line::raw(format!("  {f}"))));
    }

    if !pr.description.trim().is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Description", theme));
        lines.extend(pr.description.lines().map(Line::raw));
    }

    lines
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let border_style = if app.focused_pane == FocusedPane::Detail {
        Style::default().fg(theme.border_focused())
    } else {
        Style::default().fg(theme.border())
    };

    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Style::default().bg(theme.bg()).fg(theme.fg()));

    let Some(pr) = app.selected_pull_request() else {
        let paragraph = Paragraph::new("No pull request selected")
            .block(block)
            .style(Style::default().fg(theme.subtitle()))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    };

    let paragraph = Paragraph::new(detail_lines(pr, theme))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, area);
}
