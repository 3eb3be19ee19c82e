//! Fixed-width plain text listing used by `azpr list`.

use crate::devops::PullRequest;
use std::fmt::Write as _;

const TITLE_WIDTH: usize = 47;
const AUTHOR_WIDTH: usize = 17;
const RULE_WIDTH: usize = 103;

/// Cuts `text` to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

pub fn header() -> String {
    format!(
        "{:<6} {:<15} {:<50} {:<20} {:<12}",
        "ID", "Status", "Title", "Created By", "Created Date"
    )
}

pub fn row(pr: &PullRequest) -> String {
    format!(
        "{:<6} {:<15} {:<50} {:<20} {}",
        pr.id,
        pr.status,
        truncate(&pr.title, TITLE_WIDTH),
        truncate(&pr.created_by, AUTHOR_WIDTH),
        pr.created_date.format("%Y/%m/%d")
    )
}

/// Header, rule and one row per record, each line newline-terminated
pub fn render(records: &[PullRequest]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        out.push_str("No pull requests found.\n");
        return out;
    }

    let _ = writeln!(out, "{}", header());
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for pr in records {
        let _ = writeln!(out, "{}", row(pr));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devops::models::fixtures::pull_request;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 47), "short");
        assert_eq!(truncate(&"x".repeat(47), 47), "x".repeat(47));

        let long = "y".repeat(60);
        let cut = truncate(&long, 47);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));

        // Counted in characters, not bytes
        assert_eq!(truncate("ééé", 2), "éé...");
    }

    #[test]
    fn test_row_layout() {
        let mut pr = pull_request(42);
        pr.title = "T".repeat(80);
        pr.created_by = "Bartholomew Longname-Smith".to_string();

        let line = row(&pr);
        assert!(line.starts_with("42     active          "));
        assert!(line.contains(&format!("{}...", "T".repeat(47))));
        assert!(line.contains("Bartholomew Longn... "));
        assert!(line.ends_with("2024/03/01"));
        assert_eq!(line.len(), header().trim_end().len() - "Created Date".len() + 10);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&[]), "No pull requests found.\n");

        let out = render(&[pull_request(1), pull_request(2)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID     Status"));
        assert_eq!(lines[1], "-".repeat(103));
    }
}
