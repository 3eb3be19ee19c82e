use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub closed_by: String,
    pub source_branch: String,
    pub target_branch: String,
    pub repository: String,
    pub project: String,
    pub url: String,
    /// Paths in the order the host returned them, duplicates included
    pub modified_files: Vec<String>,
    pub reviewers: Vec<Reviewer>,
    pub related_work_items: Vec<WorkItem>,
    pub added_lines: u32,
    pub deleted_lines: u32,
    pub is_draft: bool,
    pub has_merge_conflicts: bool,
    pub build_status: String,
    pub comment_count: u32,
    pub unresolved_comment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub display_name: String,
    pub unique_name: String,
    pub vote: i32,
    pub is_required: bool,
    pub has_declined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i32,
    pub title: String,
    pub kind: String,
    pub state: String,
}

/// Reviewer vote as understood by Azure DevOps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Rejected,
    WaitingForAuthor,
    NoVote,
    ApprovedWithSuggestions,
    Approved,
    Unknown(i32),
}

impl From<i32> for Vote {
    fn from(value: i32) -> Self {
        match value {
            -10 => Vote::Rejected,
            -5 => Vote::WaitingForAuthor,
            0 => Vote::NoVote,
            5 => Vote::ApprovedWithSuggestions,
            10 => Vote::Approved,
            other => Vote::Unknown(other),
        }
    }
}

impl Vote {
    pub fn text(&self) -> &'static str {
        match self {
            Vote::Rejected => "Rejected",
            Vote::WaitingForAuthor => "Waiting for Author",
            Vote::NoVote => "No Vote",
            Vote::ApprovedWithSuggestions => "Approved with Suggestions",
            Vote::Approved => "Approved",
            Vote::Unknown(_) => "Unknown",
        }
    }
}

impl Reviewer {
    pub fn vote(&self) -> Vote {
        Vote::from(self.vote)
    }

    /// Any positive vote counts, known value or not
    pub fn approved(&self) -> bool {
        self.vote > 0
    }

    pub fn rejected(&self) -> bool {
        self.vote < 0
    }
}

/// Overall approval state of a pull request's reviewer set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    NoReviewers,
    Rejected,
    Approved,
    PartiallyApproved,
    Pending,
}

impl PullRequest {
    /// Always the number of modified file entries
    pub fn changed_files(&self) -> usize {
        self.modified_files.len()
    }

    pub fn approved_count(&self) -> usize {
        self.reviewers.iter().filter(|r| r.approved()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.reviewers.iter().filter(|r| r.rejected()).count()
    }

    pub fn approval_state(&self) -> ApprovalState {
        if self.reviewers.is_empty() {
            return ApprovalState::NoReviewers;
        }

        let approved = self.approved_count();
        if self.rejected_count() > 0 {
            ApprovalState::Rejected
        } else if approved == self.reviewers.len() {
            ApprovalState::Approved
        } else if approved > 0 {
            ApprovalState::PartiallyApproved
        } else {
            ApprovalState::Pending
        }
    }

    pub fn reviewers_display(&self) -> String {
        self.reviewers
            .iter()
            .map(|r| r.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn approval_status(&self) -> String {
        format!("{} approved", self.approval_status_short())
    }

    pub fn approval_status_short(&self) -> String {
        format!("{}/{}", self.approved_count(), self.reviewers.len())
    }

    pub fn work_items_display(&self) -> String {
        self.related_work_items
            .iter()
            .map(|w| format!("#{}", w.id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn changes_summary(&self) -> String {
        format!(
            "+{} -{} ({} files)",
            self.added_lines,
            self.deleted_lines,
            self.changed_files()
        )
    }

    pub fn status_icon(&self) -> &'static str {
        match self.status.to_lowercase().as_str() {
            "active" => "🔵",
            "completed" => "✅",
            "abandoned" => "❌",
            "draft" => "📝",
            _ => "⚪",
        }
    }

    pub fn approval_icon(&self) -> &'static str {
        match self.approval_state() {
            ApprovalState::NoReviewers => "👤",
            ApprovalState::Rejected => "❌",
            ApprovalState::Approved => "✅",
            ApprovalState::PartiallyApproved => "🟡",
            ApprovalState::Pending => "⏳",
        }
    }

    pub fn build_status_icon(&self) -> &'static str {
        match self.build_status.to_lowercase().as_str() {
            "succeeded" => "✅",
            "failed" => "❌",
            "partiallysucceeded" => "🟡",
            "inprogress" => "🔄",
            _ => "⚪",
        }
    }

    pub fn conflict_icon(&self) -> &'static str {
        if self.has_merge_conflicts {
            "⚠️"
        } else {
            "✅"
        }
    }

    /// Branch name without the `refs/heads/` prefix
    pub fn short_branch(reference: &str) -> &str {
        reference.strip_prefix("refs/heads/").unwrap_or(reference)
    }
}

/// Builds the web URL of a pull request
pub fn pull_request_url(organization: &str, project: &str, repository: &str, id: i32) -> String {
    format!("https://dev.azure.com/{organization}/{project}/_git/{repository}/pullrequest/{id}")
}

/// Organization, project and repository identified by a repository URL
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRepoUrl {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub pull_request: Option<i32>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::{pull_request, reviewer};
    use super::*;

    #[test]
    fn test_changed_files_follows_modified_files() {
        let mut pr = pull_request(1);
        assert_eq!(pr.changed_files(), 0);

        pr.modified_files = vec!["a.rs".into(), "a.rs".into(), "b.rs".into()];
        assert_eq!(pr.changed_files(), 3);
        assert_eq!(pr.changes_summary(), "+0 -0 (3 files)");
    }

    #[test]
    fn test_approval_icon() {
        let mut pr = pull_request(1);
        assert_eq!(pr.approval_icon(), "👤");

        pr.reviewers = vec![reviewer("A", 10), reviewer("B", 0)];
        assert_eq!(pr.approval_state(), ApprovalState::PartiallyApproved);
        assert_eq!(pr.approval_status(), "1/2 approved");

        pr.reviewers = vec![reviewer("A", 10), reviewer("B", 5)];
        assert_eq!(pr.approval_state(), ApprovalState::Approved);

        pr.reviewers = vec![reviewer("A", 10), reviewer("B", -5)];
        assert_eq!(pr.approval_icon(), "❌");

        pr.reviewers = vec![reviewer("A", 0)];
        assert_eq!(pr.approval_icon(), "⏳");
    }

    #[test]
    fn test_unknown_votes_still_aggregate() {
        let mut pr = pull_request(1);
        pr.reviewers = vec![reviewer("A", 3), reviewer("B", 7)];
        assert_eq!(pr.reviewers[0].vote(), Vote::Unknown(3));
        assert_eq!(pr.reviewers[0].vote().text(), "Unknown");
        assert_eq!(pr.approval_state(), ApprovalState::Approved);

        pr.reviewers.push(reviewer("C", -1));
        assert_eq!(pr.approval_state(), ApprovalState::Rejected);
    }

    #[test]
    fn test_status_and_build_icons() {
        let mut pr = pull_request(1);
        pr.status = "Completed".to_string();
        assert_eq!(pr.status_icon(), "✅");
        pr.status = "notSet".to_string();
        assert_eq!(pr.status_icon(), "⚪");

        pr.build_status = "partiallySucceeded".to_string();
        assert_eq!(pr.build_status_icon(), "🟡");
    }

    #[test]
    fn test_url_and_short_branch() {
        assert_eq!(
            pull_request_url("contoso", "Web", "site", 42),
            "https://dev.azure.com/contoso/Web/_git/site/pullrequest/42"
        );
        assert_eq!(PullRequest::short_branch("refs/heads/main"), "main");
        assert_eq!(PullRequest::short_branch("main"), "main");
    }
}
