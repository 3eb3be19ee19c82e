//! Host-neutral view of a pull request source.
//!
//! [`PullRequestSource`] is the seam between the loader and a concrete host
//! API. Every enrichment aspect is its own call so one failing aspect can be
//! replaced by its default without losing the rest of the record.

use super::models::{Reviewer, WorkItem};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Pull request as listed by the host, before enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSummary {
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
    pub is_draft: bool,
    pub has_merge_conflicts: bool,
    /// Head commit of the source branch at the last merge attempt
    pub source_commit: Option<String>,
}

/// One entry of the latest iteration's change list
#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
    pub path: String,
    pub change_type: String,
    pub is_blob: bool,
    /// Blob after the change, absent for deletions
    pub object_id: Option<String>,
    /// Blob before the change, absent for additions
    pub original_object_id: Option<String>,
}

impl FileChange {
    pub fn is_delete(&self) -> bool {
        self.change_type.to_lowercase().contains("delete")
    }

    pub fn is_add(&self) -> bool {
        self.change_type.to_lowercase().contains("add")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub added: u32,
    pub deleted: u32,
}

impl std::ops::AddAssign for LineStats {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.deleted += other.deleted;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentCounts {
    pub total: u32,
    pub unresolved: u32,
}

#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Organization the source is connected to, used to build web URLs
    fn organization(&self) -> &str;

    async fn list_pull_requests(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Vec<PullRequestSummary>>;

    async fn changes(&self, project: &str, repository: &str, id: i32) -> Result<Vec<FileChange>>;

    async fn reviewers(&self, project: &str, repository: &str, id: i32) -> Result<Vec<Reviewer>>;

    async fn work_items(&self, project: &str, repository: &str, id: i32) -> Result<Vec<WorkItem>>;

    async fn comment_counts(&self, project: &str, repository: &str, id: i32)
        -> Result<CommentCounts>;

    async fn build_status(&self, project: &str, repository: &str, id: i32) -> Result<String>;

    /// Raw text of a blob, used to count changed lines
    async fn blob_text(&self, project: &str, repository: &str, object_id: &str) -> Result<String>;
}
