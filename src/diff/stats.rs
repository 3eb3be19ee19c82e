use crate::devops::source::{FileChange, LineStats, PullRequestSource};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// How added/deleted line counts are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatsMode {
    /// Diff the old and new blob of every changed file
    #[default]
    Exact,
    /// Fixed +10/-5 per changed blob, for parity with older releases
    Estimate,
    Off,
}

pub struct DiffStats;

impl DiffStats {
    pub const ESTIMATED_ADDED: u32 = 10;
    pub const ESTIMATED_DELETED: u32 = 5;

    /// Counts inserted and deleted lines between two texts
    pub fn count_lines(old_content: &str, new_content: &str) -> LineStats {
        use similar::{ChangeTag, TextDiff};

        let diff = TextDiff::from_lines(old_content, new_content);
        let mut stats = LineStats::default();

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => stats.added += 1,
                ChangeTag::Delete => stats.deleted += 1,
                ChangeTag::Equal => {}
            }
        }

        stats
    }

    pub fn estimate(changes: &[FileChange]) -> LineStats {
        let blobs = changes.iter().filter(|c| c.is_blob).count() as u32;
        LineStats {
            added: blobs * Self::ESTIMATED_ADDED,
            deleted: blobs * Self::ESTIMATED_DELETED,
        }
    }

    /// Fetches both sides of every blob change and sums the line counts.
    /// Any blob that cannot be fetched fails the whole aspect.
    pub async fn exact(
        source: &dyn PullRequestSource,
        project: &str,
        repository: &str,
        changes: &[FileChange],
    ) -> Result<LineStats> {
        let mut total = LineStats::default();

        for change in changes.iter().filter(|c| c.is_blob) {
            let old_content = match (&change.original_object_id, change.is_add()) {
                (Some(id), false) => source.blob_text(project, repository, id).await?,
                _ => String::new(),
            };

            let new_content = match (&change.object_id, change.is_delete()) {
                (Some(id), false) => source.blob_text(project, repository, id).await?,
                _ => String::new(),
            };

            total += Self::count_lines(&old_content, &new_content);
        }

        Ok(total)
    }

    pub async fn compute(
        mode: LineStatsMode,
        source: &dyn PullRequestSource,
        project: &str,
        repository: &str,
        changes: &[FileChange],
    ) -> Result<LineStats> {
        match mode {
            LineStatsMode::Exact => Self::exact(source, project, repository, changes).await,
            LineStatsMode::Estimate => Ok(Self::estimate(changes)),
            LineStatsMode::Off => Ok(LineStats::default()),
        }
    }
}
