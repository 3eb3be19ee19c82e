//! Turns listed pull requests into fully enriched records.
//!
//! Every aspect of a record (changes and line counts, reviewers, work items,
//! comment threads, build status) is fetched separately. A failing aspect is
//! logged and replaced by its empty default; only a failure to list pull
//! requests fails the whole fetch.

use super::models::{pull_request_url, PullRequest};
use super::source::{FileChange, LineStats, PullRequestSource, PullRequestSummary};
use crate::cache::{CachedChanges, EnrichmentCache, EnrichmentKey};
use crate::diff::stats::{DiffStats, LineStatsMode};
use crate::filter::{FilterEngine, FilterState};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;

/// Parameters of one fetch. The optional filters are applied to the
/// enriched records before they are returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchQuery {
    pub project: String,
    pub repository: String,
    pub from_date: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub target_branch: Option<String>,
}

impl FetchQuery {
    pub fn new(project: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            repository: repository.into(),
            ..Self::default()
        }
    }

    fn as_filter(&self) -> FilterState {
        FilterState::default()
            .with_from_date(self.from_date)
            .with_author(self.author.clone().unwrap_or_default())
            .with_target_branch(self.target_branch.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderOptions {
    pub line_stats: LineStatsMode,
    /// Number of records enriched at the same time
    pub concurrency: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            line_stats: LineStatsMode::Exact,
            concurrency: 8,
        }
    }
}

#[derive(Clone)]
pub struct PullRequestLoader {
    source: Arc<dyn PullRequestSource>,
    cache: EnrichmentCache,
    options: LoaderOptions,
}

impl PullRequestLoader {
    pub fn new(source: Arc<dyn PullRequestSource>, options: LoaderOptions) -> Self {
        Self {
            source,
            cache: EnrichmentCache::default(),
            options,
        }
    }

    /// Lists and enriches every pull request of the repository, keeping the
    /// order reported by the host.
    pub async fn fetch(&self, query: &FetchQuery) -> Result<Vec<PullRequest>> {
        let summaries = self
            .source
            .list_pull_requests(&query.project, &query.repository)
            .await
            .context("Failed to list pull requests")?;

        let total = summaries.len();
        let records: Vec<PullRequest> = stream::iter(summaries)
            .map(|summary| self.enrich(query, summary))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let filter = query.as_filter();
        let records: Vec<PullRequest> = records
            .into_iter()
            .filter(|pr| FilterEngine::matches(pr, &filter))
            .collect();

        tracing::info!(total, kept = records.len(), "loaded pull requests");
        Ok(records)
    }

    async fn enrich(&self, query: &FetchQuery, summary: PullRequestSummary) -> PullRequest {
        let source = self.source.as_ref();
        let (project, repository, id) = (query.project.as_str(), query.repository.as_str(), summary.id);

        let ((changes, stats), reviewers, work_items, comments, build_status) = tokio::join!(
            self.changes_and_stats(query, &summary),
            or_default("reviewers", id, source.reviewers(project, repository, id)),
            or_default("work items", id, source.work_items(project, repository, id)),
            or_default("comments", id, source.comment_counts(project, repository, id)),
            or_default("build status", id, source.build_status(project, repository, id)),
        );

        PullRequest {
            id,
            url: pull_request_url(source.organization(), project, repository, id),
            title: summary.title,
            description: summary.description,
            status: summary.status,
            created_by: summary.created_by,
            created_date: summary.created_date,
            completed_date: summary.completed_date,
            closed_by: summary.closed_by,
            source_branch: summary.source_branch,
            target_branch: summary.target_branch,
            repository: repository.to_string(),
            project: project.to_string(),
            modified_files: changes.into_iter().map(|c| c.path).collect(),
            reviewers,
            related_work_items: work_items,
            added_lines: stats.added,
            deleted_lines: stats.deleted,
            is_draft: summary.is_draft,
            has_merge_conflicts: summary.has_merge_conflicts,
            build_status,
            comment_count: comments.total,
            unresolved_comment_count: comments.unresolved,
        }
    }

    async fn changes_and_stats(
        &self,
        query: &FetchQuery,
        summary: &PullRequestSummary,
    ) -> (Vec<FileChange>, LineStats) {
        let key = summary.source_commit.as_ref().map(|commit| EnrichmentKey {
            repository: query.repository.clone(),
            id: summary.id,
            source_commit: commit.clone(),
            mode: self.options.line_stats,
        });

        if let Some(key) = &key {
            if let Some(cached) = self.cache.get(key).await {
                tracing::debug!(id = summary.id, "changes served from cache");
                return (cached.changes, cached.stats);
            }
        }

        let source = self.source.as_ref();
        let changes = match source
            .changes(&query.project, &query.repository, summary.id)
            .await
        {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(id = summary.id, error = %e, "failed to fetch changes");
                return (Vec::new(), LineStats::default());
            }
        };

        let stats = DiffStats::compute(
            self.options.line_stats,
            source,
            &query.project,
            &query.repository,
            &changes,
        )
        .await;

        match stats {
            Ok(stats) => {
                if let Some(key) = key {
                    let entry = CachedChanges {
                        changes: changes.clone(),
                        stats,
                    };
                    self.cache.put(key, entry).await;
                }
                (changes, stats)
            }
            Err(e) => {
                tracing::warn!(id = summary.id, error = %e, "failed to count changed lines");
                (changes, LineStats::default())
            }
        }
    }
}

/// Resolves an enrichment aspect, falling back to its default on failure
async fn or_default<T, F>(aspect: &str, id: i32, fetch: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match fetch.await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(id, aspect, error = %e, "enrichment failed, using defaults");
            T::default()
        }
    }
}
