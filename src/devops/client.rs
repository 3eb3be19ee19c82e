use super::models::{ParsedRepoUrl, Reviewer, WorkItem};
use super::source::{CommentCounts, FileChange, PullRequestSource, PullRequestSummary};
use super::wire;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

/// Azure DevOps Git REST client authenticated with a personal access token
#[derive(Clone)]
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    base_url: Url,
    organization: String,
    token: String,
}

impl AzureDevOpsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://dev.azure.com";
    pub const API_VERSION: &'static str = "7.1";

    pub fn new(organization: &str, token: &str) -> Result<Self> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, organization, token)
    }

    pub fn with_base_url(base_url: &str, organization: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid Azure DevOps base URL")?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("azpr/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            organization: organization.to_string(),
            token: token.to_string(),
        })
    }

    /// Parses a repository or pull request web URL.
    ///
    /// Accepts `https://dev.azure.com/{org}/{project}/_git/{repo}` and the
    /// legacy `https://{org}.visualstudio.com/{project}/_git/{repo}` form, both
    /// optionally followed by `/pullrequest/{id}`.
    pub fn parse_repository_url(url: &str) -> Result<ParsedRepoUrl> {
        let modern = Regex::new(
            r"dev\.azure\.com/([^/]+)/([^/]+)/_git/([^/?#]+)(?:/pullrequest/(\d+))?",
        )
        .context("Failed to create regex")?;
        let legacy = Regex::new(
            r"([^/.]+)\.visualstudio\.com/(?:DefaultCollection/)?([^/]+)/_git/([^/?#]+)(?:/pullrequest/(\d+))?",
        )
        .context("Failed to create regex")?;

        let caps = modern
            .captures(url)
            .or_else(|| legacy.captures(url))
            .context("Invalid Azure DevOps repository URL format")?;

        // Project and repository names commonly contain spaces
        let decode = |s: &str| s.replace("%20", " ");

        Ok(ParsedRepoUrl {
            organization: decode(&caps[1]),
            project: decode(&caps[2]),
            repository: decode(&caps[3]),
            pull_request: caps.get(4).map(|m| m.as_str().parse()).transpose()?,
        })
    }

    fn organization_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Azure DevOps base URL cannot carry a path"))?
            .pop_if_empty()
            .push(&self.organization)
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", Self::API_VERSION);
        Ok(url)
    }

    fn repository_url(&self, project: &str, repository: &str, tail: &[&str]) -> Result<Url> {
        let mut segments = vec![project, "_apis", "git", "repositories", repository];
        segments.extend_from_slice(tail);
        self.organization_url(&segments)
    }

    fn pull_request_url(
        &self,
        project: &str,
        repository: &str,
        id: i32,
        tail: &[&str],
    ) -> Result<Url> {
        let id = id.to_string();
        let mut segments = vec!["pullRequests", id.as_str()];
        segments.extend_from_slice(tail);
        self.repository_url(project, repository, &segments)
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response> {
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .basic_auth("", Some(&self.token))
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        // An invalid token is answered with a sign-in page, not a 401
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION
            || status == StatusCode::UNAUTHORIZED
        {
            bail!("Azure DevOps rejected the personal access token ({status})");
        }
        if !status.is_success() {
            bail!("Azure DevOps returned {status} for {url}");
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let context = format!("Failed to decode response from {url}");
        self.send(url).await?.json::<T>().await.context(context)
    }

    async fn latest_iteration(&self, project: &str, repository: &str, id: i32) -> Result<Option<i32>> {
        let url = self.pull_request_url(project, repository, id, &["iterations"])?;
        let iterations: wire::ListResponse<wire::Iteration> = self.get_json(url).await?;
        Ok(iterations.value.last().map(|i| i.id.unwrap_or(0)))
    }

    async fn work_item_details(&self, ids: &[i32]) -> Result<Vec<WorkItem>> {
        let mut url = self.organization_url(&["_apis", "wit", "workitems"])?;
        let ids = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut()
            .append_pair("ids", &ids)
            .append_pair("fields", "System.Title,System.WorkItemType,System.State");

        let details: wire::ListResponse<wire::WorkItemDetails> = self.get_json(url).await?;
        Ok(details
            .value
            .into_iter()
            .map(|w| WorkItem {
                id: w.id,
                title: w.fields.title.unwrap_or_default(),
                kind: w.fields.work_item_type.unwrap_or_default(),
                state: w.fields.state.unwrap_or_default(),
            })
            .collect())
    }
}

pub(crate) fn summary_from_wire(pr: wire::GitPullRequest) -> PullRequestSummary {
    let display_name = |identity: Option<wire::IdentityRef>| {
        identity
            .and_then(|i| i.display_name.or(i.unique_name))
            .unwrap_or_default()
    };

    PullRequestSummary {
        id: pr.pull_request_id,
        title: pr.title.unwrap_or_default(),
        description: pr.description.unwrap_or_default(),
        status: pr.status.unwrap_or_default(),
        created_by: display_name(pr.created_by),
        created_date: pr.creation_date,
        completed_date: pr.closed_date,
        closed_by: display_name(pr.closed_by),
        source_branch: pr.source_ref_name.unwrap_or_default(),
        target_branch: pr.target_ref_name.unwrap_or_default(),
        is_draft: pr.is_draft.unwrap_or(false),
        has_merge_conflicts: pr
            .merge_status
            .is_some_and(|s| s.eq_ignore_ascii_case("conflicts")),
        source_commit: pr.last_merge_source_commit.map(|c| c.commit_id),
    }
}

pub(crate) fn changes_from_wire(changes: wire::IterationChanges) -> Vec<FileChange> {
    changes
        .change_entries
        .into_iter()
        .filter_map(|entry| {
            let item = entry.item?;
            let path = item.path.filter(|p| !p.is_empty())?;
            let is_blob = match item.git_object_type {
                Some(kind) => kind.eq_ignore_ascii_case("blob"),
                None => !item.is_folder.unwrap_or(false),
            };

            Some(FileChange {
                path: path.trim_start_matches('/').to_string(),
                change_type: entry.change_type.unwrap_or_default(),
                is_blob,
                object_id: item.object_id,
                original_object_id: item.original_object_id,
            })
        })
        .collect()
}

/// Counts threads with at least one human comment; active and pending
/// threads are unresolved.
pub(crate) fn comment_counts_from_wire(threads: &[wire::CommentThread]) -> CommentCounts {
    let mut counts = CommentCounts::default();

    for thread in threads {
        if thread.is_deleted.unwrap_or(false) {
            continue;
        }
        let has_text = thread.comments.iter().any(|c| {
            !c.comment_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("system"))
        });
        if !has_text {
            continue;
        }

        counts.total += 1;
        if matches!(thread.status.as_deref(), Some("active") | Some("pending")) {
            counts.unresolved += 1;
        }
    }

    counts
}

/// Folds the status checks posted on a pull request into one build state
pub(crate) fn build_status_from_wire(statuses: &[wire::PullRequestStatus]) -> String {
    let states: Vec<String> = statuses
        .iter()
        .filter_map(|s| s.state.as_deref())
        .map(|s| s.to_lowercase())
        .filter(|s| s != "notset" && s != "notapplicable")
        .collect();

    if states.is_empty() {
        String::new()
    } else if states.iter().any(|s| s == "failed" || s == "error") {
        "failed".to_string()
    } else if states.iter().any(|s| s == "pending") {
        "inProgress".to_string()
    } else if states.iter().all(|s| s == "succeeded") {
        "succeeded".to_string()
    } else {
        "partiallySucceeded".to_string()
    }
}

fn placeholder_work_item(id: i32) -> WorkItem {
    WorkItem {
        id,
        title: format!("Work Item {id}"),
        kind: "WorkItem".to_string(),
        state: "Active".to_string(),
    }
}

#[async_trait]
impl PullRequestSource for AzureDevOpsClient {
    fn organization(&self) -> &str {
        &self.organization
    }

    async fn list_pull_requests(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Vec<PullRequestSummary>> {
        let mut url = self.repository_url(project, repository, &["pullrequests"])?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.status", "all");

        let response: wire::ListResponse<wire::GitPullRequest> = self.get_json(url).await?;
        tracing::info!(
            count = response.value.len(),
            project,
            repository,
            "listed pull requests"
        );

        Ok(response.value.into_iter().map(summary_from_wire).collect())
    }

    async fn changes(&self, project: &str, repository: &str, id: i32) -> Result<Vec<FileChange>> {
        let Some(iteration) = self.latest_iteration(project, repository, id).await? else {
            return Ok(Vec::new());
        };

        let iteration = iteration.to_string();
        let url = self.pull_request_url(
            project,
            repository,
            id,
            &["iterations", iteration.as_str(), "changes"],
        )?;
        let changes: wire::IterationChanges = self.get_json(url).await?;
        Ok(changes_from_wire(changes))
    }

    async fn reviewers(&self, project: &str, repository: &str, id: i32) -> Result<Vec<Reviewer>> {
        let url = self.pull_request_url(project, repository, id, &["reviewers"])?;
        let reviewers: wire::ListResponse<wire::IdentityRefWithVote> = self.get_json(url).await?;

        Ok(reviewers
            .value
            .into_iter()
            .map(|r| Reviewer {
                display_name: r.display_name.unwrap_or_default(),
                unique_name: r.unique_name.unwrap_or_default(),
                vote: r.vote,
                is_required: r.is_required.unwrap_or(false),
                has_declined: r.has_declined.unwrap_or(false),
            })
            .collect())
    }

    async fn work_items(&self, project: &str, repository: &str, id: i32) -> Result<Vec<WorkItem>> {
        let url = self.pull_request_url(project, repository, id, &["workitems"])?;
        let refs: wire::ListResponse<wire::ResourceRef> = self.get_json(url).await?;
        let ids: Vec<i32> = refs
            .value
            .iter()
            .filter_map(|r| r.id.parse().ok())
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Titles come from the work item tracking API; keep the references
        // if that part is not reachable with the current token
        match self.work_item_details(&ids).await {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::debug!(error = %e, id, "work item details unavailable");
                Ok(ids.into_iter().map(placeholder_work_item).collect())
            }
        }
    }

    async fn comment_counts(
        &self,
        project: &str,
        repository: &str,
        id: i32,
    ) -> Result<CommentCounts> {
        let url = self.pull_request_url(project, repository, id, &["threads"])?;
        let threads: wire::ListResponse<wire::CommentThread> = self.get_json(url).await?;
        Ok(comment_counts_from_wire(&threads.value))
    }

    async fn build_status(&self, project: &str, repository: &str, id: i32) -> Result<String> {
        let url = self.pull_request_url(project, repository, id, &["statuses"])?;
        let statuses: wire::ListResponse<wire::PullRequestStatus> = self.get_json(url).await?;
        Ok(build_status_from_wire(&statuses.value))
    }

    async fn blob_text(&self, project: &str, repository: &str, object_id: &str) -> Result<String> {
        let mut url = self.repository_url(project, repository, &["blobs", object_id])?;
        url.query_pairs_mut().append_pair("$format", "octetstream");

        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .context("Failed to read blob content")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
