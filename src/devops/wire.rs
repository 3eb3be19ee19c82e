//! JSON shapes returned by the Azure DevOps Git REST API (api-version 7.1).
//! Only the fields the loader reads are declared.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPullRequest {
    pub pull_request_id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<IdentityRef>,
    pub creation_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub closed_by: Option<IdentityRef>,
    pub source_ref_name: Option<String>,
    pub target_ref_name: Option<String>,
    pub is_draft: Option<bool>,
    pub merge_status: Option<String>,
    pub last_merge_source_commit: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRef {
    pub commit_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRefWithVote {
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
    #[serde(default)]
    pub vote: i32,
    pub is_required: Option<bool>,
    pub has_declined: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct Iteration {
    pub id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationChanges {
    #[serde(default)]
    pub change_entries: Vec<ChangeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub item: Option<ChangeItem>,
    pub change_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub path: Option<String>,
    pub object_id: Option<String>,
    pub original_object_id: Option<String>,
    pub git_object_type: Option<String>,
    pub is_folder: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub status: Option<String>,
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestStatus {
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkItemDetails {
    pub id: i32,
    #[serde(default)]
    pub fields: WorkItemFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkItemFields {
    #[serde(rename = "System.Title")]
    pub title: Option<String>,
    #[serde(rename = "System.WorkItemType")]
    pub work_item_type: Option<String>,
    #[serde(rename = "System.State")]
    pub state: Option<String>,
}
