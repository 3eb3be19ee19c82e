#[cfg(test)]
mod tests {
    use super::super::client::*;
    use super::super::wire;

    #[test]
    fn test_parse_repository_url() {
        let parsed =
            AzureDevOpsClient::parse_repository_url("https://dev.azure.com/contoso/Web/_git/site")
                .unwrap();
        assert_eq!(parsed.organization, "contoso");
        assert_eq!(parsed.project, "Web");
        assert_eq!(parsed.repository, "site");
        assert_eq!(parsed.pull_request, None);

        let parsed = AzureDevOpsClient::parse_repository_url(
            "https://dev.azure.com/contoso/My%20Project/_git/api/pullrequest/512?_a=files",
        )
        .unwrap();
        assert_eq!(parsed.project, "My Project");
        assert_eq!(parsed.repository, "api");
        assert_eq!(parsed.pull_request, Some(512));
    }

    #[test]
    fn test_parse_legacy_repository_url() {
        let parsed = AzureDevOpsClient::parse_repository_url(
            "https://fabrikam.visualstudio.com/DefaultCollection/Tools/_git/cli",
        )
        .unwrap();
        assert_eq!(parsed.organization, "fabrikam");
        assert_eq!(parsed.project, "Tools");
        assert_eq!(parsed.repository, "cli");
    }

    #[test]
    fn test_invalid_repository_url() {
        let result = AzureDevOpsClient::parse_repository_url("https://github.com/rust-lang/rust");
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_from_wire() {
        let json = r#"{
            "pullRequestId": 42,
            "title": "Add retries",
            "status": "active",
            "createdBy": { "displayName": "Alice Smith", "uniqueName": "alice@contoso.com" },
            "creationDate": "2024-05-02T10:15:30.123Z",
            "sourceRefName": "refs/heads/feature/retries",
            "targetRefName": "refs/heads/main",
            "isDraft": true,
            "mergeStatus": "conflicts",
            "lastMergeSourceCommit": { "commitId": "abc123" }
        }"#;
        let pr: wire::GitPullRequest = serde_json::from_str(json).unwrap();
        let summary = summary_from_wire(pr);

        assert_eq!(summary.id, 42);
        assert_eq!(summary.created_by, "Alice Smith");
        assert_eq!(summary.description, "");
        assert!(summary.is_draft);
        assert!(summary.has_merge_conflicts);
        assert_eq!(summary.completed_date, None);
        assert_eq!(summary.closed_by, "");
        assert_eq!(summary.source_commit.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_changes_from_wire() {
        let json = r#"{
            "changeEntries": [
                { "changeType": "edit", "item": { "path": "/src/main.rs", "objectId": "n1", "originalObjectId": "o1", "gitObjectType": "blob" } },
                { "changeType": "add", "item": { "path": "/docs", "isFolder": true } },
                { "changeType": "delete", "item": { "path": "/old.txt", "originalObjectId": "o2" } },
                { "changeType": "edit", "item": { "path": "" } },
                { "changeType": "edit" }
            ]
        }"#;
        let changes: wire::IterationChanges = serde_json::from_str(json).unwrap();
        let changes = changes_from_wire(changes);

        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs", "docs", "old.txt"]);
        assert!(changes[0].is_blob);
        assert!(!changes[1].is_blob);
        assert!(changes[2].is_blob);
        assert!(changes[2].is_delete());
    }

    #[test]
    fn test_comment_counts_skip_system_and_deleted_threads() {
        let json = r#"[
            { "status": "active", "comments": [ { "commentType": "text" } ] },
            { "status": "fixed", "comments": [ { "commentType": "text" } ] },
            { "status": "pending", "comments": [ { "commentType": "text" } ] },
            { "comments": [ { "commentType": "system" } ] },
            { "status": "active", "isDeleted": true, "comments": [ { "commentType": "text" } ] }
        ]"#;
        let threads: Vec<wire::CommentThread> = serde_json::from_str(json).unwrap();
        let counts = comment_counts_from_wire(&threads);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.unresolved, 2);
    }

    #[test]
    fn test_build_status_from_wire() {
        let statuses = |states: &[&str]| -> Vec<wire::PullRequestStatus> {
            states
                .iter()
                .map(|s| wire::PullRequestStatus {
                    state: Some(s.to_string()),
                })
                .collect()
        };

        assert_eq!(build_status_from_wire(&[]), "");
        assert_eq!(build_status_from_wire(&statuses(&["succeeded"])), "succeeded");
        assert_eq!(
            build_status_from_wire(&statuses(&["succeeded", "pending"])),
            "inProgress"
        );
        assert_eq!(
            build_status_from_wire(&statuses(&["succeeded", "error"])),
            "failed"
        );
        assert_eq!(build_status_from_wire(&statuses(&["notSet"])), "");
    }
}
