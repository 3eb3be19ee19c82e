//! Filtering of loaded pull requests.
//!
//! A [`FilterState`] is an immutable snapshot of every filter dimension.
//! Empty, absent or non-positive parameters disable their dimension, so the
//! default state lets every record through.

use crate::devops::PullRequest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status dimension of a filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Token(String),
}

impl StatusFilter {
    /// Statuses offered by the browser, in cycling order
    pub const CHOICES: [&'static str; 5] = ["All", "Active", "Completed", "Abandoned", "Draft"];

    /// Parses user input; empty text and "All" disable the dimension
    pub fn parse(input: &str) -> Self {
        let token = input.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::Token(token.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Token(token) => token,
        }
    }

    /// Next entry of [`Self::CHOICES`]; unknown tokens restart at "All"
    pub fn cycle(&self) -> Self {
        let current = Self::CHOICES
            .iter()
            .position(|c| c.eq_ignore_ascii_case(self.label()));
        let next = match current {
            Some(i) => (i + 1) % Self::CHOICES.len(),
            None => 0,
        };
        Self::parse(Self::CHOICES[next])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub author: String,
    pub target_branch: String,
    pub search_text: String,
    pub status: StatusFilter,
    pub from_date: Option<DateTime<Utc>>,
    pub file_extension: String,
    pub min_changes: i64,
}

impl FilterState {
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_target_branch(mut self, branch: impl Into<String>) -> Self {
        self.target_branch = branch.into();
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_from_date(mut self, from: Option<DateTime<Utc>>) -> Self {
        self.from_date = from;
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn with_min_changes(mut self, min: i64) -> Self {
        self.min_changes = min;
        self
    }

    /// Takes the raw text of a min-changes input. Anything that is not an
    /// integer disables the dimension instead of failing.
    pub fn with_min_changes_input(self, input: &str) -> Self {
        let min = input.trim().parse::<i64>().unwrap_or(0);
        self.with_min_changes(min)
    }

    /// Takes a `YYYY-MM-DD` date; unparsable input disables the dimension.
    pub fn with_from_date_input(self, input: &str) -> Self {
        self.with_from_date(parse_date(input))
    }

    /// True when every dimension is disabled
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.author.trim().is_empty()
            && self.target_branch.trim().is_empty()
            && self.search_text.trim().is_empty()
            && self.status == StatusFilter::All
            && self.from_date.is_none()
            && self.file_extension.trim().is_empty()
            && self.min_changes <= 0
    }
}

/// Start of the given day in UTC
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// One predicate per filter dimension. Each returns `true` when its
/// parameter is disabled.
pub mod predicates {
    use super::*;

    fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    pub fn author(pr: &PullRequest, author: &str) -> bool {
        let author = author.trim();
        author.is_empty() || contains_ignore_case(&pr.created_by, author)
    }

    pub fn target_branch(pr: &PullRequest, branch: &str) -> bool {
        let branch = branch.trim();
        branch.is_empty() || contains_ignore_case(&pr.target_branch, branch)
    }

    pub fn free_text(pr: &PullRequest, text: &str) -> bool {
        let text = text.trim();
        text.is_empty()
            || contains_ignore_case(&pr.title, text)
            || contains_ignore_case(&pr.created_by, text)
            || contains_ignore_case(&pr.description, text)
    }

    /// Substring match, so "active" also accepts a status like "inactive".
    /// Kept loose for compatibility with saved searches.
    ///
    /// Azure DevOps reports drafts as `active` with `isDraft` set, so a
    /// "draft" token also accepts any pull request flagged as a draft.
    pub fn status(pr: &PullRequest, status: &StatusFilter) -> bool {
        match status {
            StatusFilter::All => true,
            StatusFilter::Token(token) => {
                let token = token.trim();
                contains_ignore_case(&pr.status, token)
                    || (pr.is_draft && token.eq_ignore_ascii_case("draft"))
            }
        }
    }

    pub fn from_date(pr: &PullRequest, from: Option<DateTime<Utc>>) -> bool {
        from.map_or(true, |from| pr.created_date >= from)
    }

    pub fn file_extension(pr: &PullRequest, extension: &str) -> bool {
        let extension = extension.trim();
        if extension.is_empty() {
            return true;
        }

        let normalized = if extension.starts_with('.') {
            extension.to_lowercase()
        } else {
            format!(".{}", extension.to_lowercase())
        };

        pr.modified_files
            .iter()
            .any(|file| file.to_lowercase().ends_with(&normalized))
    }

    pub fn min_changes(pr: &PullRequest, min: i64) -> bool {
        min <= 0 || pr.changed_files() as i64 >= min
    }
}

/// Result of one filter pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub records: Vec<PullRequest>,
    pub filtered: usize,
    pub total: usize,
}

impl FilteredView {
    pub fn status_line(&self) -> String {
        if self.filtered == self.total {
            format!("Loaded {} pull requests", self.total)
        } else {
            format!("Showing {} of {} pull requests", self.filtered, self.total)
        }
    }
}

pub struct FilterEngine;

impl FilterEngine {
    pub fn matches(pr: &PullRequest, state: &FilterState) -> bool {
        predicates::free_text(pr, &state.search_text)
            && predicates::author(pr, &state.author)
            && predicates::target_branch(pr, &state.target_branch)
            && predicates::status(pr, &state.status)
            && predicates::from_date(pr, state.from_date)
            && predicates::file_extension(pr, &state.file_extension)
            && predicates::min_changes(pr, state.min_changes)
    }

    /// Keeps the records accepted by every enabled predicate, in input order
    pub fn apply(records: &[PullRequest], state: &FilterState) -> FilteredView {
        let kept: Vec<PullRequest> = records
            .iter()
            .filter(|pr| Self::matches(pr, state))
            .cloned()
            .collect();

        tracing::debug!(kept = kept.len(), total = records.len(), "applied filters");

        FilteredView {
            filtered: kept.len(),
            total: records.len(),
            records: kept,
        }
    }
}

/// Presentation order used when a collection is first shown
pub fn sort_newest_first(records: &mut [PullRequest]) {
    records.sort_by(|a, b| b.created_date.cmp(&a.created_date));
}

/// Preset filter combinations offered as one-key shortcuts
pub mod quick {
    use super::*;

    fn active() -> StatusFilter {
        StatusFilter::Token("Active".to_string())
    }

    pub fn my_prs(state: FilterState, user: &str) -> FilterState {
        state.with_author(user).with_status(active())
    }

    pub fn active_only(state: FilterState) -> FilterState {
        state.with_status(active()).with_author("")
    }

    pub fn needs_review(state: FilterState) -> FilterState {
        state.with_status(active()).with_search_text("needs review")
    }

    pub fn approved(state: FilterState) -> FilterState {
        state.with_status(active()).with_search_text("approved")
    }

    pub fn clear() -> FilterState {
        FilterState::default()
    }

    /// Login name of the local user, used by [`my_prs`]
    pub fn current_user() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devops::models::fixtures::pull_request;
    use chrono::TimeZone;

    fn ids(records: &[PullRequest]) -> Vec<i32> {
        records.iter().map(|pr| pr.id).collect()
    }

    fn sample() -> Vec<PullRequest> {
        let mut one = pull_request(1);
        one.created_by = "Alice".into();
        one.status = "active".into();
        one.modified_files = vec!["a.cs".into(), "b.cs".into()];

        let mut two = pull_request(2);
        two.created_by = "Bob".into();
        two.status = "completed".into();
        two.modified_files = vec!["b.ts".into(); 5];
        two.title = "Fix login".into();
        two.target_branch = "refs/heads/release".into();

        let mut three = pull_request(3);
        three.created_by = "Alice".into();
        three.status = "active".into();
        three.description = "Needs review soon".into();

        vec![one, two, three]
    }

    fn each_dimension() -> Vec<FilterState> {
        vec![
            FilterState::default().with_author("alice"),
            FilterState::default().with_target_branch("release"),
            FilterState::default().with_search_text("login"),
            FilterState::default().with_status(StatusFilter::parse("Active")),
            FilterState::default()
                .with_from_date(Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())),
            FilterState::default().with_file_extension("cs"),
            FilterState::default().with_min_changes(2),
        ]
    }

    fn combine(a: &FilterState, b: &FilterState) -> FilterState {
        FilterState {
            author: if a.author.is_empty() {
                b.author.clone()
            } else {
                a.author.clone()
            },
            target_branch: if a.target_branch.is_empty() {
                b.target_branch.clone()
            } else {
                a.target_branch.clone()
            },
            search_text: if a.search_text.is_empty() {
                b.search_text.clone()
            } else {
                a.search_text.clone()
            },
            status: if a.status == StatusFilter::All {
                b.status.clone()
            } else {
                a.status.clone()
            },
            from_date: a.from_date.or(b.from_date),
            file_extension: if a.file_extension.is_empty() {
                b.file_extension.clone()
            } else {
                a.file_extension.clone()
            },
            min_changes: a.min_changes.max(b.min_changes),
        }
    }

    #[test]
    fn test_empty_state_is_identity() {
        let records = sample();
        let view = FilterEngine::apply(&records, &FilterState::default());
        assert_eq!(view.records, records);
        assert_eq!((view.filtered, view.total), (3, 3));
        assert_eq!(view.status_line(), "Loaded 3 pull requests");
    }

    #[test]
    fn test_disabled_parameters_are_identity() {
        let records = sample();
        let disabled = [
            FilterState::default().with_author("   "),
            FilterState::default().with_status(StatusFilter::parse("all")),
            FilterState::default().with_file_extension(""),
            FilterState::default().with_min_changes(0),
            FilterState::default().with_min_changes(-4),
            FilterState::default().with_from_date(None),
        ];
        for state in disabled {
            assert_eq!(FilterEngine::apply(&records, &state).records, records);
        }
    }

    #[test]
    fn test_conjunction_equals_sequential_application() {
        let records = sample();
        let dimensions = each_dimension();
        for a in &dimensions {
            for b in &dimensions {
                let combined = FilterEngine::apply(&records, &combine(a, b));
                let first = FilterEngine::apply(&records, a);
                let sequential = FilterEngine::apply(&first.records, b);
                assert_eq!(ids(&combined.records), ids(&sequential.records));
            }
        }
    }

    #[test]
    fn test_file_extension_normalization() {
        let records = sample();
        let bare = FilterEngine::apply(&records, &FilterState::default().with_file_extension("cs"));
        let dotted =
            FilterEngine::apply(&records, &FilterState::default().with_file_extension(".CS"));
        assert_eq!(ids(&bare.records), vec![1]);
        assert_eq!(bare.records, dotted.records);
    }

    #[test]
    fn test_min_changes_is_inclusive() {
        let records = sample();
        let view = FilterEngine::apply(&records, &FilterState::default().with_min_changes(2));
        assert_eq!(ids(&view.records), vec![1, 2]);
        assert_eq!(view.status_line(), "Showing 2 of 3 pull requests");
    }

    #[test]
    fn test_malformed_min_changes_disables() {
        let records = sample();
        let state = FilterState::default().with_min_changes_input("five");
        assert_eq!(state.min_changes, 0);
        assert_eq!(FilterEngine::apply(&records, &state).filtered, 3);

        let state = FilterState::default().with_min_changes_input(" 3 ");
        assert_eq!(ids(&FilterEngine::apply(&records, &state).records), vec![2]);
    }

    #[test]
    fn test_from_date_is_inclusive() {
        let mut records = sample();
        let boundary = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        records[0].created_date = boundary;
        records[1].created_date = boundary - chrono::Duration::seconds(1);
        records[2].created_date = boundary + chrono::Duration::days(1);

        let view =
            FilterEngine::apply(&records, &FilterState::default().with_from_date(Some(boundary)));
        assert_eq!(ids(&view.records), vec![1, 3]);
    }

    #[test]
    fn test_status_matches_as_substring() {
        let mut records = sample();
        records[2].status = "inactive".into();
        let view = FilterEngine::apply(
            &records,
            &FilterState::default().with_status(StatusFilter::parse("ACTIVE")),
        );
        assert_eq!(ids(&view.records), vec![1, 3]);
    }

    #[test]
    fn test_draft_status_matches_draft_flag() {
        let mut records = sample();
        records[0].is_draft = true;
        let view = FilterEngine::apply(
            &records,
            &FilterState::default().with_status(StatusFilter::parse("draft")),
        );
        assert_eq!(ids(&view.records), vec![1]);
        assert_eq!(records[0].status, "active");

        let active = FilterEngine::apply(
            &records,
            &FilterState::default().with_status(StatusFilter::parse("Active")),
        );
        assert!(ids(&active.records).contains(&1));
    }

    #[test]
    fn test_free_text_searches_title_author_and_description() {
        let records = sample();
        let by_title = FilterState::default().with_search_text("LOGIN");
        let by_author = FilterState::default().with_search_text("bob");
        let by_description = FilterState::default().with_search_text("needs review");
        assert_eq!(ids(&FilterEngine::apply(&records, &by_title).records), vec![2]);
        assert_eq!(ids(&FilterEngine::apply(&records, &by_author).records), vec![2]);
        assert_eq!(ids(&FilterEngine::apply(&records, &by_description).records), vec![3]);
    }

    #[test]
    fn test_author_and_min_changes_scenario() {
        let mut one = pull_request(1);
        one.created_by = "Alice".into();
        one.status = "active".into();
        one.modified_files = vec!["a.cs".into(), "a.cs".into()];

        let mut two = pull_request(2);
        two.created_by = "Bob".into();
        two.status = "completed".into();
        two.modified_files = vec!["b.ts".into(); 5];

        let mut three = pull_request(3);
        three.created_by = "Alice".into();
        three.status = "active".into();

        let records = vec![one, two, three];
        let state = FilterState::default()
            .with_author("alice")
            .with_min_changes(1);
        let view = FilterEngine::apply(&records, &state);
        assert_eq!(ids(&view.records), vec![1]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_status_cycle() {
        let status = StatusFilter::All.cycle();
        assert_eq!(status, StatusFilter::Token("Active".into()));
        assert_eq!(StatusFilter::parse("Draft").cycle(), StatusFilter::All);
        assert_eq!(StatusFilter::parse("weird").cycle(), StatusFilter::All);
    }

    #[test]
    fn test_quick_filters() {
        let state = quick::my_prs(FilterState::default().with_search_text("x"), "alice");
        assert_eq!(state.author, "alice");
        assert_eq!(state.status, StatusFilter::Token("Active".into()));
        assert_eq!(state.search_text, "x");

        let state = quick::active_only(state);
        assert!(state.author.is_empty());

        let state = quick::needs_review(FilterState::default());
        assert_eq!(state.search_text, "needs review");
        assert!(quick::clear().is_empty());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records = sample();
        records[0].created_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        records[1].created_date = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        records[2].created_date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        sort_newest_first(&mut records);
        assert_eq!(ids(&records), vec![2, 3, 1]);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("yesterday"), None);
        let state = FilterState::default().with_from_date_input("");
        assert!(state.from_date.is_none());
    }
}
