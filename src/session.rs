//! Loaded pull requests and the filter applied to them.
//!
//! A refresh runs on its own tokio task. Starting another refresh aborts the
//! running one, and any result still tagged with an older generation is
//! discarded, so the collection always reflects the most recent request.

use crate::devops::{FetchQuery, PullRequest, PullRequestLoader};
use crate::error::AppError;
use crate::filter::{sort_newest_first, FilterEngine, FilterState, FilteredView};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct RefreshOutcome {
    generation: u64,
    result: Result<Vec<PullRequest>, AppError>,
}

/// What a completed refresh did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshStatus {
    Loaded(usize),
    Failed(String),
}

pub struct Session {
    loader: PullRequestLoader,
    query: FetchQuery,
    records: Arc<Vec<PullRequest>>,
    filter: FilterState,
    view: FilteredView,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    outcome_tx: mpsc::UnboundedSender<RefreshOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<RefreshOutcome>,
}

impl Session {
    pub fn new(loader: PullRequestLoader, query: FetchQuery, filter: FilterState) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            loader,
            query,
            records: Arc::new(Vec::new()),
            view: FilterEngine::apply(&[], &filter),
            filter,
            generation: 0,
            in_flight: None,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Starts a fetch, superseding any fetch still running
    pub fn refresh(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
            tracing::debug!(generation = self.generation, "superseded refresh");
        }

        self.generation += 1;
        let generation = self.generation;
        let loader = self.loader.clone();
        let query = self.query.clone();
        let tx = self.outcome_tx.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let result = loader.fetch(&query).await.map_err(AppError::Fetch);
            // The receiver only goes away with the session
            let _ = tx.send(RefreshOutcome { generation, result });
        }));
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies every finished refresh without blocking
    pub fn poll(&mut self) -> Option<RefreshStatus> {
        let mut status = None;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(applied) = self.apply_outcome(outcome) {
                status = Some(applied);
            }
        }
        status
    }

    /// Waits for the current refresh to finish
    #[cfg(test)]
    pub async fn wait(&mut self) -> Option<RefreshStatus> {
        while self.in_flight.is_some() {
            let outcome = self.outcome_rx.recv().await?;
            if let Some(status) = self.apply_outcome(outcome) {
                return Some(status);
            }
        }
        None
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) -> Option<RefreshStatus> {
        if outcome.generation != self.generation {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "dropping stale refresh"
            );
            return None;
        }
        self.in_flight = None;

        match outcome.result {
            Ok(mut records) => {
                sort_newest_first(&mut records);
                let count = records.len();
                self.records = Arc::new(records);
                self.recompute();
                Some(RefreshStatus::Loaded(count))
            }
            Err(e) => {
                tracing::error!(error = %e, "refresh failed");
                Some(RefreshStatus::Failed(e.to_string()))
            }
        }
    }

    #[cfg(test)]
    pub fn records(&self) -> Arc<Vec<PullRequest>> {
        Arc::clone(&self.records)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.recompute();
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    fn recompute(&mut self) {
        self.view = FilterEngine::apply(&self.records, &self.filter);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devops::loader::testing::{summary, FakeSource};
    use crate::devops::LoaderOptions;
    use std::time::Duration;

    fn session(source: FakeSource) -> Session {
        let loader = PullRequestLoader::new(Arc::new(source), LoaderOptions::default());
        Session::new(loader, FetchQuery::new("p", "r"), FilterState::default())
    }

    fn ids(session: &Session) -> Vec<i32> {
        session.view().records.iter().map(|pr| pr.id).collect()
    }

    #[tokio::test]
    async fn test_refresh_loads_newest_first() {
        let mut session = session(FakeSource::with(vec![summary(1, "Alice"), summary(3, "Bob")]));
        assert!(session.records().is_empty());

        session.refresh();
        assert!(session.is_loading());
        assert_eq!(session.wait().await, Some(RefreshStatus::Loaded(2)));
        assert!(!session.is_loading());
        assert_eq!(ids(&session), vec![3, 1]);
        assert_eq!(session.view().status_line(), "Loaded 2 pull requests");
    }

    #[tokio::test]
    async fn test_new_refresh_supersedes_running_one() {
        let mut session = session(FakeSource::scripted(vec![
            (Duration::from_millis(500), Some(vec![summary(1, "Alice")])),
            (Duration::from_millis(10), Some(vec![summary(2, "Bob")])),
        ]));

        session.refresh();
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.refresh();
        assert_eq!(session.wait().await, Some(RefreshStatus::Loaded(1)));
        assert_eq!(ids(&session), vec![2]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.poll(), None);
        assert_eq!(ids(&session), vec![2]);
    }

    #[tokio::test]
    async fn test_stale_outcome_is_dropped() {
        let mut session = session(FakeSource::with(vec![summary(1, "Alice")]));
        session.refresh();
        session.wait().await;

        let stale = RefreshOutcome {
            generation: 0,
            result: Ok(Vec::new()),
        };
        assert_eq!(session.apply_outcome(stale), None);
        assert_eq!(session.records().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_records() {
        let mut session = session(FakeSource::scripted(vec![
            (Duration::ZERO, Some(vec![summary(1, "Alice"), summary(2, "Bob")])),
            (Duration::ZERO, None),
        ]));

        session.refresh();
        session.wait().await;
        let before = session.records();

        session.refresh();
        match session.wait().await {
            Some(RefreshStatus::Failed(message)) => {
                assert!(message.starts_with("Error loading pull requests"));
                assert!(message.contains("network unreachable"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(Arc::ptr_eq(&before, &session.records()));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_filter_changes_recompute_view() {
        let mut session = session(FakeSource::with(vec![
            summary(1, "Alice"),
            summary(2, "Bob"),
            summary(3, "Alice"),
        ]));
        session.refresh();
        session.wait().await;

        session.set_filter(FilterState::default().with_author("alice"));
        assert_eq!(ids(&session), vec![3, 1]);
        assert_eq!(session.view().status_line(), "Showing 2 of 3 pull requests");

        session.set_filter(FilterState::default());
        assert_eq!(session.view().filtered, 3);
        assert_eq!(session.records().len(), 3);
    }
}
