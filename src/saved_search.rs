//! Named filter definitions persisted with the settings.

use crate::error::ValidationError;
use crate::filter::{FilterState, StatusFilter};
use crate::settings::{Settings, SettingsStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named snapshot of every filter dimension.
///
/// Stored flat so the settings file stays hand-editable. Never mutated after
/// creation; `id` is assigned by the store and identifies the search on delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    /// Zero until the settings are normalized
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub target_branch: String,
    #[serde(default)]
    pub search_text: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub min_changes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_date: DateTime<Utc>,
}

fn default_status() -> String {
    "All".to_string()
}

impl SavedSearch {
    pub fn filter_state(&self) -> FilterState {
        FilterState::default()
            .with_author(self.author.clone())
            .with_target_branch(self.target_branch.clone())
            .with_search_text(self.search_text.clone())
            .with_status(StatusFilter::parse(&self.status))
            .with_from_date(self.from_date)
            .with_file_extension(self.file_extension.clone())
            .with_min_changes(self.min_changes)
    }
}

/// Orders searches by name, byte-wise, keeping insertion order for ties
pub fn sorted(searches: &[SavedSearch]) -> Vec<&SavedSearch> {
    let mut sorted: Vec<&SavedSearch> = searches.iter().collect();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    sorted
}

/// Mutates the saved searches held by [`Settings`], persisting after each change
pub struct SavedSearchStore<'a, S: SettingsStore + ?Sized> {
    settings: &'a mut Settings,
    persistence: &'a S,
}

impl<'a, S: SettingsStore + ?Sized> SavedSearchStore<'a, S> {
    pub fn new(settings: &'a mut Settings, persistence: &'a S) -> Self {
        Self {
            settings,
            persistence,
        }
    }

    pub fn list(&self) -> Vec<&SavedSearch> {
        sorted(&self.settings.saved_searches)
    }

    pub fn find(&self, name: &str) -> Option<&SavedSearch> {
        let name = name.trim();
        self.list().into_iter().find(|s| s.name == name)
    }

    pub fn save(&mut self, name: &str, state: &FilterState) -> Result<SavedSearch, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let id = self.settings.next_saved_search_id.max(1);
        self.settings.next_saved_search_id = id + 1;

        let search = SavedSearch {
            id,
            name: name.to_string(),
            author: state.author.clone(),
            target_branch: state.target_branch.clone(),
            search_text: state.search_text.clone(),
            status: state.status.label().to_string(),
            file_extension: state.file_extension.clone(),
            min_changes: state.min_changes,
            from_date: state.from_date,
            created_date: Utc::now(),
        };

        self.settings.saved_searches.push(search.clone());
        self.persistence.save(self.settings);
        tracing::info!(name = %search.name, id, "saved search");

        Ok(search)
    }

    pub fn delete(&mut self, search: &SavedSearch) {
        let before = self.settings.saved_searches.len();
        self.settings.saved_searches.retain(|s| s.id != search.id);

        if self.settings.saved_searches.len() != before {
            tracing::info!(name = %search.name, id = search.id, "deleted saved search");
        }
        self.persistence.save(self.settings);
    }

    pub fn apply(&self, search: &SavedSearch) -> FilterState {
        search.filter_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;
    use chrono::TimeZone;

    fn full_state() -> FilterState {
        FilterState::default()
            .with_author("Alice")
            .with_target_branch("main")
            .with_search_text("login")
            .with_status(StatusFilter::parse("Active"))
            .with_from_date(Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()))
            .with_file_extension("cs")
            .with_min_changes(3)
    }

    #[test]
    fn test_save_then_apply_restores_every_dimension() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);

        let state = full_state();
        let saved = store.save("Reviews", &state).unwrap();

        assert_eq!(store.apply(&saved), state);
        assert_eq!(persistence.load().saved_searches, vec![saved]);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);
        let saved = store.save("Reviews", &full_state()).unwrap();

        let text = toml::to_string_pretty(&settings).unwrap();
        let reloaded: Settings = toml::from_str(&text).unwrap();
        assert_eq!(reloaded.saved_searches[0].filter_state(), full_state());
        assert_eq!(reloaded.saved_searches[0].id, saved.id);
    }

    #[test]
    fn test_list_is_ordinal() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);

        for name in ["Zeta", "alpha", "Mid"] {
            store.save(name, &FilterState::default()).unwrap();
        }

        let names: Vec<&str> = store.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Zeta", "alpha"]);
    }

    #[test]
    fn test_duplicate_names_keep_insertion_order() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);

        let first = store
            .save("Same", &FilterState::default().with_author("first"))
            .unwrap();
        let second = store
            .save("Same", &FilterState::default().with_author("second"))
            .unwrap();
        assert_ne!(first.id, second.id);

        let listed = store.list();
        assert_eq!(listed[0].author, "first");
        assert_eq!(listed[1].author, "second");
        assert_eq!(store.find("Same").unwrap().id, first.id);

        store.delete(&second);
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id, first.id);
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);

        assert_eq!(
            store.save("", &FilterState::default()),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            store.save("   ", &FilterState::default()),
            Err(ValidationError::EmptyName)
        );
        assert!(store.list().is_empty());
        assert!(persistence.load().saved_searches.is_empty());
    }

    #[test]
    fn test_names_are_trimmed() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);

        let saved = store.save("  Weekly  ", &FilterState::default()).unwrap();
        assert_eq!(saved.name, "Weekly");
        assert!(store.find(" Weekly ").is_some());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        let mut store = SavedSearchStore::new(&mut settings, &persistence);
        store.save("Keep", &FilterState::default()).unwrap();

        let stranger = SavedSearch {
            id: 99,
            name: "Keep".to_string(),
            ..SavedSearch::default()
        };
        store.delete(&stranger);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_ids_survive_reload() {
        let persistence = MemorySettingsStore::default();
        let mut settings = Settings::default();
        {
            let mut store = SavedSearchStore::new(&mut settings, &persistence);
            store.save("a", &FilterState::default()).unwrap();
            store.save("b", &FilterState::default()).unwrap();
        }

        let mut reloaded = persistence.load();
        let mut store = SavedSearchStore::new(&mut reloaded, &persistence);
        let third = store.save("c", &FilterState::default()).unwrap();
        assert_eq!(third.id, 3);
    }
}
