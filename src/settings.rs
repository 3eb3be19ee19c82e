use crate::credentials::{CredentialCipher, LocalKeyCipher};
use crate::diff::stats::LineStatsMode;
use crate::filter::FilterState;
use crate::keybindings::KeyBindings;
use crate::saved_search::SavedSearch;
use crate::theme::{Theme, DEFAULT_THEME};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

/// Number of toggleable columns in the pull request list
pub const COLUMN_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub repository: String,
    /// Plain text in memory; the file store encrypts it on disk
    #[serde(default)]
    pub personal_access_token: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub line_stats: LineStatsMode,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_column_visibility")]
    pub column_visibility: Vec<bool>,
    #[serde(default = "default_next_saved_search_id")]
    pub next_saved_search_id: u64,
    #[serde(default)]
    pub filters: LastFilters,
    #[serde(default)]
    pub window: WindowPlacement,
    #[serde(default)]
    pub keybindings: KeyBindings,
    #[serde(default)]
    pub saved_searches: Vec<SavedSearch>,
}

/// Filters remembered from the previous session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastFilters {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub target_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
}

impl LastFilters {
    pub fn remember(state: &FilterState) -> Self {
        Self {
            author: state.author.clone(),
            target_branch: state.target_branch.clone(),
            from_date: state.from_date,
        }
    }

    pub fn to_filter_state(&self) -> FilterState {
        FilterState::default()
            .with_author(self.author.clone())
            .with_target_branch(self.target_branch.clone())
            .with_from_date(self.from_date)
    }
}

/// Last known browser dimensions, in terminal cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowPlacement {
    #[serde(default)]
    pub width: u16,
    #[serde(default)]
    pub height: u16,
    #[serde(default)]
    pub left: u16,
    #[serde(default)]
    pub top: u16,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_column_visibility() -> Vec<bool> {
    vec![true; COLUMN_COUNT]
}

fn default_next_saved_search_id() -> u64 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            repository: String::new(),
            personal_access_token: String::new(),
            theme: default_theme(),
            line_stats: LineStatsMode::default(),
            concurrency: default_concurrency(),
            column_visibility: default_column_visibility(),
            next_saved_search_id: default_next_saved_search_id(),
            filters: LastFilters::default(),
            window: WindowPlacement::default(),
            keybindings: KeyBindings::default(),
            saved_searches: Vec::new(),
        }
    }
}

impl Settings {
    /// Pads or truncates column flags to [`COLUMN_COUNT`]; new columns are visible
    pub fn normalize(&mut self) {
        self.column_visibility.resize(COLUMN_COUNT, true);
        if self.concurrency == 0 {
            self.concurrency = default_concurrency();
        }
        let max_id = self.saved_searches.iter().map(|s| s.id).max().unwrap_or(0);
        if self.next_saved_search_id <= max_id {
            self.next_saved_search_id = max_id + 1;
        }
        // Hand-written entries may omit the id
        for search in self.saved_searches.iter_mut().filter(|s| s.id == 0) {
            search.id = self.next_saved_search_id;
            self.next_saved_search_id += 1;
        }
    }

    pub fn column_visible(&self, index: usize) -> bool {
        self.column_visibility.get(index).copied().unwrap_or(true)
    }

    pub fn toggle_column(&mut self, index: usize) {
        if let Some(flag) = self.column_visibility.get_mut(index) {
            *flag = !*flag;
        }
    }

    pub fn get_theme(&self) -> Result<Theme> {
        Theme::load(&self.theme)
    }

    /// Moves to the next theme file in `themes_dir`, in name order
    pub fn cycle_theme(&mut self, themes_dir: &Path) -> Result<()> {
        let themes = Theme::list_available_themes(themes_dir)?;
        if themes.is_empty() {
            return Ok(());
        }

        let current_index = themes.iter().position(|t| t == &self.theme).unwrap_or(0);
        let next_index = (current_index + 1) % themes.len();
        self.theme = themes[next_index].clone();
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/azpr`, falling back to `~/.config/azpr`
pub fn config_dir() -> PathBuf {
    let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        PathBuf::from(".")
    };

    config_dir.join("azpr")
}

/// Best-effort persistence of [`Settings`].
///
/// Failures are logged: a broken file loads as defaults and a failed write
/// leaves the previous file in place.
pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings);
}

impl<T: SettingsStore + ?Sized> SettingsStore for Arc<T> {
    fn load(&self) -> Settings {
        (**self).load()
    }

    fn save(&self, settings: &Settings) {
        (**self).save(settings)
    }
}

/// TOML settings file with the credential encrypted at rest
pub struct FileSettingsStore {
    path: PathBuf,
    cipher: Box<dyn CredentialCipher>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, cipher: Box<dyn CredentialCipher>) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    /// Store at the XDG config path, keyed by `credential.key` beside it
    pub fn open_default() -> Self {
        let dir = config_dir();
        let cipher = LocalKeyCipher::new(dir.join("credential.key"));
        Self::new(dir.join("config.toml"), Box::new(cipher))
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).context("Failed to read settings file")?;
        let mut settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;

        settings.personal_access_token = self.cipher.decrypt(&settings.personal_access_token);
        settings.normalize();
        Ok(Some(settings))
    }

    fn try_save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let mut stored = settings.clone();
        stored.personal_access_token = self.cipher.encrypt(&settings.personal_access_token);

        let content = toml::to_string_pretty(&stored).context("Failed to serialize settings")?;
        fs::write(&self.path, content).context("Failed to write settings file")?;

        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::debug!(path = ?self.path, "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %format!("{e:#}"), "using default settings");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) {
        if let Err(e) = self.try_save(settings) {
            tracing::warn!(path = ?self.path, error = %format!("{e:#}"), "settings not saved");
        }
    }
}

/// Keeps settings in memory
#[cfg(test)]
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

#[cfg(test)]
impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[cfg(test)]
impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Settings {
        match self.settings.lock() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, settings: &Settings) {
        match self.settings.lock() {
            Ok(mut stored) => *stored = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }
    }
}
