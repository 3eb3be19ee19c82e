use crate::{
    devops::PullRequest,
    error::AppError,
    events::Action,
    filter::{parse_date, quick, FilterState},
    saved_search::{self, SavedSearch, SavedSearchStore},
    session::{RefreshStatus, Session},
    settings::{LastFilters, Settings, SettingsStore},
    theme::Theme,
};
use anyhow::Result;
use std::path::PathBuf;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{ListState, TableState};

const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusedPane {
    List,
    Detail,
}

/// Filter dimensions edited through a text prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterField {
    Author,
    TargetBranch,
    Search,
    FromDate,
    Extension,
    MinChanges,
}

impl FilterField {
    pub fn label(self) -> &'static str {
        match self {
            FilterField::Author => "Author",
            FilterField::TargetBranch => "Target",
            FilterField::Search => "Search",
            FilterField::FromDate => "From",
            FilterField::Extension => "Ext",
            FilterField::MinChanges => "Min files",
        }
    }

    /// Text shown for the dimension, also the initial prompt contents
    pub fn current(self, state: &FilterState) -> String {
        match self {
            FilterField::Author => state.author.clone(),
            FilterField::TargetBranch => state.target_branch.clone(),
            FilterField::Search => state.search_text.clone(),
            FilterField::FromDate => state
                .from_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            FilterField::Extension => state.file_extension.clone(),
            FilterField::MinChanges if state.min_changes > 0 => state.min_changes.to_string(),
            FilterField::MinChanges => String::new(),
        }
    }

    fn apply(self, state: FilterState, input: &str) -> FilterState {
        match self {
            FilterField::Author => state.with_author(input.trim()),
            FilterField::TargetBranch => state.with_target_branch(input.trim()),
            FilterField::Search => state.with_search_text(input.trim()),
            FilterField::FromDate => state.with_from_date_input(input),
            FilterField::Extension => state.with_file_extension(input.trim()),
            FilterField::MinChanges => state.with_min_changes_input(input),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Editing(FilterField),
    SearchName,
    SavedSearches,
}

pub struct App {
    pub session: Session,
    pub settings: Settings,
    persistence: Box<dyn SettingsStore>,
    pub theme: Theme,
    pub focused_pane: FocusedPane,
    pub input_mode: InputMode,
    /// Contents of the open text prompt
    pub input: String,
    pub table_state: TableState,
    pub saved_state: ListState,
    pub detail_scroll: u16,
    pub status_message: String,
    pub should_quit: bool,
    current_user: String,
    themes_dir: PathBuf,
}

impl App {
    pub fn new(
        session: Session,
        settings: Settings,
        persistence: Box<dyn SettingsStore>,
        theme: Theme,
    ) -> Self {
        Self {
            session,
            settings,
            persistence,
            theme,
            focused_pane: FocusedPane::List,
            input_mode: InputMode::Normal,
            input: String::new(),
            table_state: TableState::default(),
            saved_state: ListState::default(),
            detail_scroll: 0,
            status_message: String::new(),
            should_quit: false,
            current_user: quick::current_user(),
            themes_dir: Theme::themes_dir(),
        }
    }

    pub fn start_refresh(&mut self) {
        self.session.refresh();
        self.status_message = "Loading pull requests...".to_string();
    }

    /// Picks up finished refreshes
    pub fn on_tick(&mut self) {
        match self.session.poll() {
            Some(RefreshStatus::Loaded(_)) => {
                self.status_message = self.session.view().status_line();
                self.clamp_selection();
            }
            Some(RefreshStatus::Failed(message)) => self.status_message = message,
            None => {}
        }
    }

    pub fn status_text(&self) -> &str {
        if self.session.is_loading() {
            "Loading pull requests..."
        } else {
            &self.status_message
        }
    }

    pub fn records(&self) -> &[PullRequest] {
        &self.session.view().records
    }

    pub fn selected_pull_request(&self) -> Option<&PullRequest> {
        self.table_state
            .selected()
            .and_then(|i| self.records().get(i))
    }

    pub fn saved_searches(&self) -> Vec<&SavedSearch> {
        saved_search::sorted(&self.settings.saved_searches)
    }

    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.quit(),
            Action::NavigateUp => self.move_by(-1),
            Action::NavigateDown => self.move_by(1),
            Action::PageUp => self.move_by(-(PAGE_SIZE as isize)),
            Action::PageDown => self.move_by(PAGE_SIZE as isize),
            Action::Home => self.move_to(0),
            Action::End => self.move_to(usize::MAX),
            Action::ToggleFocus => self.toggle_focus(),
            Action::Refresh => self.start_refresh(),
            Action::CycleTheme => self.cycle_theme(),
            Action::EditAuthor => self.begin_edit(FilterField::Author),
            Action::EditTargetBranch => self.begin_edit(FilterField::TargetBranch),
            Action::EditSearch => self.begin_edit(FilterField::Search),
            Action::EditFromDate => self.begin_edit(FilterField::FromDate),
            Action::EditExtension => self.begin_edit(FilterField::Extension),
            Action::EditMinChanges => self.begin_edit(FilterField::MinChanges),
            Action::CycleStatus => {
                let filter = self.session.filter().clone();
                let status = filter.status.cycle();
                self.set_filter(filter.with_status(status));
            }
            Action::QuickMyPrs => {
                let filter = quick::my_prs(self.session.filter().clone(), &self.current_user);
                self.set_filter(filter);
            }
            Action::QuickActive => self.set_filter(quick::active_only(self.session.filter().clone())),
            Action::QuickNeedsReview => {
                self.set_filter(quick::needs_review(self.session.filter().clone()))
            }
            Action::QuickApproved => self.set_filter(quick::approved(self.session.filter().clone())),
            Action::ClearFilters => self.set_filter(quick::clear()),
            Action::SaveSearch => {
                self.input.clear();
                self.input_mode = InputMode::SearchName;
            }
            Action::OpenSavedSearches => {
                let first = (!self.settings.saved_searches.is_empty()).then_some(0);
                self.saved_state.select(first);
                self.input_mode = InputMode::SavedSearches;
            }
            Action::ToggleColumn(column) => {
                self.settings.toggle_column(column);
                self.persistence.save(&self.settings);
            }
        }
        Ok(())
    }

    /// Keys typed while a prompt or popup is open
    pub fn handle_input_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Normal => {}
            InputMode::Editing(_) | InputMode::SearchName => self.handle_prompt_key(key),
            InputMode::SavedSearches => self.handle_saved_searches_key(key),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => self.commit_prompt(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c)
            }
            _ => {}
        }
    }

    fn handle_saved_searches_key(&mut self, key: KeyEvent) {
        let count = self.settings.saved_searches.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.input_mode = InputMode::Normal,
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                let i = self.saved_state.selected().unwrap_or(0);
                self.saved_state.select(Some(if i == 0 { count - 1 } else { i - 1 }));
            }
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                let i = self.saved_state.selected().map_or(0, |i| (i + 1) % count);
                self.saved_state.select(Some(i));
            }
            KeyCode::Enter => self.apply_selected_search(),
            KeyCode::Delete | KeyCode::Char('d') => self.delete_selected_search(),
            _ => {}
        }
    }

    fn begin_edit(&mut self, field: FilterField) {
        self.input = field.current(self.session.filter());
        self.input_mode = InputMode::Editing(field);
    }

    fn commit_prompt(&mut self) {
        match self.input_mode {
            InputMode::Editing(field) => {
                let filter = field.apply(self.session.filter().clone(), &self.input);
                self.input_mode = InputMode::Normal;
                self.set_filter(filter);

                if field == FilterField::FromDate
                    && !self.input.trim().is_empty()
                    && parse_date(&self.input).is_none()
                {
                    self.status_message =
                        format!("Ignoring date '{}', expected YYYY-MM-DD", self.input.trim());
                }
            }
            InputMode::SearchName => self.save_current_search(),
            _ => {}
        }
    }

    fn save_current_search(&mut self) {
        let mut store = SavedSearchStore::new(&mut self.settings, self.persistence.as_ref());
        match store.save(&self.input, self.session.filter()) {
            Ok(saved) => {
                self.status_message = format!("Saved search '{}'", saved.name);
                self.input_mode = InputMode::Normal;
            }
            // Keep the prompt open so the name can be corrected
            Err(e) => self.status_message = AppError::from(e).to_string(),
        }
    }

    fn selected_search(&self) -> Option<SavedSearch> {
        let index = self.saved_state.selected()?;
        self.saved_searches().get(index).map(|s| (*s).clone())
    }

    fn apply_selected_search(&mut self) {
        let Some(search) = self.selected_search() else {
            return;
        };

        let store = SavedSearchStore::new(&mut self.settings, self.persistence.as_ref());
        let filter = store.apply(&search);
        self.input_mode = InputMode::Normal;
        self.set_filter(filter);
        self.status_message = format!(
            "Applied '{}': {}",
            search.name,
            self.session.view().status_line()
        );
    }

    fn delete_selected_search(&mut self) {
        let Some(search) = self.selected_search() else {
            return;
        };

        let mut store = SavedSearchStore::new(&mut self.settings, self.persistence.as_ref());
        store.delete(&search);

        let remaining = self.settings.saved_searches.len();
        let selected = self.saved_state.selected().unwrap_or(0);
        self.saved_state
            .select((remaining > 0).then(|| selected.min(remaining - 1)));
        self.status_message = format!("Deleted saved search '{}'", search.name);
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.session.set_filter(filter);
        self.detail_scroll = 0;
        self.clamp_selection();
        self.status_message = self.session.view().status_line();
    }

    fn clamp_selection(&mut self) {
        let len = self.records().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn move_by(&mut self, delta: isize) {
        match self.focused_pane {
            FocusedPane::List => {
                let current = self.table_state.selected().unwrap_or(0);
                let target = current.saturating_add_signed(delta);
                self.move_to(target);
            }
            FocusedPane::Detail => {
                let delta = delta.clamp(i16::MIN as isize, i16::MAX as isize) as i16;
                self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
            }
        }
    }

    fn move_to(&mut self, index: usize) {
        match self.focused_pane {
            FocusedPane::List => {
                let len = self.records().len();
                if len == 0 {
                    self.table_state.select(None);
                    return;
                }
                let index = index.min(len - 1);
                if self.table_state.selected() != Some(index) {
                    self.detail_scroll = 0;
                }
                self.table_state.select(Some(index));
            }
            FocusedPane::Detail if index == 0 => self.detail_scroll = 0,
            FocusedPane::Detail => {}
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::List => FocusedPane::Detail,
            FocusedPane::Detail => FocusedPane::List,
        };
    }

    /// Switches to the next theme; a broken theme leaves the current one active
    pub fn cycle_theme(&mut self) {
        let previous = self.settings.theme.clone();
        let next = self
            .settings
            .cycle_theme(&self.themes_dir)
            .and_then(|()| Theme::load_in(&self.themes_dir, &self.settings.theme));

        match next {
            Ok(theme) => {
                self.theme = theme;
                self.persistence.save(&self.settings);
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(theme = %self.settings.theme, error = %message, "theme not changed");
                self.settings.theme = previous;
                self.status_message = format!("Theme error: {message}");
            }
        }
    }

    /// Remembers the filters and terminal size for the next session
    pub fn persist(&mut self, width: u16, height: u16) {
        self.settings.filters = LastFilters::remember(self.session.filter());
        self.settings.window.width = width;
        self.settings.window.height = height;
        self.persistence.save(&self.settings);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
