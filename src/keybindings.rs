use crate::events::Action;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_navigate_up")]
    pub navigate_up: Vec<String>,
    #[serde(default = "default_navigate_down")]
    pub navigate_down: Vec<String>,
    #[serde(default = "default_page_up")]
    pub page_up: Vec<String>,
    #[serde(default = "default_page_down")]
    pub page_down: Vec<String>,
    #[serde(default = "default_go_to_top")]
    pub go_to_top: Vec<String>,
    #[serde(default = "default_go_to_bottom")]
    pub go_to_bottom: Vec<String>,
    #[serde(default = "default_quit")]
    pub quit: Vec<String>,
    #[serde(default = "default_toggle_focus")]
    pub toggle_focus: Vec<String>,
    #[serde(default = "default_cycle_theme")]
    pub cycle_theme: Vec<String>,
    #[serde(default = "default_refresh")]
    pub refresh: Vec<String>,
    #[serde(default = "default_edit_author")]
    pub edit_author: Vec<String>,
    #[serde(default = "default_edit_target_branch")]
    pub edit_target_branch: Vec<String>,
    #[serde(default = "default_edit_search")]
    pub edit_search: Vec<String>,
    #[serde(default = "default_edit_from_date")]
    pub edit_from_date: Vec<String>,
    #[serde(default = "default_edit_extension")]
    pub edit_extension: Vec<String>,
    #[serde(default = "default_edit_min_changes")]
    pub edit_min_changes: Vec<String>,
    #[serde(default = "default_cycle_status")]
    pub cycle_status: Vec<String>,
    #[serde(default = "default_quick_my_prs")]
    pub quick_my_prs: Vec<String>,
    #[serde(default = "default_quick_active")]
    pub quick_active: Vec<String>,
    #[serde(default = "default_quick_needs_review")]
    pub quick_needs_review: Vec<String>,
    #[serde(default = "default_quick_approved")]
    pub quick_approved: Vec<String>,
    #[serde(default = "default_clear_filters")]
    pub clear_filters: Vec<String>,
    #[serde(default = "default_save_search")]
    pub save_search: Vec<String>,
    #[serde(default = "default_open_saved_searches")]
    pub open_saved_searches: Vec<String>,
    /// The n-th key toggles the n-th list column
    #[serde(default = "default_toggle_column")]
    pub toggle_column: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

// Vim-style navigation with arrow-key alternatives; single letters for filters
fn default_navigate_up() -> Vec<String> {
    keys(&["k", "Up"])
}

fn default_navigate_down() -> Vec<String> {
    keys(&["j", "Down"])
}

fn default_page_up() -> Vec<String> {
    keys(&["PageUp", "Ctrl+u"])
}

fn default_page_down() -> Vec<String> {
    keys(&["PageDown", "Ctrl+d"])
}

fn default_go_to_top() -> Vec<String> {
    keys(&["g", "Home"])
}

fn default_go_to_bottom() -> Vec<String> {
    keys(&["G", "End"])
}

fn default_quit() -> Vec<String> {
    keys(&["q", "Ctrl+c"])
}

fn default_toggle_focus() -> Vec<String> {
    keys(&["Tab"])
}

fn default_cycle_theme() -> Vec<String> {
    keys(&["T"])
}

fn default_refresh() -> Vec<String> {
    keys(&["r", "F5"])
}

fn default_edit_author() -> Vec<String> {
    keys(&["a"])
}

fn default_edit_target_branch() -> Vec<String> {
    keys(&["b"])
}

fn default_edit_search() -> Vec<String> {
    keys(&["/"])
}

fn default_edit_from_date() -> Vec<String> {
    keys(&["d"])
}

fn default_edit_extension() -> Vec<String> {
    keys(&["e"])
}

fn default_edit_min_changes() -> Vec<String> {
    keys(&["c"])
}

fn default_cycle_status() -> Vec<String> {
    keys(&["s"])
}

fn default_quick_my_prs() -> Vec<String> {
    keys(&["m"])
}

fn default_quick_active() -> Vec<String> {
    keys(&["A"])
}

fn default_quick_needs_review() -> Vec<String> {
    keys(&["N"])
}

fn default_quick_approved() -> Vec<String> {
    keys(&["Y"])
}

fn default_clear_filters() -> Vec<String> {
    keys(&["x"])
}

fn default_save_search() -> Vec<String> {
    keys(&["Ctrl+s"])
}

fn default_open_saved_searches() -> Vec<String> {
    keys(&["o"])
}

fn default_toggle_column() -> Vec<String> {
    keys(&["1", "2", "3", "4", "5", "6", "7", "8", "9"])
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            navigate_up: default_navigate_up(),
            navigate_down: default_navigate_down(),
            page_up: default_page_up(),
            page_down: default_page_down(),
            go_to_top: default_go_to_top(),
            go_to_bottom: default_go_to_bottom(),
            quit: default_quit(),
            toggle_focus: default_toggle_focus(),
            cycle_theme: default_cycle_theme(),
            refresh: default_refresh(),
            edit_author: default_edit_author(),
            edit_target_branch: default_edit_target_branch(),
            edit_search: default_edit_search(),
            edit_from_date: default_edit_from_date(),
            edit_extension: default_edit_extension(),
            edit_min_changes: default_edit_min_changes(),
            cycle_status: default_cycle_status(),
            quick_my_prs: default_quick_my_prs(),
            quick_active: default_quick_active(),
            quick_needs_review: default_quick_needs_review(),
            quick_approved: default_quick_approved(),
            clear_filters: default_clear_filters(),
            save_search: default_save_search(),
            open_saved_searches: default_open_saved_searches(),
            toggle_column: default_toggle_column(),
        }
    }
}

impl KeyBindings {
    /// Create a mapping from KeyEvent to Action based on the configured bindings
    pub fn create_mapping(&self) -> Result<HashMap<KeyEvent, Action>> {
        let mut map = HashMap::new();

        let mut add_mappings = |keys: &[String], action: Action| -> Result<()> {
            for key_str in keys {
                let key_event = Self::parse_key(key_str)
                    .with_context(|| format!("Invalid key binding: {key_str}"))?;
                map.insert(normalize(key_event), action);
            }
            Ok(())
        };

        add_mappings(&self.navigate_up, Action::NavigateUp)?;
        add_mappings(&self.navigate_down, Action::NavigateDown)?;
        add_mappings(&self.page_up, Action::PageUp)?;
        add_mappings(&self.page_down, Action::PageDown)?;
        add_mappings(&self.go_to_top, Action::Home)?;
        add_mappings(&self.go_to_bottom, Action::End)?;
        add_mappings(&self.quit, Action::Quit)?;
        add_mappings(&self.toggle_focus, Action::ToggleFocus)?;
        add_mappings(&self.cycle_theme, Action::CycleTheme)?;
        add_mappings(&self.refresh, Action::Refresh)?;
        add_mappings(&self.edit_author, Action::EditAuthor)?;
        add_mappings(&self.edit_target_branch, Action::EditTargetBranch)?;
        add_mappings(&self.edit_search, Action::EditSearch)?;
        add_mappings(&self.edit_from_date, Action::EditFromDate)?;
        add_mappings(&self.edit_extension, Action::EditExtension)?;
        add_mappings(&self.edit_min_changes, Action::EditMinChanges)?;
        add_mappings(&self.cycle_status, Action::CycleStatus)?;
        add_mappings(&self.quick_my_prs, Action::QuickMyPrs)?;
        add_mappings(&self.quick_active, Action::QuickActive)?;
        add_mappings(&self.quick_needs_review, Action::QuickNeedsReview)?;
        add_mappings(&self.quick_approved, Action::QuickApproved)?;
        add_mappings(&self.clear_filters, Action::ClearFilters)?;
        add_mappings(&self.save_search, Action::SaveSearch)?;
        add_mappings(&self.open_saved_searches, Action::OpenSavedSearches)?;

        for (column, key) in self.toggle_column.iter().enumerate() {
            add_mappings(std::slice::from_ref(key), Action::ToggleColumn(column))?;
        }

        Ok(map)
    }

    /// Parse a key string into a KeyEvent
    /// Supports formats like:
    /// - Single character: "a", "b", "1"
    /// - Special keys: "Tab", "Enter", "Esc", "Space", "Backspace"
    /// - Arrow keys: "Up", "Down", "Left", "Right"
    /// - Function keys: "F1", "F2", ..., "F12"
    /// - Page navigation: "PageUp", "PageDown", "Home", "End"
    /// - Modified keys: "Ctrl+c", "Alt+x", "Shift+A"
    fn parse_key(key_str: &str) -> Result<KeyEvent> {
        let (modifier_parts, key_part) = match key_str.rsplit_once('+') {
            // A lone "+" is the plus key itself
            Some((mods, key)) if !key.is_empty() => (Some(mods), key),
            _ => (None, key_str),
        };

        let mut modifiers = KeyModifiers::empty();
        for modifier in modifier_parts.into_iter().flat_map(|m| m.split('+')) {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => anyhow::bail!("Unknown modifier: {modifier}"),
            }
        }

        let code = match key_part {
            "Tab" => KeyCode::Tab,
            "Enter" => KeyCode::Enter,
            "Esc" | "Escape" => KeyCode::Esc,
            "Space" => KeyCode::Char(' '),
            "Backspace" => KeyCode::Backspace,
            "Delete" => KeyCode::Delete,

            "Up" => KeyCode::Up,
            "Down" => KeyCode::Down,
            "Left" => KeyCode::Left,
            "Right" => KeyCode::Right,

            "PageUp" => KeyCode::PageUp,
            "PageDown" => KeyCode::PageDown,
            "Home" => KeyCode::Home,
            "End" => KeyCode::End,

            key if key.starts_with('F') && key.len() > 1 => {
                let num = key[1..]
                    .parse::<u8>()
                    .with_context(|| format!("Invalid function key: {key}"))?;
                if (1..=12).contains(&num) {
                    KeyCode::F(num)
                } else {
                    anyhow::bail!("Function key out of range: {key}")
                }
            }

            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        if modifiers.contains(KeyModifiers::SHIFT) && c.is_alphabetic() {
                            KeyCode::Char(c.to_ascii_uppercase())
                        } else {
                            KeyCode::Char(c)
                        }
                    }
                    _ => anyhow::bail!("Unknown key: {key_part}"),
                }
            }
        };

        Ok(KeyEvent::new(code, modifiers))
    }

    /// Get the first configured key for each action (for display purposes)
    pub fn get_display_keys(&self) -> KeyDisplays {
        let first = |keys: &[String]| keys.first().cloned().unwrap_or_default();
        KeyDisplays {
            navigate_up: first(&self.navigate_up),
            navigate_down: first(&self.navigate_down),
            toggle_focus: first(&self.toggle_focus),
            quit: first(&self.quit),
            refresh: first(&self.refresh),
            edit_author: first(&self.edit_author),
            edit_target_branch: first(&self.edit_target_branch),
            edit_search: first(&self.edit_search),
            edit_from_date: first(&self.edit_from_date),
            edit_extension: first(&self.edit_extension),
            edit_min_changes: first(&self.edit_min_changes),
            cycle_status: first(&self.cycle_status),
            clear_filters: first(&self.clear_filters),
            save_search: first(&self.save_search),
            open_saved_searches: first(&self.open_saved_searches),
        }
    }
}

/// Shifted letters arrive as uppercase characters, with or without the SHIFT
/// flag depending on the terminal. Drop it so both forms hit the same binding.
pub fn normalize(key: KeyEvent) -> KeyEvent {
    let mut modifiers = key.modifiers;
    if let KeyCode::Char(c) = key.code {
        if !c.is_ascii_lowercase() {
            modifiers.remove(KeyModifiers::SHIFT);
        }
    }
    KeyEvent::new(key.code, modifiers)
}

/// Structure holding display-friendly key strings for the UI
pub struct KeyDisplays {
    pub navigate_up: String,
    pub navigate_down: String,
    pub toggle_focus: String,
    pub quit: String,
    pub refresh: String,
    pub edit_author: String,
    pub edit_target_branch: String,
    pub edit_search: String,
    pub edit_from_date: String,
    pub edit_extension: String,
    pub edit_min_changes: String,
    pub cycle_status: String,
    pub clear_filters: String,
    pub save_search: String,
    pub open_saved_searches: String,
}
