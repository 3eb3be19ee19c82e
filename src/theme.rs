use crate::settings::config_dir;
use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_THEME: &str = "azure-dark";

const BUILTIN_THEMES: [(&str, &str); 5] = [
    ("azure-dark", include_str!("../themes/azure-dark.toml")),
    ("azure-light", include_str!("../themes/azure-light.toml")),
    ("dracula", include_str!("../themes/dracula.toml")),
    ("gruvbox-dark", include_str!("../themes/gruvbox-dark.toml")),
    ("nord", include_str!("../themes/nord.toml")),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeColors {
    // UI colors
    pub background: String,
    pub foreground: String,
    pub border: String,
    pub border_focused: String,
    pub title: String,
    pub subtitle: String,

    // Status colors
    pub info: String,
    pub warning: String,
    pub error: String,
    pub success: String,

    // Table colors
    pub header_bg: String,
    pub header_fg: String,
    pub alt_row_bg: String,
    pub selection_bg: String,
    pub selection_fg: String,

    // Status bar colors
    pub nav_bg: String,
    pub nav_fg: String,
    pub nav_active: String,

    // Popups and inputs
    pub popup_bg: String,
    pub input_bg: String,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    colors: ThemeColors,
}

impl Theme {
    pub fn load(theme_name: &str) -> Result<Self> {
        Self::load_in(&Self::themes_dir(), theme_name)
    }

    pub fn load_in(themes_dir: &Path, theme_name: &str) -> Result<Self> {
        Self::create_default_themes_in(themes_dir)?;

        let theme_path = themes_dir.join(format!("{theme_name}.toml"));
        if theme_path.exists() {
            return Self::load_from_file(&theme_path, theme_name);
        }

        anyhow::bail!("Theme '{theme_name}' not found")
    }

    /// The default theme straight from the binary, without touching disk
    pub fn builtin() -> Result<Self> {
        let (name, content) = BUILTIN_THEMES[0];
        Self::parse(name, content)
    }

    fn parse(name: &str, content: &str) -> Result<Self> {
        let colors: ThemeColors =
            toml::from_str(content).with_context(|| format!("Failed to parse theme {name}"))?;
        Ok(Self {
            name: name.to_string(),
            colors,
        })
    }

    fn load_from_file(path: &Path, name: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file: {path:?}"))?;
        Self::parse(name, &content)
    }

    pub fn themes_dir() -> PathBuf {
        config_dir().join("themes")
    }

    pub fn list_available_themes(themes_dir: &Path) -> Result<Vec<String>> {
        Self::create_default_themes_in(themes_dir)?;

        let mut themes = Vec::new();
        if themes_dir.exists() {
            for entry in fs::read_dir(themes_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                        themes.push(name.to_string());
                    }
                }
            }
        }

        themes.sort();
        Ok(themes)
    }

    /// Writes the built-in themes to the config directory, keeping user edits
    pub fn create_default_themes_in(themes_dir: &Path) -> Result<()> {
        fs::create_dir_all(themes_dir).context("Failed to create themes directory")?;

        for (name, content) in BUILTIN_THEMES {
            let path = themes_dir.join(format!("{name}.toml"));
            if !path.exists() {
                fs::write(path, content)?;
            }
        }

        Ok(())
    }

    /// Accepts `#rrggbb`, `rgb(r, g, b)` and the basic color names; anything
    /// else renders as white
    fn parse_color(color_str: &str) -> Color {
        if let Some(hex) = color_str.strip_prefix('#') {
            if hex.len() == 6 && hex.is_ascii() {
                let channel = |range: std::ops::Range<usize>| {
                    u8::from_str_radix(&hex[range], 16).unwrap_or(0)
                };
                return Color::Rgb(channel(0..2), channel(2..4), channel(4..6));
            }
        } else if let Some(rgb) = color_str
            .strip_prefix("rgb(")
            .and_then(|s| s.strip_suffix(')'))
        {
            let parts: Vec<u8> = rgb
                .split(',')
                .map(|p| p.trim().parse().unwrap_or(0))
                .collect();
            if let [r, g, b] = parts[..] {
                return Color::Rgb(r, g, b);
            }
        } else {
            match color_str.to_lowercase().as_str() {
                "black" => return Color::Black,
                "red" => return Color::Red,
                "green" => return Color::Green,
                "yellow" => return Color::Yellow,
                "blue" => return Color::Blue,
                "magenta" => return Color::Magenta,
                "cyan" => return Color::Cyan,
                "gray" | "grey" => return Color::Gray,
                "darkgray" | "darkgrey" => return Color::DarkGray,
                "white" => return Color::White,
                _ => {}
            }
        }

        Color::White
    }

    pub fn bg(&self) -> Color {
        Self::parse_color(&self.colors.background)
    }

    pub fn fg(&self) -> Color {
        Self::parse_color(&self.colors.foreground)
    }

    pub fn border(&self) -> Color {
        Self::parse_color(&self.colors.border)
    }

    pub fn border_focused(&self) -> Color {
        Self::parse_color(&self.colors.border_focused)
    }

    pub fn title(&self) -> Color {
        Self::parse_color(&self.colors.title)
    }

    pub fn subtitle(&self) -> Color {
        Self::parse_color(&self.colors.subtitle)
    }

    pub fn info(&self) -> Color {
        Self::parse_color(&self.colors.info)
    }

    pub fn warning(&self) -> Color {
        Self::parse_color(&self.colors.warning)
    }

    pub fn error(&self) -> Color {
        Self::parse_color(&self.colors.error)
    }

    pub fn success(&self) -> Color {
        Self::parse_color(&self.colors.success)
    }

    pub fn header_bg(&self) -> Color {
        Self::parse_color(&self.colors.header_bg)
    }

    pub fn header_fg(&self) -> Color {
        Self::parse_color(&self.colors.header_fg)
    }

    pub fn alt_row_bg(&self) -> Color {
        Self::parse_color(&self.colors.alt_row_bg)
    }

    pub fn selection_bg(&self) -> Color {
        Self::parse_color(&self.colors.selection_bg)
    }

    pub fn selection_fg(&self) -> Color {
        Self::parse_color(&self.colors.selection_fg)
    }

    pub fn nav_bg(&self) -> Color {
        Self::parse_color(&self.colors.nav_bg)
    }

    pub fn nav_fg(&self) -> Color {
        Self::parse_color(&self.colors.nav_fg)
    }

    pub fn nav_active(&self) -> Color {
        Self::parse_color(&self.colors.nav_active)
    }

    pub fn popup_bg(&self) -> Color {
        Self::parse_color(&self.colors.popup_bg)
    }

    pub fn input_bg(&self) -> Color {
        Self::parse_color(&self.colors.input_bg)
    }
}
