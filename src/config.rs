use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use darkwall_grid::column::Column;
use darkwall_grid::loader::LoadOptions;
use darkwall_grid::view::{SortDirective, SortMode};

use crate::ui::theme::{parse_hex_color, Theme};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    pub loader: LoaderConfig,
    /// Explicit column list; inferred from the records when empty
    pub columns: Vec<Column>,
    pub appearance: AppearanceConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Rows per page
    pub page_size: usize,
    /// "typed" or "lexical"
    pub sort_mode: SortMode,
    /// Sort applied when no session state is restored
    pub default_sort: Option<SortDirective>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            sort_mode: SortMode::Typed,
            default_sort: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Convert ISO date strings to dates
    pub detect_dates: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { detect_dates: true }
    }
}

impl LoaderConfig {
    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            detect_dates: self.detect_dates,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub prompt: String,
    pub selected_prefix: String,
    /// Theme preset name
    pub theme: String,
    /// Hex overrides applied on top of the preset
    pub colors: ColorOverrides,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            prompt: "❯ ".to_string(),
            selected_prefix: "● ".to_string(),
            theme: "darkwall".to_string(),
            colors: ColorOverrides::default(),
        }
    }
}

/// Per-colour overrides, e.g. `accent = "#ff8800"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorOverrides {
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub selection_bg: Option<String>,
    pub selection_fg: Option<String>,
    pub accent: Option<String>,
    pub header: Option<String>,
    pub dimmed: Option<String>,
    pub filter_highlight: Option<String>,
}

/// Saved-view persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    /// Maximum data files to remember
    pub max_entries: usize,
    /// Forget views not opened for N days
    pub decay_after_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100,
            decay_after_days: 30,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Configured columns with labels filled in
    pub fn columns(&self) -> Vec<Column> {
        self.columns.iter().cloned().map(Column::normalized).collect()
    }

    /// Preset from `appearance.theme` with colour overrides applied.
    /// Unknown presets and bad hex values are logged and skipped.
    pub fn resolve_theme(&self) -> Theme {
        let appearance = &self.appearance;
        let mut theme = Theme::from_preset(&appearance.theme).unwrap_or_else(|| {
            tracing::warn!("Unknown theme preset '{}', using default", appearance.theme);
            Theme::default()
        });

        let colors = &appearance.colors;
        let overrides = [
            ("background", &colors.background, &mut theme.background),
            ("foreground", &colors.foreground, &mut theme.foreground),
            ("selection_bg", &colors.selection_bg, &mut theme.selection_bg),
            ("selection_fg", &colors.selection_fg, &mut theme.selection_fg),
            ("accent", &colors.accent, &mut theme.accent),
            ("header", &colors.header, &mut theme.header),
            ("dimmed", &colors.dimmed, &mut theme.dimmed),
            ("filter_highlight", &colors.filter_highlight, &mut theme.filter_highlight),
        ];

        for (name, hex, slot) in overrides {
            let Some(hex) = hex else { continue };
            match parse_hex_color(hex) {
                Ok(color) => *slot = color,
                Err(e) => tracing::warn!("Ignoring colors.{} = {:?}: {}", name, hex, e),
            }
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkwall_grid::view::SortDirection;
    use ratatui::style::Color;
    use std::io::Write;

    #[test]
    fn test_defaults_when_missing() {
        let config = Config::load("/nonexistent/darkwall-grid.toml").unwrap();
        assert_eq!(config.view.page_size, 20);
        assert_eq!(config.view.sort_mode, SortMode::Typed);
        assert!(config.session.enabled);
        assert!(config.columns().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
[view]
page_size = 50
sort_mode = "lexical"
default_sort = {{ column = "value", direction = "desc" }}

[loader]
detect_dates = false

[[columns]]
key = "name"

[[columns]]
key = "value"
label = "Amount"
sortable = false

[appearance]
theme = "nord"

[appearance.colors]
accent = "#ff0000"
"##
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.view.page_size, 50);
        assert_eq!(config.view.sort_mode, SortMode::Lexical);
        assert_eq!(
            config.view.default_sort,
            Some(SortDirective::new("value", SortDirection::Desc))
        );
        assert!(!config.loader.options().detect_dates);

        let columns = config.columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].label, "Name");
        assert_eq!(columns[1].label, "Amount");
        assert!(!columns[1].sortable);

        let theme = config.resolve_theme();
        assert_eq!(theme.accent, Color::Rgb(255, 0, 0));
        assert_eq!(theme.background, Theme::nord().background);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[view\npage_size = ").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_bad_theme_values_fall_back() {
        let mut config = Config::default();
        config.appearance.theme = "no-such-theme".to_string();
        config.appearance.colors.accent = Some("#zzz".to_string());

        let theme = config.resolve_theme();
        assert_eq!(theme.accent, Theme::default().accent);
    }
}
