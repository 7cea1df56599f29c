//! Grid colour themes
//!
//! Provides:
//! - Theme struct with every colour the grid draws with
//! - Built-in presets (darkwall, catppuccin-mocha, nord, gruvbox)
//! - Hex colour parsing for config overrides

use ratatui::style::Color;

/// Theme colors for the grid
#[derive(Debug, Clone)]
pub struct Theme {
    /// Main background color
    pub background: Color,
    /// Cell text
    pub foreground: Color,
    /// Background of the selected row
    pub selection_bg: Color,
    /// Text of the selected row
    pub selection_fg: Color,
    /// Borders and the selected column
    pub accent: Color,
    /// Header row text
    pub header: Color,
    /// Status bar and placeholders
    pub dimmed: Color,
    /// Every other row
    pub stripe_bg: Color,
    /// Filter bar while editing, filtered column headers
    pub filter_highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::darkwall()
    }
}

impl Theme {
    /// Darkwall theme - default
    pub fn darkwall() -> Self {
        Self {
            background: Color::Rgb(13, 17, 22),        // #0d1116
            foreground: Color::Rgb(229, 234, 241),     // #e5eaf1
            selection_bg: Color::Rgb(20, 28, 42),      // #141c2a
            selection_fg: Color::Rgb(229, 234, 241),   // #e5eaf1
            accent: Color::Rgb(180, 83, 9),            // #b45309 (amber)
            header: Color::Rgb(245, 158, 11),          // #f59e0b
            dimmed: Color::Rgb(107, 114, 128),         // #6b7280
            stripe_bg: Color::Rgb(17, 22, 29),         // #11161d
            filter_highlight: Color::Rgb(180, 83, 9),  // #b45309
        }
    }

    /// Catppuccin Mocha theme
    pub fn catppuccin_mocha() -> Self {
        Self {
            background: Color::Rgb(30, 30, 46),          // #1e1e2e (base)
            foreground: Color::Rgb(205, 214, 244),       // #cdd6f4 (text)
            selection_bg: Color::Rgb(49, 50, 68),        // #313244 (surface0)
            selection_fg: Color::Rgb(205, 214, 244),     // #cdd6f4 (text)
            accent: Color::Rgb(137, 180, 250),           // #89b4fa (blue)
            header: Color::Rgb(203, 166, 247),           // #cba6f7 (mauve)
            dimmed: Color::Rgb(147, 153, 178),           // #9399b2 (overlay2)
            stripe_bg: Color::Rgb(24, 24, 37),           // #181825 (mantle)
            filter_highlight: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            background: Color::Rgb(46, 52, 64),          // #2e3440 (nord0)
            foreground: Color::Rgb(236, 239, 244),       // #eceff4 (nord6)
            selection_bg: Color::Rgb(67, 76, 94),        // #434c5e (nord2)
            selection_fg: Color::Rgb(236, 239, 244),     // #eceff4 (nord6)
            accent: Color::Rgb(136, 192, 208),           // #88c0d0 (nord8)
            header: Color::Rgb(129, 161, 193),           // #81a1c1 (nord9)
            dimmed: Color::Rgb(76, 86, 106),             // #4c566a (nord3)
            stripe_bg: Color::Rgb(59, 66, 82),           // #3b4252 (nord1)
            filter_highlight: Color::Rgb(235, 203, 139), // #ebcb8b (nord13)
        }
    }

    /// Gruvbox dark theme
    pub fn gruvbox() -> Self {
        Self {
            background: Color::Rgb(40, 40, 40),         // #282828 (bg)
            foreground: Color::Rgb(235, 219, 178),      // #ebdbb2 (fg)
            selection_bg: Color::Rgb(80, 73, 69),       // #504945 (bg2)
            selection_fg: Color::Rgb(235, 219, 178),    // #ebdbb2 (fg)
            accent: Color::Rgb(215, 153, 33),           // #d79921 (yellow)
            header: Color::Rgb(131, 165, 152),          // #83a598 (blue)
            dimmed: Color::Rgb(146, 131, 116),          // #928374 (gray)
            stripe_bg: Color::Rgb(50, 48, 47),          // #32302f (bg0_s)
            filter_highlight: Color::Rgb(250, 189, 47), // #fabd2f (bright yellow)
        }
    }

    /// Load theme from preset name
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "darkwall" | "default" => Some(Self::darkwall()),
            "catppuccin-mocha" | "catppuccin_mocha" | "catppuccin" => Some(Self::catppuccin_mocha()),
            "nord" => Some(Self::nord()),
            "gruvbox" | "gruvbox-dark" | "gruvbox_dark" => Some(Self::gruvbox()),
            _ => None,
        }
    }
}

/// Color parsing error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid color length (expected 3, 6, or 8 hex chars)")]
    InvalidLength,
    #[error("invalid hex character")]
    InvalidHex,
}

/// Parse hex color string to Color
/// Supports: #rrggbb, #rgb, #rrggbbaa (alpha ignored), with or without `#`
pub fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ColorError::InvalidHex);
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| ColorError::InvalidHex)
    };

    match s.len() {
        // #rgb -> #rrggbb
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        6 | 8 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        _ => Err(ColorError::InvalidLength),
    }
}
