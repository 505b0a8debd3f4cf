use serde::Deserialize;
use std::path::PathBuf;

use crate::triage::{RulesConfig, RulesError, TriageRules};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot file with messages, contacts and tasks (`~` allowed)
    pub snapshot: String,
    /// How often the worklist is re-ranked, in milliseconds
    pub refresh_ms: u64,
    pub rules: RulesConfig,
    pub layout: LayoutConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width percentage for list pane when focused (reader gets the rest)
    pub list_focused_width: u16,
    /// Width percentage for reader pane when focused (list gets the rest)
    pub reader_focused_width: u16,
    /// SLA column width in characters
    pub sla_width: usize,
    /// Counterpart column width in characters
    pub from_width: usize,
}

/// Semantic theme configuration using Capstan Cloud colors as defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // Base colors
    pub bg: String,
    pub bg_panel: String,
    pub fg: String,
    pub fg_muted: String,
    pub fg_subtle: String,

    // Border colors
    pub border: String,
    pub border_subtle: String,
    pub border_active: String,

    // Accent colors
    pub primary: String,
    pub secondary: String,

    // Semantic colors
    pub success: String,
    pub warning: String,
    pub error: String,

    // UI-specific mappings
    pub selected_bg: String,
    pub unread: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot_path(),
            refresh_ms: 1000,
            rules: RulesConfig::default(),
            layout: LayoutConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

fn default_snapshot_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("triagedesk/snapshot.json").to_string_lossy().into_owned())
        .unwrap_or_else(|| "~/.local/share/triagedesk/snapshot.json".to_string())
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            list_focused_width: 62,
            reader_focused_width: 67,
            sla_width: 10,
            from_width: 20,
        }
    }
}

/// Capstan Cloud theme - warm earth tones with gold accents
impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            // Base colors
            bg: "#1a1917".to_string(),
            bg_panel: "#262422".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),
            fg_subtle: "#b8b5b0".to_string(),

            // Border colors
            border: "#524f4c".to_string(),
            border_subtle: "#393634".to_string(),
            border_active: "#d4a366".to_string(), // primary

            // Accent colors
            primary: "#d4a366".to_string(),
            secondary: "#8fa5ae".to_string(), // blue

            // Semantic colors
            success: "#52c41a".to_string(),
            warning: "#faad14".to_string(),
            error: "#ff4d4f".to_string(),

            // UI-specific mappings
            selected_bg: "#393634".to_string(),
            unread: "#d4a366".to_string(), // primary (gold)
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("triagedesk/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/triagedesk/config.toml"))
    }

    pub fn load() -> Self {
        let config_path = Self::path();

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::info!(path = %config_path.display(), "config loaded");
                        return config;
                    }
                    Err(e) => tracing::warn!("Config parse error: {}", e),
                },
                Err(e) => tracing::warn!("Config read error: {}", e),
            }
        }

        Self::default()
    }

    /// Snapshot path with `~` expanded
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.snapshot).into_owned())
    }

    pub fn triage_rules(&self) -> Result<TriageRules, RulesError> {
        TriageRules::compile(self.rules.clone())
    }
}

impl ThemeConfig {
    // Convenience methods for common colors
    pub fn bg(&self) -> ratatui::style::Color {
        parse_color(&self.bg)
    }
    pub fn bg_panel(&self) -> ratatui::style::Color {
        parse_color(&self.bg_panel)
    }
    pub fn fg(&self) -> ratatui::style::Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> ratatui::style::Color {
        parse_color(&self.fg_muted)
    }
    pub fn fg_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.fg_subtle)
    }
    pub fn border(&self) -> ratatui::style::Color {
        parse_color(&self.border)
    }
    pub fn border_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.border_subtle)
    }
    pub fn border_active(&self) -> ratatui::style::Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> ratatui::style::Color {
        parse_color(&self.primary)
    }
    pub fn secondary(&self) -> ratatui::style::Color {
        parse_color(&self.secondary)
    }
    pub fn success(&self) -> ratatui::style::Color {
        parse_color(&self.success)
    }
    pub fn warning(&self) -> ratatui::style::Color {
        parse_color(&self.warning)
    }
    pub fn error(&self) -> ratatui::style::Color {
        parse_color(&self.error)
    }
    pub fn selected_bg(&self) -> ratatui::style::Color {
        parse_color(&self.selected_bg)
    }
    pub fn unread(&self) -> ratatui::style::Color {
        parse_color(&self.unread)
    }
}

/// Parse color string to ratatui Color
pub fn parse_color(s: &str) -> ratatui::style::Color {
    use ratatui::style::Color;

    // Try hex first (#RRGGBB)
    if s.starts_with('#') && s.len() == 7 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[1..3], 16),
            u8::from_str_radix(&s[3..5], 16),
            u8::from_str_radix(&s[5..7], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }

    // Named colors
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "white" => Color::White,
        _ => Color::White,
    }
}
