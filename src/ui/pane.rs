use ratatui::{
    style::Style,
    widgets::{Block, Borders},
};

use triagedesk::config::ThemeConfig;

/// A styled pane with consistent border and title treatment
pub struct Panel<'a> {
    title: String,
    focused: bool,
    theme: &'a ThemeConfig,
}

impl<'a> Panel<'a> {
    pub fn new(title: impl Into<String>, focused: bool, theme: &'a ThemeConfig) -> Self {
        Self {
            title: title.into(),
            focused,
            theme,
        }
    }

    /// Get the styled block for this pane
    pub fn block(&self) -> Block<'static> {
        let border_color = if self.focused {
            self.theme.border_active()
        } else {
            self.theme.border_subtle()
        };

        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title_style(Style::default().fg(self.theme.primary()))
            .title(self.title.clone())
    }
}
