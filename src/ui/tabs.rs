use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::Tabs,
    Frame,
};

use triagedesk::config::ThemeConfig;
use triagedesk::triage::{Queue, QueueCounts};

/// Queue switcher with per-queue thread counts
pub fn render_tabs(f: &mut Frame, area: Rect, active: Queue, counts: QueueCounts, theme: &ThemeConfig) {
    let titles: Vec<Line> = Queue::ALL
        .iter()
        .enumerate()
        .map(|(i, q)| Line::from(format!("{} {} ({})", i + 1, q.label(), counts.get(*q))))
        .collect();
    let selected = Queue::ALL.iter().position(|q| *q == active).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(theme.fg_muted()).bg(theme.bg_panel()))
        .highlight_style(
            Style::default()
                .fg(theme.primary())
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");

    f.render_widget(tabs, area);
}
