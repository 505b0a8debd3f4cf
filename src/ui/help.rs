use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::View;
use triagedesk::config::ThemeConfig;

pub fn render_help(
    f: &mut Frame,
    area: Rect,
    view: View,
    status: Option<&str>,
    search_query: &str,
    dirty: bool,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_subtle());
    let search_style = Style::default().fg(theme.fg());
    let cursor_style = Style::default().fg(theme.primary());

    let mut spans = match view {
        View::Search => vec![
            Span::styled("/", key_style),
            Span::raw(" "),
            Span::styled(search_query.to_string(), search_style),
            Span::styled("_", cursor_style),
            Span::styled("  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" keep filter  ", text_style),
            Span::styled("Esc", key_style),
            Span::styled(" clear", text_style),
        ],
        View::List => vec![
            Span::styled("1/2/3", key_style),
            Span::styled(" queue  ", text_style),
            Span::styled("h/l", key_style),
            Span::styled(" pane  ", text_style),
            Span::styled("j/k", key_style),
            Span::styled(" nav  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" open  ", text_style),
            Span::styled("s", key_style),
            Span::styled(" star  ", text_style),
            Span::styled("e", key_style),
            Span::styled(" archive  ", text_style),
            Span::styled("/", key_style),
            Span::styled(" search  ", text_style),
            Span::styled("R", key_style),
            Span::styled(" reload  ", text_style),
            Span::styled("w", key_style),
            Span::styled(" save  ", text_style),
            Span::styled("q", key_style),
            Span::styled(" quit", text_style),
        ],
    };

    if view == View::List && !search_query.is_empty() {
        spans.push(Span::styled(
            format!("  filter: {}", search_query),
            Style::default().fg(theme.secondary()),
        ));
    }
    if dirty {
        spans.push(Span::styled("  [modified]", Style::default().fg(theme.warning())));
    }

    let mut line = Line::from(spans);

    if let Some(msg) = status {
        line.spans
            .push(Span::styled("  │  ", Style::default().fg(theme.border())));
        line.spans
            .push(Span::styled(msg.to_string(), Style::default().fg(theme.success())));
    }

    let paragraph = Paragraph::new(line).style(Style::default().bg(theme.bg_panel()));

    f.render_widget(paragraph, area);
}
