use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState},
    Frame,
};

use triagedesk::config::ThemeConfig;
use triagedesk::triage::{PriorityLabel, Sla, TriagedThread};

use super::Panel;

pub fn priority_color(priority: PriorityLabel, theme: &ThemeConfig) -> ratatui::style::Color {
    match priority {
        PriorityLabel::High => theme.error(),
        PriorityLabel::Medium => theme.warning(),
        PriorityLabel::Low => theme.fg_muted(),
    }
}

pub fn sla_color(sla: &Sla, theme: &ThemeConfig) -> ratatui::style::Color {
    match sla {
        Sla::Overdue => theme.error(),
        Sla::DueIn { minutes } if *minutes < 15 => theme.warning(),
        Sla::DueIn { .. } => theme.success(),
        Sla::Age { .. } => theme.fg_muted(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn render_worklist(
    f: &mut Frame,
    area: Rect,
    threads: &[&TriagedThread],
    state: &mut ListState,
    title: &str,
    focused: bool,
    theme: &ThemeConfig,
    sla_width: usize,
    from_width: usize,
) {
    // Available width: area minus borders (2) minus highlight symbol (2)
    let avail_width = area.width.saturating_sub(4) as usize;

    // Fixed: unread marker (1) + priority (1) + spacing
    let from_width = from_width.min(avail_width.saturating_sub(sla_width + 4) / 3);
    let subject_width = avail_width.saturating_sub(sla_width + from_width + 5);

    let items: Vec<ListItem> = threads
        .iter()
        .map(|t| {
            let unread = if t.thread.unread_count > 0 { "*" } else { " " };
            let marker = match t.priority {
                PriorityLabel::High => "!",
                PriorityLabel::Medium => "+",
                PriorityLabel::Low => " ",
            };
            let from = t.thread.counterpart.display();
            let count = if t.thread.len() > 1 {
                format!(" ({})", t.thread.len())
            } else {
                String::new()
            };
            let subject = format!("{}{}", t.thread.subject, count);

            let row_style = if t.thread.unread_count > 0 {
                Style::default()
                    .fg(theme.unread())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg())
            };

            let headline = Line::from(vec![
                Span::styled(unread, Style::default().fg(theme.unread())),
                Span::styled(
                    marker,
                    Style::default().fg(priority_color(t.priority, theme)),
                ),
                Span::raw(" "),
                Span::styled(
                    truncate(&t.sla.label(), sla_width),
                    Style::default().fg(sla_color(&t.sla, theme)),
                ),
                Span::raw(" "),
                Span::styled(truncate(&from, from_width), row_style),
                Span::raw(" "),
                Span::styled(truncate(&subject, subject_width), row_style),
            ]);
            let detail = Line::from(Span::styled(
                format!(
                    "{:indent$}{} · {}",
                    "",
                    t.priority.label(),
                    truncate(&t.summary, avail_width.saturating_sub(sla_width + 16)).trim_end(),
                    indent = sla_width + 4,
                ),
                Style::default().fg(theme.fg_muted()),
            ));
            ListItem::new(vec![headline, detail])
        })
        .collect();

    let list = List::new(items)
        .block(Panel::new(title, focused, theme).block())
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, state);
}

pub fn truncate(s: &str, max: usize) -> String {
    if max < 4 {
        return s.chars().take(max).collect();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        format!("{:width$}", s, width = max)
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
