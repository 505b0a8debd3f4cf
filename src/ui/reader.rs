use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use triagedesk::config::ThemeConfig;
use triagedesk::triage::{parse_due_date, Folder, Intent, TriagedThread};

use super::{priority_color, sla_color, Panel};

/// Lines describing a thread: triage header, signals, open tasks, then the messages
/// oldest first.
pub fn thread_lines(
    item: &TriagedThread,
    now: DateTime<Utc>,
    theme: &ThemeConfig,
) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.fg_muted());
    let value = Style::default().fg(theme.fg());
    let mut lines = Vec::new();

    let thread = &item.thread;
    lines.push(Line::from(vec![
        Span::styled(
            format!("{} ", item.queue.label()),
            Style::default()
                .fg(theme.primary())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} ({}) ", item.priority.label(), item.score),
            Style::default().fg(priority_color(item.priority, theme)),
        ),
        Span::styled(item.sla.label(), Style::default().fg(sla_color(&item.sla, theme))),
    ]));
    lines.push(Line::from(vec![
        Span::styled("With     ", label),
        Span::styled(
            format!("{} <{}>", thread.counterpart.display(), thread.counterpart.addr),
            value,
        ),
    ]));
    if let Some(contact) = &thread.contact {
        lines.push(Line::from(vec![
            Span::styled("Contact  ", label),
            Span::styled(contact.name.clone(), value),
            Span::styled(
                contact
                    .phone
                    .as_ref()
                    .map(|p| format!("  {}", p))
                    .unwrap_or_default(),
                label,
            ),
        ]));
    }

    let signals = &item.signals;
    if signals.intent != Intent::Unknown
        || signals.budget_eur.is_some()
        || signals.property_reference.is_some()
        || !signals.tags.is_empty()
    {
        lines.push(Line::from(vec![
            Span::styled("Signals  ", label),
            Span::styled(item.summary.clone(), Style::default().fg(theme.secondary())),
        ]));
    }

    for task in &thread.open_tasks {
        let due = task.due_date.as_deref().unwrap_or("no due date");
        let late = task
            .due_date
            .as_deref()
            .and_then(parse_due_date)
            .is_some_and(|d| d < now);
        let due_style = if late {
            Style::default().fg(theme.error())
        } else {
            label
        };
        lines.push(Line::from(vec![
            Span::styled("Task     ", label),
            Span::styled(task.title.clone(), value),
            Span::styled(format!("  {}", due), due_style),
        ]));
    }

    for msg in thread.messages().iter().rev() {
        lines.push(Line::raw(""));
        let direction = match msg.folder {
            Folder::Sent => "→",
            _ => "←",
        };
        let star = if msg.starred { " ★" } else { "" };
        let unread_style = if msg.is_inbound() && msg.is_unread() {
            Style::default()
                .fg(theme.unread())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg_subtle())
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", direction), unread_style),
            Span::styled(msg.from.display(), unread_style),
            Span::styled(
                format!("  {}{}", msg.received_at.format("%b %d %H:%M"), star),
                label,
            ),
        ]));
        lines.push(Line::from(Span::styled(msg.subject.clone(), label)));
        let text = if msg.body.is_empty() { &msg.preview } else { &msg.body };
        for line in text.lines() {
            lines.push(Line::from(Span::styled(line.to_string(), value)));
        }
    }

    lines
}

pub fn render_reader(
    f: &mut Frame,
    area: Rect,
    item: Option<&TriagedThread>,
    now: DateTime<Utc>,
    scroll: u16,
    focused: bool,
    theme: &ThemeConfig,
) {
    let title = item
        .map(|t| t.thread.subject.clone())
        .unwrap_or_else(|| "Thread".to_string());
    let lines = match item {
        Some(t) => thread_lines(t, now, theme),
        None => vec![Line::from(Span::styled(
            "Nothing to triage here",
            Style::default().fg(theme.fg_muted()),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(Panel::new(title, focused, theme).block())
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    f.render_widget(paragraph, area);
}
