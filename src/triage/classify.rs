use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use super::rules::TriageRules;
use super::threading::Thread;
use super::types::{Folder, Queue, Task};

/// Deadline pressure from a contact's open tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskUrgency {
    pub overdue: bool,
    pub due_soon: bool,
}

impl TaskUrgency {
    pub fn any(self) -> bool {
        self.overdue || self.due_soon
    }
}

/// Parse a stored due date: RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Tasks without a parseable due date never count. A horizon chrono cannot represent
/// disables the due-soon check instead of panicking.
pub fn task_urgency(tasks: &[Task], now: DateTime<Utc>, due_soon_hours: i64) -> TaskUrgency {
    let horizon = TimeDelta::try_hours(due_soon_hours.max(0)).and_then(|d| now.checked_add_signed(d));
    tasks
        .iter()
        .filter(|t| t.is_open())
        .filter_map(|t| t.due_date.as_deref().and_then(parse_due_date))
        .fold(TaskUrgency::default(), |acc, due| TaskUrgency {
            overdue: acc.overdue || due < now,
            due_soon: acc.due_soon || (due >= now && horizon.is_some_and(|h| due <= h)),
        })
}

/// Which queue a thread belongs in. Rules are checked in order, first match wins.
pub fn classify(thread: &Thread, urgency: TaskUrgency, rules: &TriageRules) -> Queue {
    if thread.latest().folder == Folder::Sent {
        return Queue::Waiting;
    }
    if thread.unread_count > 0 {
        return Queue::Now;
    }
    if urgency.any() {
        return Queue::Now;
    }
    if rules.is_actionable(&thread.latest_inbound().text()) {
        return Queue::Now;
    }
    Queue::Fyi
}
