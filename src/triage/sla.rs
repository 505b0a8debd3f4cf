use chrono::{DateTime, TimeDelta, Utc};

use super::rules::TriageRules;
use super::threading::Thread;
use super::types::{Folder, Queue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sla {
    /// Response window already used up
    Overdue,
    /// Minutes left before the response deadline, always positive
    DueIn { minutes: i64 },
    /// Minutes since the latest message, for threads with no deadline
    Age { minutes: i64 },
}

impl Sla {
    pub fn label(&self) -> String {
        match *self {
            Sla::Overdue => "overdue".to_string(),
            Sla::DueIn { minutes } if minutes < 60 => format!("in {}m", minutes),
            Sla::DueIn { minutes } => format!("in {}h", minutes / 60),
            Sla::Age { minutes } if minutes < 60 => format!("{}m ago", minutes),
            Sla::Age { minutes } if minutes < 24 * 60 => format!("{}h ago", minutes / 60),
            Sla::Age { minutes } => format!("{}d ago", minutes / (24 * 60)),
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Sla::Overdue)
    }
}

/// Floor of whole minutes, rounding toward negative infinity
fn floor_minutes(d: TimeDelta) -> i64 {
    d.num_milliseconds().div_euclid(60_000)
}

/// Response deadline for threads awaiting our answer, age for everything else.
pub fn sla(thread: &Thread, queue: Queue, rules: &TriageRules, now: DateTime<Utc>) -> Sla {
    let inbound = thread.latest_inbound();
    if queue == Queue::Now && inbound.folder == Folder::Inbox {
        let window = if rules.is_portal(&inbound.from.addr) {
            rules.config.portal_response_minutes
        } else {
            rules.config.default_response_minutes
        };
        // A deadline chrono cannot represent falls back to the age label
        let deadline = TimeDelta::try_minutes(window.max(0))
            .and_then(|d| inbound.received_at.checked_add_signed(d));
        if let Some(deadline) = deadline {
            let remaining = floor_minutes(deadline - now);
            return if remaining <= 0 {
                Sla::Overdue
            } else {
                Sla::DueIn { minutes: remaining }
            };
        }
    }

    // Clock skew can put a message in the future; show it as just arrived
    let age = floor_minutes(now - thread.latest().received_at).max(0);
    Sla::Age { minutes: age }
}
