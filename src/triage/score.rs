use super::classify::TaskUrgency;
use super::rules::TriageRules;
use super::threading::Thread;
use super::types::{Intent, LeadSignals, PriorityLabel, Queue};

/// Additive priority score. Only meaningful as a relative ranking within one pass.
pub fn priority_score(
    thread: &Thread,
    queue: Queue,
    urgency: TaskUrgency,
    signals: &LeadSignals,
    rules: &TriageRules,
) -> u32 {
    let w = rules.weights();
    let inbound = thread.latest_inbound();
    let mut score = 0;

    if queue == Queue::Now {
        score += w.now;
    }
    if thread.unread_count > 0 {
        score += w.unread;
    }
    if rules.is_portal(&inbound.from.addr) {
        score += w.portal;
    }
    if urgency.overdue {
        score += w.overdue_task;
    } else if urgency.due_soon {
        score += w.due_soon_task;
    }
    score += match signals.intent {
        Intent::Sell => w.sell_intent,
        Intent::Buy | Intent::Rent => w.buy_or_rent_intent,
        Intent::Unknown => 0,
    };
    if signals
        .budget_eur
        .is_some_and(|b| b >= rules.config.high_budget_eur)
    {
        score += w.high_budget;
    }
    if rules.is_urgent(&inbound.text()) {
        score += w.urgent;
    }

    score
}

pub fn priority_label(score: u32, rules: &TriageRules) -> PriorityLabel {
    if score >= rules.config.high_threshold {
        PriorityLabel::High
    } else if score >= rules.config.medium_threshold {
        PriorityLabel::Medium
    } else {
        PriorityLabel::Low
    }
}
