use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;

use super::classify::{classify, task_urgency, TaskUrgency};
use super::rules::TriageRules;
use super::score::{priority_label, priority_score};
use super::signals::{summary, LeadSignalExtractor};
use super::sla::{sla, Sla};
use super::threading::{build_threads, ContactStore, TaskStore, Thread};
use super::types::{LeadSignals, Message, PriorityLabel, Queue};

/// A thread with everything the triage pass decided about it
#[derive(Debug, Clone)]
pub struct TriagedThread {
    pub thread: Thread,
    pub queue: Queue,
    pub urgency: TaskUrgency,
    pub signals: LeadSignals,
    pub score: u32,
    pub priority: PriorityLabel,
    pub sla: Sla,
    pub summary: String,
}

impl TriagedThread {
    fn matches(&self, needle: &str) -> bool {
        [
            self.thread.subject.as_str(),
            self.thread.counterpart.display().as_str(),
            self.thread.counterpart.addr.as_str(),
            self.summary.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCounts {
    pub now: usize,
    pub waiting: usize,
    pub fyi: usize,
}

impl QueueCounts {
    pub fn get(&self, queue: Queue) -> usize {
        match queue {
            Queue::Now => self.now,
            Queue::Waiting => self.waiting,
            Queue::Fyi => self.fyi,
        }
    }

    pub fn total(&self) -> usize {
        self.now + self.waiting + self.fyi
    }
}

/// Ranked output of one triage pass.
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    items: Vec<TriagedThread>,
    counts: QueueCounts,
}

impl Worklist {
    /// All threads, `now` first, then by score and latest inbound time
    pub fn items(&self) -> &[TriagedThread] {
        &self.items
    }

    pub fn counts(&self) -> QueueCounts {
        self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Threads in one queue, narrowed by a case-insensitive substring query
    pub fn filter(&self, queue: Queue, query: Option<&str>) -> Vec<&TriagedThread> {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        self.items
            .iter()
            .filter(|t| t.queue == queue)
            .filter(|t| needle.as_deref().is_none_or(|n| t.matches(n)))
            .collect()
    }

    pub fn find(&self, key: &str) -> Option<&TriagedThread> {
        self.items.iter().find(|t| t.thread.key == key)
    }
}

/// Evaluate a single thread against the rules at `now`
pub fn evaluate(
    thread: Thread,
    extractor: &dyn LeadSignalExtractor,
    rules: &TriageRules,
    now: DateTime<Utc>,
) -> TriagedThread {
    let urgency = task_urgency(&thread.open_tasks, now, rules.config.due_soon_hours);
    let signals = if thread.has_inbound() {
        extractor.extract(thread.latest_inbound())
    } else {
        LeadSignals::none()
    };
    let queue = classify(&thread, urgency, rules);
    let score = priority_score(&thread, queue, urgency, &signals, rules);
    let sla = sla(&thread, queue, rules, now);
    TriagedThread {
        priority: priority_label(score, rules),
        summary: summary(&signals),
        thread,
        queue,
        urgency,
        signals,
        score,
        sla,
    }
}

fn rank(a: &TriagedThread, b: &TriagedThread) -> Ordering {
    let a_now = a.queue == Queue::Now;
    let b_now = b.queue == Queue::Now;
    b_now
        .cmp(&a_now)
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| {
            b.thread
                .latest_inbound()
                .received_at
                .cmp(&a.thread.latest_inbound().received_at)
        })
}

/// Run a full triage pass over a snapshot.
///
/// Pure: the same inputs and `now` always give the same worklist. Ties that survive
/// every sort key keep thread build order.
pub fn triage<C, T>(
    messages: &[Message],
    contacts: &C,
    tasks: &T,
    extractor: &dyn LeadSignalExtractor,
    rules: &TriageRules,
    now: DateTime<Utc>,
) -> Worklist
where
    C: ContactStore + ?Sized,
    T: TaskStore + ?Sized,
{
    let threads = build_threads(messages, contacts, tasks);

    let mut items: Vec<TriagedThread> = threads
        .into_par_iter()
        .map(|thread| evaluate(thread, extractor, rules, now))
        .collect();
    items.sort_by(rank);

    let mut counts = QueueCounts::default();
    for item in &items {
        match item.queue {
            Queue::Now => counts.now += 1,
            Queue::Waiting => counts.waiting += 1,
            Queue::Fyi => counts.fyi += 1,
        }
    }

    tracing::debug!(
        threads = items.len(),
        now = counts.now,
        waiting = counts.waiting,
        fyi = counts.fyi,
        "triage pass"
    );

    Worklist { items, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::signals::NoSignals;
    use crate::triage::testing::*;
    use crate::triage::types::{Contact, Intent, MessageStatus, Task};
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NO_CONTACTS: &[Contact] = &[];
    const NO_TASKS: &[Task] = &[];

    fn run(messages: &[Message]) -> Worklist {
        triage(messages, NO_CONTACTS, NO_TASKS, &NoSignals, &TriageRules::default(), now())
    }

    fn ids(items: &[&TriagedThread]) -> Vec<String> {
        items.iter().map(|t| t.thread.latest().id.clone()).collect()
    }

    /// Fixed signals keyed by sender address
    struct BySender(Vec<(&'static str, LeadSignals)>);

    impl LeadSignalExtractor for BySender {
        fn extract(&self, message: &Message) -> LeadSignals {
            self.0
                .iter()
                .find(|(addr, _)| *addr == message.from.addr)
                .map(|(_, s)| s.clone())
                .unwrap_or_else(LeadSignals::none)
        }
    }

    #[test]
    fn test_portal_visit_scenario() {
        let list = run(&[inbox("m1", "buyer@immotop.lu", "Visite appartement", 2)]);
        assert_eq!(list.items().len(), 1);
        let item = &list.items()[0];
        assert_eq!(item.queue, Queue::Now);
        assert_eq!(item.thread.unread_count, 1);
        assert!(item.score >= 6);
        assert_eq!(item.sla, Sla::DueIn { minutes: 3 });
    }

    #[test]
    fn test_empty_snapshot() {
        let list = run(&[]);
        assert!(list.is_empty());
        assert_eq!(list.counts(), QueueCounts::default());
        assert!(list.filter(Queue::Now, None).is_empty());
    }

    #[test]
    fn test_now_sorts_first_then_score() {
        let mut fyi = inbox("fyi", "news@example.com", "Lettre", 1);
        fyi.status = MessageStatus::Read;
        let waiting = sent("wait", "bob@example.com", "Offre", 2);
        let plain = inbox("plain", "carl@example.com", "Bonjour", 30);
        let portal = inbox("portal", "lead@athome.lu", "Bonjour", 40);

        let list = run(&[fyi, waiting, plain, portal]);
        let order: Vec<&str> = list.items().iter().map(|t| t.thread.latest().id.as_str()).collect();
        assert_eq!(order[..2], ["portal", "plain"]);
        assert!(list.items()[2..].iter().all(|t| t.queue != Queue::Now));
        assert_eq!(list.counts(), QueueCounts { now: 2, waiting: 1, fyi: 1 });
    }

    #[test]
    fn test_signals_raise_rank_within_now() {
        let extractor = BySender(vec![(
            "seller@example.com",
            LeadSignals {
                intent: Intent::Sell,
                ..LeadSignals::none()
            },
        )]);
        let msgs = [
            inbox("buyer", "buyer@example.com", "Question", 1),
            inbox("seller", "seller@example.com", "Question", 50),
        ];
        let list = triage(&msgs, NO_CONTACTS, NO_TASKS, &extractor, &TriageRules::default(), now());
        assert_eq!(list.items()[0].thread.latest().id, "seller");
        assert_eq!(list.items()[0].summary, "Sell");
    }

    #[test]
    fn test_outbound_only_thread_has_no_signals() {
        let extractor = BySender(vec![(
            "agent@agency.lu",
            LeadSignals {
                intent: Intent::Sell,
                ..LeadSignals::none()
            },
        )]);
        let msgs = [sent("m1", "x@example.com", "Mandat", 5)];
        let list = triage(&msgs, NO_CONTACTS, NO_TASKS, &extractor, &TriageRules::default(), now());
        assert_eq!(list.items()[0].signals, LeadSignals::none());
        assert_eq!(list.items()[0].queue, Queue::Waiting);
    }

    #[test]
    fn test_equal_scores_order_by_inbound_time() {
        let msgs = [
            inbox("older", "a@example.com", "Un", 40),
            inbox("newer", "b@example.com", "Deux", 10),
            inbox("tie1", "c@example.com", "Trois", 20),
            inbox("tie2", "d@example.com", "Quatre", 20),
        ];
        let list = run(&msgs);
        let all: Vec<&TriagedThread> = list.items().iter().collect();
        assert_eq!(ids(&all), vec!["newer", "tie1", "tie2", "older"]);
    }

    #[test]
    fn test_overdue_task_promotes_thread() {
        let contacts = vec![contact("c1", "anne@example.com")];
        let tasks = vec![task("t1", "c1", Some("2026-02-28"))];
        let mut msg = inbox("m1", "anne@example.com", "Merci", 300);
        msg.status = MessageStatus::Read;
        let list = triage(
            &[msg],
            contacts.as_slice(),
            tasks.as_slice(),
            &NoSignals,
            &TriageRules::default(),
            now(),
        );
        let item = &list.items()[0];
        assert!(item.urgency.overdue);
        assert_eq!(item.queue, Queue::Now);
        assert_eq!(item.score, 6 + 4);
        assert_eq!(item.priority, PriorityLabel::High);
        assert!(item.sla.is_overdue());
    }

    #[test]
    fn test_out_of_range_windows_never_panic() {
        let contacts = vec![contact("c1", "anne@example.com")];
        let tasks = vec![task("t1", "c1", Some("2026-03-02"))];
        let mut msg = inbox("m1", "anne@example.com", "Merci", 300);
        msg.status = MessageStatus::Read;
        let mut rules = TriageRules::default();
        rules.config.due_soon_hours = 9_000_000_000_000_000;
        rules.config.default_response_minutes = i64::MAX;

        let list = triage(
            &[msg],
            contacts.as_slice(),
            tasks.as_slice(),
            &NoSignals,
            &rules,
            now(),
        );
        let item = &list.items()[0];
        assert_eq!(item.urgency, TaskUrgency::default());
        assert_eq!(item.queue, Queue::Fyi);
    }

    #[test]
    fn test_filter_by_queue_and_query() {
        let mut fyi = inbox("fyi", "news@example.com", "Lettre mensuelle", 1);
        fyi.status = MessageStatus::Read;
        let msgs = [
            fyi,
            inbox("m1", "Anne.Martin@example.com", "Appartement Kirchberg", 5),
            inbox("m2", "paul@example.com", "Maison Strassen", 6),
        ];
        let list = run(&msgs);
        assert_eq!(ids(&list.filter(Queue::Now, None)), vec!["m1", "m2"]);
        assert_eq!(ids(&list.filter(Queue::Now, Some("KIRCH"))), vec!["m1"]);
        assert_eq!(ids(&list.filter(Queue::Now, Some("anne.martin"))), vec!["m1"]);
        assert_eq!(ids(&list.filter(Queue::Now, Some("  "))), vec!["m1", "m2"]);
        assert!(list.filter(Queue::Now, Some("mensuelle")).is_empty());
        assert_eq!(ids(&list.filter(Queue::Fyi, Some("mensuelle"))), vec!["fyi"]);
        // Filtering leaves the underlying list alone
        assert_eq!(list.items().len(), 3);
    }

    #[test]
    fn test_filter_matches_summary() {
        let extractor = BySender(vec![(
            "a@example.com",
            LeadSignals {
                property_reference: Some("LUX-42".to_string()),
                ..LeadSignals::none()
            },
        )]);
        let msgs = [inbox("m1", "a@example.com", "Demande", 5)];
        let list = triage(&msgs, NO_CONTACTS, NO_TASKS, &extractor, &TriageRules::default(), now());
        assert_eq!(ids(&list.filter(Queue::Now, Some("lux-42"))), vec!["m1"]);
    }

    #[test]
    fn test_read_changes_classification_on_next_pass() {
        let mut msgs = vec![inbox("m1", "a@example.com", "Merci beaucoup", 5)];
        assert_eq!(run(&msgs).items()[0].queue, Queue::Now);
        msgs[0].status = MessageStatus::Read;
        assert_eq!(run(&msgs).items()[0].queue, Queue::Fyi);
    }

    fn random_snapshot(rng: &mut StdRng) -> Vec<Message> {
        let people = ["a@x.lu", "b@immotop.lu", "c@x.lu", "d@athome.lu"];
        let subjects = ["Visite", "Re: Visite", "Merci", "Dossier urgent", "Offre"];
        (0..rng.gen_range(0..30))
            .map(|i| {
                let who = people[rng.gen_range(0..people.len())];
                let subject = subjects[rng.gen_range(0..subjects.len())];
                let minutes = rng.gen_range(0..3000);
                let mut m = if rng.gen_bool(0.3) {
                    sent(&format!("m{}", i), who, subject, minutes)
                } else {
                    inbox(&format!("m{}", i), who, subject, minutes)
                };
                if rng.gen_bool(0.5) {
                    m.status = MessageStatus::Read;
                }
                m
            })
            .collect()
    }

    #[test]
    fn test_pass_properties() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let msgs = random_snapshot(&mut rng);
            let first = run(&msgs);
            let second = run(&msgs);

            let keys = |w: &Worklist| -> Vec<(String, Queue, u32, String)> {
                w.items()
                    .iter()
                    .map(|t| (t.thread.key.clone(), t.queue, t.score, t.sla.label()))
                    .collect()
            };
            assert_eq!(keys(&first), keys(&second));

            // Counts agree with what each filtered view returns
            for queue in Queue::ALL {
                assert_eq!(first.counts().get(queue), first.filter(queue, None).len());
            }
            assert_eq!(first.counts().total(), first.items().len());

            // Sort order holds pairwise
            for pair in first.items().windows(2) {
                assert_ne!(rank(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }

    #[test]
    fn test_frozen_time_is_reproducible() {
        let msgs = [inbox("m1", "a@example.com", "Visite", 30)];
        let rules = TriageRules::default();
        let at_now = triage(&msgs, NO_CONTACTS, NO_TASKS, &NoSignals, &rules, now());
        let later = triage(
            &msgs,
            NO_CONTACTS,
            NO_TASKS,
            &NoSignals,
            &rules,
            now() + Duration::minutes(45),
        );
        assert_eq!(at_now.items()[0].sla.label(), "in 30m");
        assert_eq!(later.items()[0].sla.label(), "overdue");
        let again = triage(&msgs, NO_CONTACTS, NO_TASKS, &NoSignals, &rules, now());
        assert_eq!(again.items()[0].sla, at_now.items()[0].sla);
    }
}
