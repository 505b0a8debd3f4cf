use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::types::{Address, Contact, Folder, Message, RelatedTo, Task};

/// Read-only contact lookups the builder needs
pub trait ContactStore {
    /// Case-insensitive match on the contact's email address
    fn contact_by_email(&self, email: &str) -> Option<Contact>;
    fn contact_by_id(&self, id: &str) -> Option<Contact>;
}

/// Read-only task lookups the builder needs
pub trait TaskStore {
    /// Tasks in `todo` or `in_progress` linked to the contact
    fn open_tasks_for(&self, contact_id: &str) -> Vec<Task>;
}

impl ContactStore for [Contact] {
    fn contact_by_email(&self, email: &str) -> Option<Contact> {
        let email = email.trim().to_lowercase();
        self.iter()
            .find(|c| c.email.trim().to_lowercase() == email)
            .cloned()
    }

    fn contact_by_id(&self, id: &str) -> Option<Contact> {
        self.iter().find(|c| c.id == id).cloned()
    }
}

impl TaskStore for [Task] {
    fn open_tasks_for(&self, contact_id: &str) -> Vec<Task> {
        self.iter()
            .filter(|t| t.is_open() && t.contact_id.as_deref() == Some(contact_id))
            .cloned()
            .collect()
    }
}

/// A conversation: every active message sharing a counterpart and a normalized subject.
///
/// Messages are kept newest first, so the first one is always the latest. A thread is
/// never empty.
#[derive(Debug, Clone)]
pub struct Thread {
    pub key: String,
    /// Normalized subject of the latest message, original casing
    pub subject: String,
    pub counterpart: Address,
    pub unread_count: usize,
    pub contact: Option<Contact>,
    pub open_tasks: Vec<Task>,
    messages: Vec<Message>,
    latest_inbound: usize,
}

impl Thread {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest(&self) -> &Message {
        &self.messages[0]
    }

    /// Newest inbox message, or the latest message when nothing was received
    pub fn latest_inbound(&self) -> &Message {
        &self.messages[self.latest_inbound]
    }

    pub fn has_inbound(&self) -> bool {
        self.latest_inbound().is_inbound()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of inbound messages still unread
    pub fn unread_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.is_inbound() && m.is_unread())
            .map(|m| m.id.clone())
            .collect()
    }
}

static REPLY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:re|fwd|fw|aw|tr)\s*:").expect("valid regex"));

/// Strip any run of reply/forward prefixes ("Re:", "Fwd:", "AW:", ...).
/// Falls back to the trimmed subject when nothing would be left.
pub fn normalize_subject(subject: &str) -> String {
    let mut rest = subject;
    while let Some(m) = REPLY_PREFIX.find(rest) {
        rest = &rest[m.end()..];
    }
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        subject.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// The other party: first recipient of sent mail, sender of everything else.
pub fn counterpart(message: &Message) -> Address {
    match message.folder {
        Folder::Sent => message.to.first().cloned().unwrap_or_else(|| Address {
            name: Some("(no recipient)".to_string()),
            addr: String::new(),
        }),
        _ => message.from.clone(),
    }
}

pub fn thread_key(message: &Message) -> String {
    format!(
        "{}|{}",
        counterpart(message).addr.trim().to_lowercase(),
        normalize_subject(&message.subject).to_lowercase()
    )
}

/// Group messages into threads.
///
/// Drafts and archived messages are skipped. Threads come out in the order their key
/// first appears in `messages`; within a thread, equal timestamps keep input order.
pub fn build_threads<C, T>(messages: &[Message], contacts: &C, tasks: &T) -> Vec<Thread>
where
    C: ContactStore + ?Sized,
    T: TaskStore + ?Sized,
{
    if messages.is_empty() {
        return Vec::new();
    }

    // 1. Compute keys for active messages (parallel, order preserved)
    let keyed: Vec<(usize, String)> = messages
        .par_iter()
        .enumerate()
        .filter(|(_, m)| m.folder.is_active())
        .map(|(i, m)| (i, thread_key(m)))
        .collect();

    // 2. Group by key in first-appearance order
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, key) in keyed {
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(i),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![i]));
            }
        }
    }

    // 3. Newest first; stable sort keeps input order on ties
    groups.par_iter_mut().for_each(|(_, indices)| {
        indices.sort_by(|&a, &b| messages[b].received_at.cmp(&messages[a].received_at));
    });

    groups
        .into_iter()
        .map(|(key, indices)| {
            let thread_messages = indices.iter().map(|&i| messages[i].clone()).collect();
            assemble(key, thread_messages, contacts, tasks)
        })
        .collect()
}

fn assemble<C, T>(key: String, messages: Vec<Message>, contacts: &C, tasks: &T) -> Thread
where
    C: ContactStore + ?Sized,
    T: TaskStore + ?Sized,
{
    let latest_inbound = messages.iter().position(|m| m.is_inbound()).unwrap_or(0);
    let unread_count = messages
        .iter()
        .filter(|m| m.is_inbound() && m.is_unread())
        .count();
    let counterpart = counterpart(&messages[latest_inbound]);
    let subject = normalize_subject(&messages[0].subject);

    let contact = link_contact(&counterpart, &messages, contacts);
    let open_tasks = contact
        .as_ref()
        .map(|c| {
            let mut open = tasks.open_tasks_for(&c.id);
            open.retain(Task::is_open);
            open
        })
        .unwrap_or_default();

    Thread {
        key,
        subject,
        counterpart,
        unread_count,
        contact,
        open_tasks,
        messages,
        latest_inbound,
    }
}

/// Address match first, then the newest message filed against a contact
fn link_contact<C>(counterpart: &Address, messages: &[Message], contacts: &C) -> Option<Contact>
where
    C: ContactStore + ?Sized,
{
    let addr = counterpart.addr.trim();
    if !addr.is_empty() {
        if let Some(contact) = contacts.contact_by_email(addr) {
            return Some(contact);
        }
    }
    messages.iter().find_map(|m| match &m.related_to {
        Some(RelatedTo::Contact { id }) => contacts.contact_by_id(id),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::testing::*;
    use crate::triage::types::MessageStatus;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NO_CONTACTS: &[Contact] = &[];
    const NO_TASKS: &[Task] = &[];

    #[test]
    fn test_normalize_subject() {
        assert_eq!(normalize_subject("Re: Re: Visite"), "Visite");
        assert_eq!(normalize_subject("Visite"), "Visite");
        assert_eq!(normalize_subject("FWD: re:AW: Tr : Offre"), "Offre");
        assert_eq!(normalize_subject("  Devis  "), "Devis");
        assert_eq!(normalize_subject("Re:"), "Re:");
        assert_eq!(normalize_subject("  Re: "), "Re:");
        assert_eq!(normalize_subject("Recherche maison"), "Recherche maison");
        assert_eq!(normalize_subject(""), "");
    }

    #[test]
    fn test_normalize_subject_idempotent() {
        let subjects = [
            "Re: Re: Visite",
            "Fw: Fwd: tr: aw: Dossier",
            "RE:",
            "   ",
            "Re:   Re:",
            "Question: parking?",
            "Trajet",
            "re : re : x",
        ];
        for s in subjects {
            let once = normalize_subject(s);
            assert_eq!(normalize_subject(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_reply_collapses_into_thread() {
        let msgs = vec![
            inbox("m1", "anne@example.com", "Re: Devis", 120),
            inbox("m2", "Anne@Example.com", "Devis", 30),
        ];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].len(), 2);
        assert_eq!(threads[0].latest().id, "m2");
        assert_eq!(threads[0].subject, "Devis");
    }

    #[test]
    fn test_prefix_only_subjects_share_thread() {
        let msgs = vec![
            inbox("m1", "anne@example.com", "Re:", 120),
            inbox("m2", "anne@example.com", "Re: ", 30),
        ];
        assert_eq!(thread_key(&msgs[0]), thread_key(&msgs[1]));
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].subject, "Re:");
    }

    #[test]
    fn test_sent_and_received_share_thread() {
        let msgs = vec![
            inbox("m1", "bob@example.com", "Appartement Kirchberg", 90),
            sent("m2", "bob@example.com", "RE: Appartement Kirchberg", 10),
        ];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        let t = &threads[0];
        assert_eq!(t.latest().id, "m2");
        assert_eq!(t.latest_inbound().id, "m1");
        assert_eq!(t.counterpart.addr, "bob@example.com");
    }

    #[test]
    fn test_drafts_and_archived_excluded() {
        let mut draft = sent("m2", "anne@example.com", "Devis", 5);
        draft.folder = Folder::Drafts;
        let mut archived = inbox("m3", "anne@example.com", "Devis", 1);
        archived.folder = Folder::Archived;
        let msgs = vec![inbox("m1", "anne@example.com", "Devis", 60), draft, archived];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].len(), 1);
        assert_eq!(threads[0].latest().id, "m1");
    }

    #[test]
    fn test_outbound_only_thread_falls_back_to_latest() {
        let msgs = vec![
            sent("m1", "carl@example.com", "Offre", 60),
            sent("m2", "carl@example.com", "Re: Offre", 20),
        ];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].latest_inbound().id, "m2");
        assert!(!threads[0].has_inbound());
        assert_eq!(threads[0].unread_count, 0);
    }

    #[test]
    fn test_missing_recipient_uses_placeholder() {
        let mut msg = sent("m1", "x@example.com", "Relance", 10);
        msg.to.clear();
        let threads = build_threads(&[msg], NO_CONTACTS, NO_TASKS);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].counterpart.addr, "");
        assert_eq!(threads[0].counterpart.display(), "(no recipient)");
    }

    #[test]
    fn test_unread_counts_inbound_only() {
        let mut read = inbox("m2", "d@example.com", "Re: Visite", 50);
        read.status = MessageStatus::Read;
        let mut unread_sent = sent("m3", "d@example.com", "Re: Visite", 40);
        unread_sent.status = MessageStatus::Unread;
        let msgs = vec![inbox("m1", "d@example.com", "Visite", 60), read, unread_sent];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        assert_eq!(threads[0].unread_count, 1);
        assert_eq!(threads[0].unread_ids(), vec!["m1".to_string()]);
    }

    #[test]
    fn test_timestamp_ties_keep_input_order() {
        let msgs = vec![
            inbox("a", "e@example.com", "Plan", 10),
            inbox("b", "e@example.com", "Plan", 10),
        ];
        let threads = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
        let ids: Vec<&str> = threads[0].messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(threads[0].latest_inbound().id, "a");
    }

    #[test]
    fn test_contact_linked_by_email_with_open_tasks() {
        let contacts = vec![contact("c1", "anne@example.com")];
        let tasks = vec![
            task("t1", "c1", Some("2026-03-02T10:00:00Z")),
            Task {
                status: crate::triage::types::TaskStatus::Done,
                ..task("t2", "c1", None)
            },
            task("t3", "c9", None),
        ];
        let msgs = vec![inbox("m1", "ANNE@example.com", "Devis", 5)];
        let threads = build_threads(&msgs, contacts.as_slice(), tasks.as_slice());
        assert_eq!(threads[0].contact.as_ref().map(|c| c.id.as_str()), Some("c1"));
        let ids: Vec<&str> = threads[0].open_tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn test_contact_linked_by_crm_reference() {
        let contacts = vec![contact("c2", "other@example.com")];
        let mut msg = inbox("m1", "unknown@example.com", "Dossier", 5);
        msg.related_to = Some(RelatedTo::Contact { id: "c2".to_string() });
        let mut deal = inbox("m0", "unknown@example.com", "Dossier", 50);
        deal.related_to = Some(RelatedTo::Deal { id: "c2".to_string() });
        let threads = build_threads(&[deal.clone()], contacts.as_slice(), NO_TASKS);
        assert!(threads[0].contact.is_none());
        let threads = build_threads(&[deal, msg], contacts.as_slice(), NO_TASKS);
        assert_eq!(threads[0].contact.as_ref().map(|c| c.id.as_str()), Some("c2"));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_threads(&[], NO_CONTACTS, NO_TASKS).is_empty());
    }

    fn random_messages(rng: &mut StdRng) -> Vec<Message> {
        let people = ["a@x.lu", "B@x.lu", "c@athome.lu"];
        let subjects = ["Visite", "Re: Visite", "RE: re: visite", "Devis", "Fwd: Devis", "Bail"];
        let count = rng.gen_range(0..40);
        (0..count)
            .map(|i| {
                let who = people[rng.gen_range(0..people.len())];
                let subject = subjects[rng.gen_range(0..subjects.len())];
                let minutes = rng.gen_range(0..8);
                let mut m = match rng.gen_range(0..4) {
                    0 => sent(&format!("m{}", i), who, subject, minutes),
                    _ => inbox(&format!("m{}", i), who, subject, minutes),
                };
                if rng.gen_bool(0.1) {
                    m.folder = Folder::Drafts;
                }
                if rng.gen_bool(0.5) {
                    m.status = MessageStatus::Read;
                }
                m
            })
            .collect()
    }

    #[test]
    fn test_grouping_is_stable_and_total() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let msgs = random_messages(&mut rng);
            let first = build_threads(&msgs, NO_CONTACTS, NO_TASKS);
            let second = build_threads(&msgs, NO_CONTACTS, NO_TASKS);

            let shape = |threads: &[Thread]| -> Vec<(String, Vec<String>, String, String)> {
                threads
                    .iter()
                    .map(|t| {
                        (
                            t.key.clone(),
                            t.messages().iter().map(|m| m.id.clone()).collect(),
                            t.latest().id.clone(),
                            t.latest_inbound().id.clone(),
                        )
                    })
                    .collect()
            };
            assert_eq!(shape(&first), shape(&second));

            // Every active message lands in exactly one thread
            let mut placed: Vec<String> = first
                .iter()
                .flat_map(|t| t.messages().iter().map(|m| m.id.clone()))
                .collect();
            placed.sort();
            let mut active: Vec<String> = msgs
                .iter()
                .filter(|m| m.folder.is_active())
                .map(|m| m.id.clone())
                .collect();
            active.sort();
            assert_eq!(placed, active);

            for t in &first {
                assert!(t.messages().iter().all(|m| thread_key(m) == t.key));
                assert!(
                    t.messages()
                        .windows(2)
                        .all(|w| w[0].received_at >= w[1].received_at)
                );
            }
        }
    }
}
