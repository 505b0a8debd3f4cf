//! Email triage: rebuild conversations from a message snapshot, sort them into
//! action queues, and rank them.
//!
//! Every function here is pure. Time is always passed in as `now`, nothing is cached
//! between passes, and queue membership is recomputed from scratch on each call.

pub mod classify;
pub mod rules;
pub mod score;
pub mod signals;
pub mod sla;
pub mod threading;
pub mod types;
pub mod worklist;

pub use classify::{classify, parse_due_date, task_urgency, TaskUrgency};
pub use rules::{RulesConfig, RulesError, TriageRules, Weights};
pub use score::{priority_label, priority_score};
pub use signals::{summary, KeywordSignalExtractor, LeadSignalExtractor, NoSignals};
pub use sla::{sla, Sla};
pub use threading::{
    build_threads, counterpart, normalize_subject, thread_key, ContactStore, TaskStore, Thread,
};
pub use types::*;
pub use worklist::{evaluate, triage, QueueCounts, TriagedThread, Worklist};
