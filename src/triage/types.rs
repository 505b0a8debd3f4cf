use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct Address {
    #[serde(default)]
    pub name: Option<String>,
    pub addr: String,
}

impl Address {
    pub fn new(name: &str, addr: &str) -> Self {
        Self {
            name: Some(name.to_string()).filter(|n| !n.is_empty()),
            addr: addr.to_string(),
        }
    }

    /// Display name, falling back to the address itself
    pub fn display(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if !self.addr.is_empty() => self.addr.clone(),
            _ => "(unknown)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    Inbox,
    Sent,
    Drafts,
    Archived,
}

impl Folder {
    /// Drafts and archived mail never take part in active triage
    pub fn is_active(self) -> bool {
        matches!(self, Folder::Inbox | Folder::Sent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Read,
    #[default]
    Unread,
}

/// CRM entity a message has been filed against
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelatedTo {
    Contact { id: String },
    Property { id: String },
    Deal { id: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub folder: Folder,
    pub from: Address,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub starred: bool,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub related_to: Option<RelatedTo>,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        self.status == MessageStatus::Unread
    }

    pub fn is_inbound(&self) -> bool {
        self.folder == Folder::Inbox
    }

    /// Subject, preview and body joined for keyword matching
    pub fn text(&self) -> String {
        format!("{} {} {}", self.subject, self.preview, self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Raw due date as stored; parsed leniently when evaluated
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub contact_id: Option<String>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        matches!(self.status, TaskStatus::Todo | TaskStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Buy,
    Sell,
    Rent,
    #[default]
    Unknown,
}

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::Buy => "Buy",
            Intent::Sell => "Sell",
            Intent::Rent => "Rent",
            Intent::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadSignals {
    pub intent: Intent,
    #[serde(default)]
    pub budget_eur: Option<u64>,
    #[serde(default)]
    pub property_reference: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl LeadSignals {
    /// The zero-contribution result used when nothing was extracted
    pub fn none() -> Self {
        Self {
            reason: "no signal".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    Now,
    Waiting,
    Fyi,
}

impl Queue {
    pub const ALL: [Queue; 3] = [Queue::Now, Queue::Waiting, Queue::Fyi];

    pub fn label(self) -> &'static str {
        match self {
            Queue::Now => "Now",
            Queue::Waiting => "Waiting",
            Queue::Fyi => "FYI",
        }
    }

    pub fn next(self) -> Queue {
        match self {
            Queue::Now => Queue::Waiting,
            Queue::Waiting => Queue::Fyi,
            Queue::Fyi => Queue::Now,
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Queue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "now" => Ok(Queue::Now),
            "waiting" => Ok(Queue::Waiting),
            "fyi" => Ok(Queue::Fyi),
            other => Err(format!("unknown queue '{}' (expected now, waiting or fyi)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLabel {
    Low,
    Medium,
    High,
}

impl PriorityLabel {
    pub fn label(self) -> &'static str {
        match self {
            PriorityLabel::Low => "low",
            PriorityLabel::Medium => "medium",
            PriorityLabel::High => "high",
        }
    }
}
