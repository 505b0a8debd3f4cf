use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::triage::{Contact, ContactStore, Folder, Message, MessageStatus, Task, TaskStore};

/// In-memory copy of the agency's mail and CRM records, persisted as one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Load a snapshot; a missing file is an empty snapshot
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Self::default());
        }

        let file =
            File::open(path).with_context(|| format!("opening snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing snapshot {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            messages = snapshot.messages.len(),
            contacts = snapshot.contacts.len(),
            tasks = snapshot.tasks.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot to a sibling temp file, then rename it over `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let tmp = path.with_extension("json.tmp");
        let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("writing {}", tmp.display()))?;
        writer
            .flush()
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;

        tracing::info!(path = %path.display(), messages = self.messages.len(), "snapshot saved");
        Ok(())
    }

    /// Mark the given inbox messages read. Returns how many changed.
    pub fn mark_read(&mut self, ids: &[String]) -> usize {
        let mut changed = 0;
        for msg in self.messages.iter_mut() {
            if msg.folder == Folder::Inbox && msg.is_unread() && ids.contains(&msg.id) {
                msg.status = MessageStatus::Read;
                changed += 1;
            }
        }
        changed
    }

    /// Flip the starred flag, returns the new value
    pub fn toggle_star(&mut self, id: &str) -> Option<bool> {
        let msg = self.messages.iter_mut().find(|m| m.id == id)?;
        msg.starred = !msg.starred;
        Some(msg.starred)
    }

    /// Move messages to the archive, taking them out of active triage
    pub fn archive(&mut self, ids: &[String]) -> usize {
        let mut moved = 0;
        for msg in self.messages.iter_mut() {
            if msg.folder.is_active() && ids.contains(&msg.id) {
                msg.folder = Folder::Archived;
                moved += 1;
            }
        }
        moved
    }
}

impl ContactStore for Snapshot {
    fn contact_by_email(&self, email: &str) -> Option<Contact> {
        self.contacts.as_slice().contact_by_email(email)
    }

    fn contact_by_id(&self, id: &str) -> Option<Contact> {
        self.contacts.as_slice().contact_by_id(id)
    }
}

impl TaskStore for Snapshot {
    fn open_tasks_for(&self, contact_id: &str) -> Vec<Task> {
        self.tasks.as_slice().open_tasks_for(contact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::triage::{Address, TaskStatus};

    fn message(id: &str, folder: Folder, status: MessageStatus) -> Message {
        Message {
            id: id.to_string(),
            folder,
            from: Address::new("Anne", "anne@example.com"),
            to: vec![Address::new("Agence", "contact@agence.lu")],
            subject: "Visite".to_string(),
            preview: String::new(),
            body: String::new(),
            status,
            starred: false,
            received_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            related_to: None,
        }
    }

    fn sample() -> Snapshot {
        Snapshot {
            messages: vec![
                message("m1", Folder::Inbox, MessageStatus::Unread),
                message("m2", Folder::Sent, MessageStatus::Unread),
                message("m3", Folder::Drafts, MessageStatus::Unread),
            ],
            contacts: vec![Contact {
                id: "c1".to_string(),
                name: "Anne".to_string(),
                email: "Anne@Example.com".to_string(),
                phone: None,
            }],
            tasks: vec![
                Task {
                    id: "t1".to_string(),
                    title: "Rappeler".to_string(),
                    status: TaskStatus::InProgress,
                    due_date: Some("2026-03-02".to_string()),
                    contact_id: Some("c1".to_string()),
                },
                Task {
                    id: "t2".to_string(),
                    title: "Archivé".to_string(),
                    status: TaskStatus::Done,
                    due_date: None,
                    contact_id: Some("c1".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/snapshot.json");
        let snapshot = sample();
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.messages, snapshot.messages);
        assert_eq!(loaded.contacts, snapshot.contacts);
        assert_eq!(loaded.tasks, snapshot.tasks);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Snapshot::load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing snapshot"));
    }

    #[test]
    fn test_mark_read_only_touches_inbox() {
        let mut snapshot = sample();
        let ids = vec!["m1".to_string(), "m2".to_string()];
        assert_eq!(snapshot.mark_read(&ids), 1);
        assert_eq!(snapshot.messages[0].status, MessageStatus::Read);
        assert_eq!(snapshot.messages[1].status, MessageStatus::Unread);
        assert_eq!(snapshot.mark_read(&ids), 0);
    }

    #[test]
    fn test_star_and_archive() {
        let mut snapshot = sample();
        assert_eq!(snapshot.toggle_star("m1"), Some(true));
        assert_eq!(snapshot.toggle_star("m1"), Some(false));
        assert_eq!(snapshot.toggle_star("nope"), None);

        let ids = vec!["m1".to_string(), "m3".to_string()];
        assert_eq!(snapshot.archive(&ids), 1);
        assert_eq!(snapshot.messages[0].folder, Folder::Archived);
        assert_eq!(snapshot.messages[2].folder, Folder::Drafts);
    }

    #[test]
    fn test_lookups() {
        let snapshot = sample();
        assert_eq!(
            snapshot.contact_by_email("anne@EXAMPLE.com").map(|c| c.id),
            Some("c1".to_string())
        );
        assert!(snapshot.contact_by_id("c2").is_none());
        let open: Vec<String> = snapshot.open_tasks_for("c1").into_iter().map(|t| t.id).collect();
        assert_eq!(open, vec!["t1".to_string()]);
    }
}
