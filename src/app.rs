use chrono::{DateTime, Utc};
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::sync::Arc;

use triagedesk::config::Config;
use triagedesk::store::Snapshot;
use triagedesk::triage::{triage, KeywordSignalExtractor, Queue, TriageRules, TriagedThread, Worklist};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    List,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pane {
    List,
    Reader,
}

pub struct App {
    pub config: Arc<Config>,
    pub rules: TriageRules,
    extractor: KeywordSignalExtractor,
    pub snapshot: Snapshot,
    pub snapshot_path: PathBuf,
    pub worklist: Worklist,
    pub queue: Queue,
    pub view: View,
    pub focused_pane: Pane,
    pub search_query: String,
    pub list_state: ListState,
    pub reader_scroll: u16,
    pub status_message: Option<String>,
    pub should_quit: bool,
    /// Snapshot has changes not yet written to disk
    pub dirty: bool,
}

impl App {
    pub fn new(
        config: Arc<Config>,
        rules: TriageRules,
        snapshot: Snapshot,
        snapshot_path: PathBuf,
        now: DateTime<Utc>,
    ) -> Self {
        let mut app = Self {
            config,
            extractor: KeywordSignalExtractor::new(rules.clone()),
            rules,
            snapshot,
            snapshot_path,
            worklist: Worklist::default(),
            queue: Queue::Now,
            view: View::List,
            focused_pane: Pane::List,
            search_query: String::new(),
            list_state: ListState::default(),
            reader_scroll: 0,
            status_message: None,
            should_quit: false,
            dirty: false,
        };
        app.recompute(now);
        app
    }

    /// Re-run triage against the snapshot, keeping the selection on the same thread
    pub fn recompute(&mut self, now: DateTime<Utc>) {
        let selected = self.selected_key();
        self.worklist = triage(
            &self.snapshot.messages,
            &self.snapshot,
            &self.snapshot,
            &self.extractor,
            &self.rules,
            now,
        );
        self.restore_selection(selected);
    }

    fn query(&self) -> Option<&str> {
        Some(self.search_query.as_str()).filter(|q| !q.trim().is_empty())
    }

    /// Threads shown for the active queue and search
    pub fn visible(&self) -> Vec<&TriagedThread> {
        self.worklist.filter(self.queue, self.query())
    }

    pub fn selected(&self) -> Option<&TriagedThread> {
        let i = self.list_state.selected()?;
        self.visible().get(i).copied()
    }

    fn selected_key(&self) -> Option<String> {
        self.selected().map(|t| t.thread.key.clone())
    }

    fn restore_selection(&mut self, key: Option<String>) {
        let (position, len) = {
            let visible = self.visible();
            let position = key.and_then(|k| visible.iter().position(|t| t.thread.key == k));
            (position, visible.len())
        };
        let index = match (position, self.list_state.selected()) {
            (Some(i), _) => Some(i),
            (None, _) if len == 0 => None,
            (None, Some(i)) => Some(i.min(len - 1)),
            (None, None) => Some(0),
        };
        if index != self.list_state.selected() {
            self.reader_scroll = 0;
        }
        self.list_state.select(index);
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.select(i);
    }

    pub fn previous(&mut self) {
        if self.visible().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.select(i);
    }

    fn select(&mut self, i: usize) {
        if self.list_state.selected() != Some(i) {
            self.reader_scroll = 0;
        }
        self.list_state.select(Some(i));
    }

    pub fn set_queue(&mut self, queue: Queue) {
        if self.queue != queue {
            self.queue = queue;
            self.list_state.select(None);
            self.restore_selection(None);
        }
    }

    pub fn cycle_queue(&mut self) {
        self.set_queue(self.queue.next());
    }

    pub fn start_search(&mut self) {
        self.search_query.clear();
        self.view = View::Search;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_query.push(c);
        self.list_state.select(None);
        self.restore_selection(None);
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.list_state.select(None);
        self.restore_selection(None);
    }

    /// Leave search mode, keeping the filter
    pub fn confirm_search(&mut self) {
        self.view = View::List;
    }

    pub fn cancel_search(&mut self) {
        let selected = self.selected_key();
        self.search_query.clear();
        self.view = View::List;
        self.restore_selection(selected);
    }

    /// Open the selected thread: its inbound mail counts as read from now on.
    /// Returns how many messages changed.
    pub fn open_selected(&mut self, now: DateTime<Utc>) -> usize {
        let Some(ids) = self.selected().map(|t| t.thread.unread_ids()) else {
            return 0;
        };
        self.focused_pane = Pane::Reader;
        let changed = self.snapshot.mark_read(&ids);
        if changed > 0 {
            self.dirty = true;
            tracing::debug!(changed, "marked thread read");
            self.recompute(now);
        }
        changed
    }

    /// Star or unstar the latest message of the selected thread
    pub fn toggle_star_selected(&mut self, now: DateTime<Utc>) -> Option<bool> {
        let id = self.selected()?.thread.latest().id.clone();
        let starred = self.snapshot.toggle_star(&id)?;
        self.dirty = true;
        self.recompute(now);
        Some(starred)
    }

    /// Archive every message of the selected thread. Returns how many moved.
    pub fn archive_selected(&mut self, now: DateTime<Utc>) -> usize {
        let Some(ids) = self
            .selected()
            .map(|t| t.thread.messages().iter().map(|m| m.id.clone()).collect::<Vec<_>>())
        else {
            return 0;
        };
        let moved = self.snapshot.archive(&ids);
        if moved > 0 {
            self.dirty = true;
            self.recompute(now);
        }
        moved
    }

    pub fn reload(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        self.snapshot = snapshot;
        self.dirty = false;
        self.recompute(now);
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.snapshot.save(&self.snapshot_path)?;
        self.dirty = false;
        Ok(())
    }

    pub fn reader_scroll_down(&mut self) {
        self.reader_scroll = self.reader_scroll.saturating_add(3);
    }

    pub fn reader_scroll_up(&mut self) {
        self.reader_scroll = self.reader_scroll.saturating_sub(3);
    }
}
