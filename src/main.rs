mod app;
mod ui;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use app::{App, Pane, View};
use triagedesk::config::Config;
use triagedesk::logging;
use triagedesk::store::Snapshot;
use triagedesk::triage::Queue;
use ui::{render_help, render_reader, render_tabs, render_worklist};

fn main() -> Result<()> {
    // Logging is best effort; the desk still works without a log file
    if let Err(e) = logging::init() {
        eprintln!("logging disabled: {:#}", e);
    }

    let config = Arc::new(Config::load());
    let rules = config
        .triage_rules()
        .context("invalid [rules] config")?;
    let snapshot_path = config.snapshot_path();
    let snapshot = Snapshot::load(&snapshot_path)?;

    let mut app = App::new(config, rules, snapshot, snapshot_path, Utc::now());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;

    if app.dirty {
        app.save()?;
    }

    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick = Duration::from_millis(app.config.refresh_ms.max(100));
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| render(app, f))?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.clear_status();
                    match app.view {
                        View::List => handle_list_key(app, key.code),
                        View::Search => handle_search_key(app, key.code),
                    }
                }
                Event::Mouse(mouse) => match (mouse.kind, app.focused_pane) {
                    (MouseEventKind::ScrollDown, Pane::List) => app.next(),
                    (MouseEventKind::ScrollDown, Pane::Reader) => app.reader_scroll_down(),
                    (MouseEventKind::ScrollUp, Pane::List) => app.previous(),
                    (MouseEventKind::ScrollUp, Pane::Reader) => app.reader_scroll_up(),
                    _ => {}
                },
                // Terminal resized - just redraw on next loop iteration
                _ => {}
            }
        }

        // SLA and age labels move with the clock, so every tick is a fresh pass
        if last_tick.elapsed() >= tick {
            app.recompute(Utc::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_list_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            if !app.search_query.is_empty() {
                app.cancel_search();
            } else {
                app.focused_pane = Pane::List;
            }
        }
        KeyCode::Char('1') => app.set_queue(Queue::Now),
        KeyCode::Char('2') => app.set_queue(Queue::Waiting),
        KeyCode::Char('3') => app.set_queue(Queue::Fyi),
        KeyCode::Tab => app.cycle_queue(),
        KeyCode::Char('h') | KeyCode::Left => app.focused_pane = Pane::List,
        KeyCode::Char('l') | KeyCode::Right => app.focused_pane = Pane::Reader,
        KeyCode::Char('j') | KeyCode::Down => match app.focused_pane {
            Pane::List => app.next(),
            Pane::Reader => app.reader_scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focused_pane {
            Pane::List => app.previous(),
            Pane::Reader => app.reader_scroll_up(),
        },
        KeyCode::Enter => {
            let changed = app.open_selected(Utc::now());
            if changed > 0 {
                app.set_status(&format!("Marked {} read", changed));
            }
        }
        KeyCode::Char('s') => match app.toggle_star_selected(Utc::now()) {
            Some(true) => app.set_status("Starred"),
            Some(false) => app.set_status("Unstarred"),
            None => {}
        },
        KeyCode::Char('e') => {
            let moved = app.archive_selected(Utc::now());
            if moved > 0 {
                app.set_status(&format!("Archived {} message(s)", moved));
            }
        }
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('R') => match Snapshot::load(&app.snapshot_path) {
            Ok(snapshot) => {
                app.reload(snapshot, Utc::now());
                app.set_status("Snapshot reloaded");
            }
            Err(e) => {
                tracing::warn!("reload failed: {:#}", e);
                app.set_status(&format!("Reload failed: {}", e));
            }
        },
        KeyCode::Char('w') => match app.save() {
            Ok(()) => app.set_status("Saved"),
            Err(e) => {
                tracing::warn!("save failed: {:#}", e);
                app.set_status(&format!("Save failed: {}", e));
            }
        },
        _ => {}
    }
}

fn handle_search_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        KeyCode::Down | KeyCode::Tab => app.next(),
        KeyCode::Up => app.previous(),
        _ => {}
    }
}

fn render(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let config = app.config.clone();
    let theme = &config.theme;

    f.render_widget(
        ratatui::widgets::Block::default().style(Style::default().bg(theme.bg())),
        area,
    );

    // Queue tabs, main area, help bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(f, chunks[0], app.queue, app.worklist.counts(), theme);

    // Two-pane layout: worklist on left, thread on right
    // Size depends on which pane is focused
    let (list_pct, reader_pct) = match app.focused_pane {
        Pane::List => (
            config.layout.list_focused_width,
            100 - config.layout.list_focused_width,
        ),
        Pane::Reader => (
            100 - config.layout.reader_focused_width,
            config.layout.reader_focused_width,
        ),
    };
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(list_pct),
            Constraint::Percentage(reader_pct),
        ])
        .split(chunks[1]);

    // Clone visible threads to avoid borrow conflict with list_state
    let visible: Vec<_> = app.visible().into_iter().cloned().collect();
    let visible_refs: Vec<_> = visible.iter().collect();
    let title = if app.search_query.is_empty() {
        app.queue.label().to_string()
    } else {
        format!("{} ({} matches)", app.queue.label(), visible.len())
    };
    render_worklist(
        f,
        panes[0],
        &visible_refs,
        &mut app.list_state,
        &title,
        app.focused_pane == Pane::List,
        theme,
        config.layout.sla_width,
        config.layout.from_width,
    );

    let selected = app.list_state.selected().and_then(|i| visible.get(i));
    render_reader(
        f,
        panes[1],
        selected,
        Utc::now(),
        app.reader_scroll,
        app.focused_pane == Pane::Reader,
        theme,
    );

    render_help(
        f,
        chunks[2],
        app.view,
        app.status_message.as_deref(),
        &app.search_query,
        app.dirty,
        theme,
    );
}
