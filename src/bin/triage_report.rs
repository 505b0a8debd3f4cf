//! Print the triaged worklist for a snapshot without starting the UI.
//!
//! Usage: triage_report [snapshot.json] [--queue now|waiting|fyi] [--search text]

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use triagedesk::config::Config;
use triagedesk::logging;
use triagedesk::store::Snapshot;
use triagedesk::triage::{triage, KeywordSignalExtractor, Queue, TriagedThread};

struct Args {
    snapshot: Option<PathBuf>,
    queue: Option<Queue>,
    search: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        snapshot: None,
        queue: None,
        search: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--queue" => {
                let value = args.next().context("--queue needs a value")?;
                parsed.queue = Some(value.parse().map_err(anyhow::Error::msg)?);
            }
            "--search" => {
                parsed.search = Some(args.next().context("--search needs a value")?);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            path => {
                if parsed.snapshot.is_some() {
                    bail!("only one snapshot path may be given");
                }
                parsed.snapshot = Some(PathBuf::from(shellexpand::tilde(path).into_owned()));
            }
        }
    }
    Ok(parsed)
}

fn print_row(t: &TriagedThread) {
    let from: String = t.thread.counterpart.display().chars().take(24).collect();
    let subject: String = t.thread.subject.chars().take(50).collect();
    println!(
        "  {:>3} {:<6} {:<9} {:<24} {}",
        t.score,
        t.priority.label(),
        t.sla.label(),
        from,
        subject
    );
    println!("      {}", t.summary);
}

fn main() -> Result<()> {
    // Config problems are reported through tracing; surface them on stderr
    if let Err(e) = logging::init_stderr() {
        eprintln!("logging disabled: {:#}", e);
    }
    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::load();
    let rules = config.triage_rules().context("invalid [rules] config")?;
    let path = args.snapshot.unwrap_or_else(|| config.snapshot_path());

    let snapshot = Snapshot::load(&path)?;
    println!("Snapshot: {}", path.display());
    println!(
        "  {} messages, {} contacts, {} tasks",
        snapshot.messages.len(),
        snapshot.contacts.len(),
        snapshot.tasks.len()
    );

    let extractor = KeywordSignalExtractor::new(rules.clone());
    let worklist = triage(
        &snapshot.messages,
        &snapshot,
        &snapshot,
        &extractor,
        &rules,
        Utc::now(),
    );

    let counts = worklist.counts();
    println!(
        "\nNow: {}  Waiting: {}  FYI: {}  (total {})",
        counts.now,
        counts.waiting,
        counts.fyi,
        counts.total()
    );

    let queues: Vec<Queue> = match args.queue {
        Some(q) => vec![q],
        None => Queue::ALL.to_vec(),
    };
    for queue in queues {
        let items = worklist.filter(queue, args.search.as_deref());
        println!("\n{} ({})", queue.label(), items.len());
        for t in items {
            print_row(t);
        }
    }

    Ok(())
}
