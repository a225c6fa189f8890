//! Replays a recorded event log through the store.
//!
//! ```text
//! torrent-mirror <events.jsonl> [config.toml]
//! ```
//!
//! Each non-empty line of the log is one [`Event`] as JSON. Events are fed to
//! [`handle_event`] in order; resync requests are reported as they happen and
//! a summary of the final collection, view and selection is printed at the
//! end. Lines that do not decode are reported and skipped, and make the
//! process exit non-zero.

#![allow(clippy::multiple_crate_versions)]

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::ExitCode;
use torrent_mirror::{handle_event, Action, Config, ConfigSource, Event, MirrorError, TorrentStore, ViewSettings};

const PREVIEW_ROWS: usize = 10;

struct ReplayStats {
    events: usize,
    skipped: usize,
    resyncs: usize,
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(log_path) = args.next() else {
        eprintln!("usage: torrent-mirror <events.jsonl> [config.toml]");
        return ExitCode::from(2);
    };

    let config = match args.next().map(Config::from_file).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    if let Some(trace_file) = torrent_mirror::observability::init_tracing(&config) {
        eprintln!("tracing to {}", trace_file.display());
    }

    let _span = tracing::info_span!("replay", log = %log_path).entered();
    let mut store = TorrentStore::new(torrent_mirror::initialize(&config));

    match replay(Path::new(&log_path), &mut store) {
        Ok(stats) => {
            print_summary(&store, &stats);
            if stats.skipped == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn replay(path: &Path, store: &mut TorrentStore<ViewSettings>) -> torrent_mirror::Result<ReplayStats> {
    let reader = BufReader::new(File::open(path)?);
    let mut stats = ReplayStats {
        events: 0,
        skipped: 0,
        resyncs: 0,
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                let err = MirrorError::Decode(format!("line {line_number}: {e}"));
                tracing::warn!(error = %err, "skipping event");
                eprintln!("{err}");
                stats.skipped += 1;
                continue;
            }
        };

        stats.events += 1;
        let (_, actions) = handle_event(store, &event)?;
        for action in actions {
            if let Action::RequestFullResync { reason } = action {
                stats.resyncs += 1;
                println!("line {line_number}: resync requested: {reason}");
            }
        }
    }

    Ok(stats)
}

fn print_summary(store: &TorrentStore<ViewSettings>, stats: &ReplayStats) {
    let view = store.filtered_view();
    let sort = store.config().sort_spec();

    println!(
        "events: {} applied, {} skipped, {} resync requests",
        stats.events, stats.skipped, stats.resyncs
    );
    println!("torrents: {} total, {} visible", store.len(), view.len());
    println!(
        "selection: {} torrents, {} bytes{}",
        store.selected_count(),
        store.selected_total_size(),
        if store.is_all_selected() { " (all)" } else { "" }
    );

    let taxonomy = store.taxonomy();
    for (status, count) in taxonomy.status_counts.iter().filter(|(k, _)| !k.is_empty()) {
        println!("  {status}: {count}");
    }

    println!("first {} by {} {:?}:", PREVIEW_ROWS.min(view.len()), sort.property, sort.direction);
    for torrent in view.iter().take(PREVIEW_ROWS) {
        println!("  {}  {:>12}  {}", torrent.hash, torrent.size_bytes, torrent.name);
    }
}
