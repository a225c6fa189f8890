use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Command;
use torrent_mirror::view::{SelectionEvent, SortDirection, TermMatchMode};
use torrent_mirror::{handle_event, initialize, Action, Config, Event, TorrentStore};

const EVENT_LOG: &str = r#"
{"type":"fullUpdate","torrents":{"h1":{"hash":"h1","name":"ubuntu.iso","sizeBytes":100,"dateAdded":3,"status":["seeding"]},"h2":{"hash":"h2","name":"fedora.iso","sizeBytes":250,"dateAdded":2,"status":["downloading"],"tags":["linux"]},"h3":{"hash":"h3","name":"notes.txt","sizeBytes":5,"dateAdded":1}}}
{"type":"select","hash":"h1"}
{"type":"select","modifier":"range","hash":"h2"}
{"type":"diffChange","ops":[{"op":"replace","path":"/h2/sizeBytes","value":300},{"op":"add","path":"/h4","value":{"hash":"h4","name":"arch.iso","sizeBytes":1,"dateAdded":4}}]}
{"type":"diffChange","ops":[{"op":"remove","path":"/missing"}]}
{"type":"toggleSelectAll"}
"#;

fn write_fixture(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let log = dir.join("events.jsonl");
    fs::write(&log, EVENT_LOG).unwrap();

    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!(
            "trace_level = \"debug\"\nsearch_mode = \"fuzzy\"\ndata_dir = {:?}\n\n[default_sort]\nproperty = \"sizeBytes\"\ndirection = \"asc\"\n",
            dir.join("data").display().to_string()
        ),
    )
    .unwrap();
    (log, config)
}

#[test]
fn config_file_drives_initial_settings() {
    let dir = tempfile::tempdir().unwrap();
    let (_, config_path) = write_fixture(dir.path());

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.trace_level.as_deref(), Some("debug"));

    let settings = initialize(&config);
    assert_eq!(settings.search_mode, TermMatchMode::Fuzzy);
    assert_eq!(settings.sort.property, "sizeBytes");
    assert_eq!(settings.sort.direction, SortDirection::Asc);
}

#[test]
fn recorded_session_replays_through_the_handler() {
    let dir = tempfile::tempdir().unwrap();
    let (log, _) = write_fixture(dir.path());

    let mut store = TorrentStore::new(initialize(&Config::default()));
    let mut resyncs = Vec::new();

    for line in BufReader::new(fs::File::open(log).unwrap()).lines() {
        let line = line.unwrap();
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line).unwrap();
        let (_, actions) = handle_event(&mut store, &event).unwrap();
        resyncs.extend(
            actions
                .into_iter()
                .filter(|a| matches!(a, Action::RequestFullResync { .. })),
        );
    }

    assert_eq!(resyncs.len(), 1);
    assert_eq!(store.len(), 4);
    assert_eq!(store.get("h2").map(|t| t.size_bytes), Some(300));
    // h1 and h2 were selected out of four visible, so the toggle selects all.
    assert_eq!(store.selected_count(), 4);
    assert_eq!(store.selected_total_size(), 406);
}

#[test]
fn selection_event_without_modifier_is_a_simple_click() {
    let event: Event = serde_json::from_str(r#"{"type":"select","hash":"h1"}"#).unwrap();
    assert_eq!(event, Event::Select(SelectionEvent::simple("h1")));
}

#[test]
fn replay_binary_prints_a_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (log, config) = write_fixture(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_torrent-mirror"))
        .arg(&log)
        .arg(&config)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("resync requested"));
    assert!(stdout.contains("torrents: 4 total, 4 visible"));
    assert!(stdout.contains("selection: 4 torrents, 406 bytes (all)"));
}

#[test]
fn replay_binary_fails_on_undecodable_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("bad.jsonl");
    fs::write(&log, "{\"type\":\"selectAll\"}\nnot json\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_torrent-mirror"))
        .arg(&log)
        .env("XDG_DATA_HOME", dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 2"));
}
