//! torrent-mirror: a client-side mirror of a remote torrent collection.
//!
//! The server owns the list of torrents. A client keeps a copy in sync by
//! installing full snapshots and applying incremental JSON Patch diffs, and
//! shows the user a sorted, filtered, multi-selectable view of it.
//! This crate is that copy and the derivations on top of it.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Replay binary (main.rs)                            │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Event routing
//! │  - FullUpdate / DiffChange / selection events       │
//! │  - Resync and selection-changed actions             │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Collection Store (store/)                          │  ← State
//! │  - Snapshot install, atomic diff apply              │
//! │  - Selection set                                    │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Views (view/) │   │ Settings      │   │ Patches       │
//! │ - Sort        │   │ (settings/)   │   │ (store/patch) │
//! │ - Filter      │   │ - ConfigSource│   │ - JSON Patch  │
//! │ - Selection   │   │ - TOML files  │   │ - Typed paths │
//! │ - Taxonomy    │   │               │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (domain/): TorrentRecord, MirrorError       │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - OpenTelemetry spans to a rotating JSON lines file│
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: event handler and host actions
//! - [`domain`]: torrent record model and errors
//! - [`store`]: the collection store and patch model
//! - [`view`]: pure sort, filter, selection and taxonomy functions
//! - [`settings`]: view settings and the [`ConfigSource`] seam
//! - [`infrastructure`]: data directory and path helpers
//! - [`observability`]: tracing setup
//!
//! # Example
//!
//! ```rust
//! use torrent_mirror::{handle_event, initialize, Config, Event, TorrentStore};
//! use torrent_mirror::view::SelectionEvent;
//!
//! let settings = initialize(&Config::default());
//! let mut store = TorrentStore::new(settings);
//!
//! let snapshot = serde_json::from_str(r#"{
//!     "h1": {"hash": "h1", "name": "debian.iso", "sizeBytes": 100, "dateAdded": 2},
//!     "h2": {"hash": "h2", "name": "arch.iso", "sizeBytes": 250, "dateAdded": 1}
//! }"#)?;
//!
//! for event in [
//!     Event::FullUpdate { torrents: snapshot },
//!     Event::Select(SelectionEvent::simple("h1")),
//!     Event::Select(SelectionEvent::range("h2")),
//! ] {
//!     let (_changed, _actions) = handle_event(&mut store, &event)?;
//! }
//!
//! assert_eq!(store.selected_total_size(), 350);
//! # Ok::<(), torrent_mirror::MirrorError>(())
//! ```

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod settings;
pub mod store;
pub mod view;

pub mod observability;

pub use app::{handle_event, Action, Event};
pub use domain::{MirrorError, Result, TorrentList, TorrentRecord, TorrentStatus};
pub use settings::{ConfigSource, ViewSettings};
pub use store::{PatchOperation, TorrentStore};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use view::{SortSpec, TermMatchMode};

/// Runtime configuration.
///
/// Comes from a key/value map handed over by a host, or from a TOML file:
///
/// ```toml
/// trace_level = "debug"
/// search_mode = "fuzzy"
/// settings_file = "~/.config/torrent-mirror/view.toml"
///
/// [default_sort]
/// property = "name"
/// direction = "asc"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directive for tracing. `RUST_LOG` overrides it.
    /// Default: `"info"` when unset.
    pub trace_level: Option<String>,

    /// How the search term matches torrent names. Default: substring.
    pub search_mode: TermMatchMode,

    /// Sort used when no saved view settings exist. Default: `dateAdded` desc.
    pub default_sort: SortSpec,

    /// Size at which the trace file rotates.
    pub trace_file_max_bytes: u64,

    /// Overrides the platform data directory for the trace file.
    pub data_dir: Option<PathBuf>,

    /// Saved [`ViewSettings`] to start from, if present.
    pub settings_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_level: None,
            search_mode: TermMatchMode::default(),
            default_sort: SortSpec::default(),
            trace_file_max_bytes: observability::DEFAULT_MAX_BYTES,
            data_dir: None,
            settings_file: None,
        }
    }
}

impl Config {
    /// Parses configuration from a string map.
    ///
    /// Unparseable values fall back to their defaults and are logged.
    ///
    /// # Parsing Rules
    ///
    /// - `trace_level`, `data_dir`, `settings_file`: taken as is (`~` expanded for paths)
    /// - `search_mode`: `substring` or `fuzzy`
    /// - `default_sort`: `"<property>"` or `"<property>:<asc|desc>"`
    /// - `trace_file_max_bytes`: unsigned integer
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use torrent_mirror::Config;
    /// use torrent_mirror::view::{SortDirection, TermMatchMode};
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("search_mode".to_string(), "fuzzy".to_string());
    /// map.insert("default_sort".to_string(), "name:asc".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.search_mode, TermMatchMode::Fuzzy);
    /// assert_eq!(config.default_sort.property, "name");
    /// assert_eq!(config.default_sort.direction, SortDirection::Asc);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let search_mode = map
            .get("search_mode")
            .and_then(|s| {
                s.parse::<TermMatchMode>()
                    .map_err(|e| tracing::debug!(error = %e, "ignoring search_mode"))
                    .ok()
            })
            .unwrap_or(defaults.search_mode);

        let default_sort = map
            .get("default_sort")
            .and_then(|s| {
                SortSpec::parse_compact(s)
                    .map_err(|e| tracing::debug!(error = %e, "ignoring default_sort"))
                    .ok()
            })
            .unwrap_or(defaults.default_sort);

        let trace_file_max_bytes = map
            .get("trace_file_max_bytes")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(defaults.trace_file_max_bytes);

        Self {
            trace_level: map.get("trace_level").cloned(),
            search_mode,
            default_sort,
            trace_file_max_bytes,
            data_dir: map.get("data_dir").map(|p| infrastructure::expand_tilde(p)),
            settings_file: map.get("settings_file").map(|p| infrastructure::expand_tilde(p)),
        }
    }

    /// Parses configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] for invalid TOML or mistyped values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(toml_str).map_err(|e| MirrorError::Config(format!("Failed to parse config TOML: {e}")))?;
        config.data_dir = config.data_dir.as_deref().map(expand_path);
        config.settings_file = config.settings_file.as_deref().map(expand_path);
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_toml_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    path.to_str().map_or_else(|| path.to_path_buf(), infrastructure::expand_tilde)
}

/// Builds the initial view settings.
///
/// Saved settings from `config.settings_file` are used when they load;
/// otherwise the sort and search mode come from `config` with no filters.
///
/// # Example
///
/// ```rust
/// use torrent_mirror::{initialize, Config};
/// use torrent_mirror::view::SortSpec;
///
/// let config = Config {
///     default_sort: SortSpec::parse_compact("sizeBytes:asc").unwrap(),
///     ..Config::default()
/// };
///
/// let settings = initialize(&config);
/// assert_eq!(settings.sort.property, "sizeBytes");
/// ```
#[must_use]
pub fn initialize(config: &Config) -> ViewSettings {
    tracing::debug!("initializing torrent mirror");

    let from_config = || ViewSettings {
        search_mode: config.search_mode,
        sort: config.default_sort.clone(),
        filters: view::FilterSpec::default(),
    };

    config.settings_file.as_ref().map_or_else(from_config, |path| {
        ViewSettings::from_file(path).unwrap_or_else(|e| {
            tracing::debug!(settings_file = %path.display(), error = %e, "failed to load view settings, using config defaults");
            from_config()
        })
    })
}
