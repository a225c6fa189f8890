//! Platform path resolution.
//!
//! The data directory holds the trace file and, by convention, saved view
//! settings. It follows the XDG base directory layout:
//! `$XDG_DATA_HOME/torrent-mirror`, falling back to
//! `$HOME/.local/share/torrent-mirror`.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "torrent-mirror";

/// Returns the data directory, or `None` when neither `XDG_DATA_HOME` nor
/// `HOME` is set.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    resolve_data_dir(env::var("XDG_DATA_HOME").ok().as_deref(), env::var("HOME").ok().as_deref())
}

fn resolve_data_dir(xdg_data_home: Option<&str>, home: Option<&str>) -> Option<PathBuf> {
    let base = match (xdg_data_home, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) if !home.is_empty() => PathBuf::from(home).join(".local").join("share"),
        _ => return None,
    };
    Some(base.join(APP_DIR))
}

/// Expands a leading `~` to `$HOME`. Other paths are returned unchanged.
///
/// # Examples
///
/// ```
/// use torrent_mirror::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/etc/mirror.toml").to_str(), Some("/etc/mirror.toml"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, env::var("HOME").ok().as_deref())
}

fn expand_tilde_with(path: &str, home: Option<&str>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => PathBuf::from(home),
        (_, Some(home)) if path.starts_with("~/") => PathBuf::from(home).join(&path[2..]),
        _ => PathBuf::from(path),
    }
}
