//! Domain layer for the torrent mirror.
//!
//! Core data types independent of how snapshots and diffs reach the process.
//!
//! - [`error`]: Error types and result alias
//! - [`torrent`]: Torrent record model and status tags

pub mod error;
pub mod torrent;

pub use error::{MirrorError, Result};
pub use torrent::{TorrentList, TorrentRecord, TorrentStatus, UNTAGGED};
