//! Torrent record domain model.
//!
//! A [`TorrentRecord`] is one torrent's observable properties as reported by the
//! server, keyed by its info hash. The field set follows the server's torrent
//! list payload (camelCase on the wire). Properties the crate does not know
//! about are kept in [`TorrentRecord::extra`] and round-trip untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The full collection: info hash → record.
///
/// Iteration follows the key order, which is what "collection order" means
/// whenever ties have to be broken.
pub type TorrentList = BTreeMap<String, TorrentRecord>;

/// Tag value that selects torrents carrying no tags at all.
pub const UNTAGGED: &str = "untagged";

/// Status tags a torrent can carry. A torrent usually has several at once
/// (for example `downloading` and `active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentStatus {
    Checking,
    Seeding,
    Complete,
    Downloading,
    Stopped,
    Error,
    Inactive,
    Active,
}

impl TorrentStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Checking,
        Self::Seeding,
        Self::Complete,
        Self::Downloading,
        Self::Stopped,
        Self::Error,
        Self::Inactive,
        Self::Active,
    ];

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Seeding => "seeding",
            Self::Complete => "complete",
            Self::Downloading => "downloading",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::Inactive => "inactive",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TorrentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown torrent status: {s}"))
    }
}

/// One torrent's properties.
///
/// Only `hash`, `name`, `size_bytes`, `status`, `tags`, `tracker_uris` and
/// `date_added` take part in filtering and aggregation. The remaining fields
/// are passthrough data that the sort comparator can order by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentRecord {
    pub hash: String,
    pub name: String,
    pub size_bytes: u64,
    pub status: Vec<TorrentStatus>,
    pub tags: Vec<String>,
    /// Tracker hostnames, already reduced from announce URLs by the server.
    #[serde(rename = "trackerURIs")]
    pub tracker_uris: Vec<String>,
    /// Unix timestamp (seconds).
    pub date_added: i64,

    pub bytes_done: u64,
    pub comment: String,
    pub date_active: i64,
    pub date_created: i64,
    pub date_finished: i64,
    pub directory: String,
    pub down_rate: u64,
    pub down_total: u64,
    /// Seconds remaining, `-1` when the server cannot estimate it.
    pub eta: i64,
    pub is_private: bool,
    pub is_initial_seeding: bool,
    pub is_sequential: bool,
    pub message: String,
    pub peers_connected: u32,
    pub peers_total: u32,
    pub percent_complete: f64,
    pub priority: i32,
    pub ratio: f64,
    pub seeds_connected: u32,
    pub seeds_total: u32,
    pub up_rate: u64,
    pub up_total: u64,

    /// Properties not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TorrentRecord {
    /// Creates a record with the identifying fields set and `date_added` at
    /// the current time. Everything else starts at its default.
    ///
    /// # Examples
    ///
    /// ```
    /// use torrent_mirror::domain::{TorrentRecord, TorrentStatus};
    ///
    /// let record = TorrentRecord::new("abc", "debian.iso", 4096)
    ///     .with_status([TorrentStatus::Seeding])
    ///     .with_tags(["linux"]);
    /// assert!(record.has_status(TorrentStatus::Seeding));
    /// assert!(!record.is_untagged());
    /// ```
    #[must_use]
    pub fn new(hash: impl Into<String>, name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            size_bytes,
            date_added: Utc::now().timestamp(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl IntoIterator<Item = TorrentStatus>) -> Self {
        self.status = status.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_trackers<S: Into<String>>(mut self, trackers: impl IntoIterator<Item = S>) -> Self {
        self.tracker_uris = trackers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_date_added(mut self, timestamp: i64) -> Self {
        self.date_added = timestamp;
        self
    }

    #[must_use]
    pub fn has_status(&self, status: TorrentStatus) -> bool {
        self.status.contains(&status)
    }

    #[must_use]
    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }

    /// `true` when the server reported no usable ETA.
    #[must_use]
    pub const fn has_infinite_eta(&self) -> bool {
        self.eta < 0
    }

    /// `date_added` as a UTC datetime, `None` if the timestamp is out of range.
    #[must_use]
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date_added, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_server_payload() {
        let record: TorrentRecord = serde_json::from_value(json!({
            "hash": "ABC",
            "name": "ubuntu.iso",
            "sizeBytes": 100,
            "status": ["downloading", "active"],
            "tags": ["linux"],
            "trackerURIs": ["tracker.example.org"],
            "dateAdded": 1_700_000_000,
            "eta": -1,
            "percentComplete": 12.5,
            "isPrivate": true,
            "customField": {"nested": 1}
        }))
        .unwrap();

        assert_eq!(record.hash, "ABC");
        assert_eq!(record.size_bytes, 100);
        assert_eq!(record.status, vec![TorrentStatus::Downloading, TorrentStatus::Active]);
        assert_eq!(record.tracker_uris, vec!["tracker.example.org"]);
        assert!(record.has_infinite_eta());
        assert!(record.is_private);
        assert_eq!(record.extra.get("customField"), Some(&json!({"nested": 1})));
    }

    #[test]
    fn serializes_with_wire_names_and_keeps_extra_fields() {
        let mut record = TorrentRecord::new("h1", "name", 5).with_trackers(["t.org"]);
        record.extra.insert("label".into(), json!("x"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sizeBytes"], json!(5));
        assert_eq!(value["trackerURIs"], json!(["t.org"]));
        assert_eq!(value["label"], json!("x"));

        let back: TorrentRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Seeding".parse::<TorrentStatus>(), Ok(TorrentStatus::Seeding));
        assert!("paused".parse::<TorrentStatus>().is_err());
    }

    #[test]
    fn added_at_converts_unix_seconds() {
        let record = TorrentRecord::new("h", "n", 0).with_date_added(0);
        assert_eq!(record.added_at().map(|dt| dt.timestamp()), Some(0));
    }
}
