//! Sort comparator for the torrent list.
//!
//! A [`SortSpec`] names a torrent property (wire name, e.g. `sizeBytes`) and a
//! direction. [`sort_torrents`] produces a stable order: records whose keys
//! compare equal keep their collection order in both directions, and for
//! distinct keys `desc` is the exact reverse of `asc`.
//!
//! Numbers and timestamps compare naturally. Text compares case-insensitively
//! with embedded digit runs compared by value, so `"Episode 9"` sorts before
//! `"Episode 10"`. Case folding is Unicode lowercase followed by code point
//! order; there is no locale collation, so accented letters sort after the
//! ASCII alphabet. An ETA of `-1` (unknown) sorts as infinitely far away.
//!
//! A property the comparator does not know leaves the input untouched.

use crate::domain::TorrentRecord;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Sort property and direction, as stored in user settings.
///
/// The property stays a plain string so that settings written by a newer or
/// older client still load; it is resolved at sort time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub property: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            property: SortProperty::DateAdded.as_str().to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    #[must_use]
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Resolves the property name, `None` if it is not sortable.
    #[must_use]
    pub fn resolve(&self) -> Option<SortProperty> {
        self.property.parse().ok()
    }

    /// Parses `"<property>"` or `"<property>:<asc|desc>"`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the direction is not `asc`
    /// or `desc`. The property itself is not validated here.
    pub fn parse_compact(value: &str) -> std::result::Result<Self, String> {
        let (property, direction) = match value.split_once(':') {
            Some((property, direction)) => (property, direction.parse()?),
            None => (value, SortDirection::default()),
        };
        Ok(Self::new(property.trim(), direction))
    }
}

/// Torrent properties the comparator can order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortProperty {
    BytesDone,
    Comment,
    DateActive,
    DateAdded,
    DateCreated,
    DateFinished,
    Directory,
    DownRate,
    DownTotal,
    Eta,
    Hash,
    IsPrivate,
    Message,
    Name,
    /// Connected peers.
    Peers,
    PercentComplete,
    Priority,
    Ratio,
    /// Connected seeds.
    Seeds,
    SizeBytes,
    Tags,
    TrackerUris,
    UpRate,
    UpTotal,
}

impl SortProperty {
    pub const ALL: [Self; 24] = [
        Self::BytesDone,
        Self::Comment,
        Self::DateActive,
        Self::DateAdded,
        Self::DateCreated,
        Self::DateFinished,
        Self::Directory,
        Self::DownRate,
        Self::DownTotal,
        Self::Eta,
        Self::Hash,
        Self::IsPrivate,
        Self::Message,
        Self::Name,
        Self::Peers,
        Self::PercentComplete,
        Self::Priority,
        Self::Ratio,
        Self::Seeds,
        Self::SizeBytes,
        Self::Tags,
        Self::TrackerUris,
        Self::UpRate,
        Self::UpTotal,
    ];

    /// Wire name of the property.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BytesDone => "bytesDone",
            Self::Comment => "comment",
            Self::DateActive => "dateActive",
            Self::DateAdded => "dateAdded",
            Self::DateCreated => "dateCreated",
            Self::DateFinished => "dateFinished",
            Self::Directory => "directory",
            Self::DownRate => "downRate",
            Self::DownTotal => "downTotal",
            Self::Eta => "eta",
            Self::Hash => "hash",
            Self::IsPrivate => "isPrivate",
            Self::Message => "message",
            Self::Name => "name",
            Self::Peers => "peers",
            Self::PercentComplete => "percentComplete",
            Self::Priority => "priority",
            Self::Ratio => "ratio",
            Self::Seeds => "seeds",
            Self::SizeBytes => "sizeBytes",
            Self::Tags => "tags",
            Self::TrackerUris => "trackerURIs",
            Self::UpRate => "upRate",
            Self::UpTotal => "upTotal",
        }
    }

    fn key<'a>(&self, record: &'a TorrentRecord) -> SortKey<'a> {
        match self {
            Self::BytesDone => SortKey::unsigned(record.bytes_done),
            Self::Comment => SortKey::Text(Cow::Borrowed(&record.comment)),
            Self::DateActive => SortKey::Int(record.date_active),
            Self::DateAdded => SortKey::Int(record.date_added),
            Self::DateCreated => SortKey::Int(record.date_created),
            Self::DateFinished => SortKey::Int(record.date_finished),
            Self::Directory => SortKey::Text(Cow::Borrowed(&record.directory)),
            Self::DownRate => SortKey::unsigned(record.down_rate),
            Self::DownTotal => SortKey::unsigned(record.down_total),
            Self::Eta if record.has_infinite_eta() => SortKey::Int(i64::MAX),
            Self::Eta => SortKey::Int(record.eta),
            Self::Hash => SortKey::Text(Cow::Borrowed(&record.hash)),
            Self::IsPrivate => SortKey::Flag(record.is_private),
            Self::Message => SortKey::Text(Cow::Borrowed(&record.message)),
            Self::Name => SortKey::Text(Cow::Borrowed(&record.name)),
            Self::Peers => SortKey::Int(i64::from(record.peers_connected)),
            Self::PercentComplete => SortKey::Float(record.percent_complete),
            Self::Priority => SortKey::Int(i64::from(record.priority)),
            Self::Ratio => SortKey::Float(record.ratio),
            Self::Seeds => SortKey::Int(i64::from(record.seeds_connected)),
            Self::SizeBytes => SortKey::unsigned(record.size_bytes),
            Self::Tags => SortKey::Text(Cow::Owned(record.tags.join(","))),
            Self::TrackerUris => SortKey::Text(Cow::Owned(record.tracker_uris.join(","))),
            Self::UpRate => SortKey::unsigned(record.up_rate),
            Self::UpTotal => SortKey::unsigned(record.up_total),
        }
    }

    /// Ascending comparison of two records by this property.
    #[must_use]
    pub fn compare(&self, a: &TorrentRecord, b: &TorrentRecord) -> Ordering {
        self.key(a).cmp_key(&self.key(b))
    }
}

impl fmt::Display for SortProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortProperty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "peersConnected" => return Ok(Self::Peers),
            "seedsConnected" => return Ok(Self::Seeds),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|property| property.as_str() == s)
            .ok_or_else(|| format!("unknown sort property: {s}"))
    }
}

enum SortKey<'a> {
    Int(i64),
    Float(f64),
    Flag(bool),
    Text(Cow<'a, str>),
}

impl SortKey<'_> {
    fn unsigned(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => compare_text(a, b),
            // A property always yields the same variant.
            _ => Ordering::Equal,
        }
    }
}

/// Case-insensitive comparison with digit runs compared by numeric value.
#[must_use]
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().flat_map(char::to_lowercase).peekable();
    let mut right = b.chars().flat_map(char::to_lowercase).peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut Peekable<I>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Orders `records` by `spec`. The input order is the tie breaker.
///
/// Unknown properties return the input unchanged.
pub fn sort_torrents<'a>(mut records: Vec<&'a TorrentRecord>, spec: &SortSpec) -> Vec<&'a TorrentRecord> {
    let _span = tracing::debug_span!(
        "sort_torrents",
        count = records.len(),
        property = %spec.property,
        direction = ?spec.direction
    )
    .entered();

    let Some(property) = spec.resolve() else {
        tracing::warn!(property = %spec.property, "unknown sort property, keeping collection order");
        return records;
    };

    records.sort_by(|a, b| {
        let ordering = property.compare(a, b);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(records: &[&TorrentRecord]) -> Vec<String> {
        records.iter().map(|r| r.hash.clone()).collect()
    }

    fn sized(hash: &str, name: &str, size: u64) -> TorrentRecord {
        TorrentRecord::new(hash, name, size).with_date_added(0)
    }

    #[test]
    fn sorts_numbers_in_both_directions() {
        let records = [sized("a", "x", 30), sized("b", "y", 10), sized("c", "z", 20)];
        let asc = sort_torrents(records.iter().collect(), &SortSpec::new("sizeBytes", SortDirection::Asc));
        let desc = sort_torrents(records.iter().collect(), &SortSpec::new("sizeBytes", SortDirection::Desc));
        assert_eq!(hashes(&asc), vec!["b", "c", "a"]);
        assert_eq!(hashes(&desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn ties_keep_collection_order_in_both_directions() {
        let records = [sized("a", "x", 5), sized("b", "y", 9), sized("c", "z", 5), sized("d", "w", 5)];
        let asc = sort_torrents(records.iter().collect(), &SortSpec::new("sizeBytes", SortDirection::Asc));
        let desc = sort_torrents(records.iter().collect(), &SortSpec::new("sizeBytes", SortDirection::Desc));
        assert_eq!(hashes(&asc), vec!["a", "c", "d", "b"]);
        assert_eq!(hashes(&desc), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn names_sort_naturally_and_ignore_case() {
        let records = [
            sized("a", "episode 10", 0),
            sized("b", "Episode 9", 0),
            sized("c", "alpha", 0),
            sized("d", "Beta", 0),
        ];
        let asc = sort_torrents(records.iter().collect(), &SortSpec::new("name", SortDirection::Asc));
        assert_eq!(hashes(&asc), vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn unknown_eta_sorts_last_ascending() {
        let mut soon = sized("a", "a", 0);
        soon.eta = 60;
        let mut never = sized("b", "b", 0);
        never.eta = -1;
        let mut later = sized("c", "c", 0);
        later.eta = 3600;
        let records = [never, soon, later];
        let asc = sort_torrents(records.iter().collect(), &SortSpec::new("eta", SortDirection::Asc));
        assert_eq!(hashes(&asc), vec!["a", "c", "b"]);
    }

    #[test]
    fn unknown_property_keeps_input_order() {
        let records = [sized("b", "x", 1), sized("a", "y", 2)];
        let out = sort_torrents(records.iter().collect(), &SortSpec::new("favouriteColour", SortDirection::Asc));
        assert_eq!(hashes(&out), vec!["b", "a"]);
    }

    #[test]
    fn aliases_resolve_to_connected_counts() {
        assert_eq!("peersConnected".parse::<SortProperty>(), Ok(SortProperty::Peers));
        assert_eq!("seeds".parse::<SortProperty>(), Ok(SortProperty::Seeds));
        assert_eq!("trackerURIs".parse::<SortProperty>(), Ok(SortProperty::TrackerUris));
    }

    #[test]
    fn compact_spec_parses_direction() {
        let spec = SortSpec::parse_compact("name:asc").unwrap();
        assert_eq!(spec, SortSpec::new("name", SortDirection::Asc));
        assert_eq!(SortSpec::parse_compact("ratio").unwrap().direction, SortDirection::Desc);
        assert!(SortSpec::parse_compact("ratio:sideways").is_err());
    }

    #[test]
    fn digit_runs_compare_by_value() {
        assert_eq!(compare_text("file2", "file10"), Ordering::Less);
        assert_eq!(compare_text("file010", "file10"), Ordering::Equal);
        assert_eq!(compare_text("ABC", "abd"), Ordering::Less);
    }
}
