//! Filter primitives for narrowing the torrent list.
//!
//! A [`FilterSpec`] carries three independent dimensions (status, tag, tracker)
//! and a free-text search term. A dimension with no accepted values is
//! inactive. A record passes when it passes every active dimension (AND), and
//! it passes a dimension when any of its values is accepted (OR).
//!
//! [`filter_torrents`] applies the stages in a fixed order: search term, then
//! status, then tag, then tracker. Each stage only removes records, so the
//! relative order of the input survives.

use crate::domain::{TorrentRecord, TorrentStatus, UNTAGGED};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One independent facet of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    Status,
    Tag,
    Tracker,
}

/// How the free-text search term is matched against torrent names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMatchMode {
    /// Every whitespace-separated token must occur in the name, ignoring case.
    #[default]
    Substring,
    /// Every token must fuzzy-match the name (skim algorithm).
    Fuzzy,
}

impl fmt::Display for TermMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
        })
    }
}

impl FromStr for TermMatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "fuzzy" => Ok(Self::Fuzzy),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

/// The active filter set.
///
/// # Examples
///
/// ```
/// use torrent_mirror::view::FilterSpec;
/// use torrent_mirror::domain::TorrentStatus;
///
/// let spec = FilterSpec {
///     status: vec![TorrentStatus::Seeding],
///     ..FilterSpec::default()
/// };
/// assert!(spec.is_active());
/// assert_eq!(spec.active_dimensions(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Free-text term matched against the torrent name. Empty means inactive.
    pub search: String,
    pub status: Vec<TorrentStatus>,
    pub tags: Vec<String>,
    pub trackers: Vec<String>,
}

impl FilterSpec {
    /// Accepted values for `dimension`, as wire strings.
    #[must_use]
    pub fn accepted(&self, dimension: FilterDimension) -> Vec<&str> {
        match dimension {
            FilterDimension::Status => self.status.iter().map(TorrentStatus::as_str).collect(),
            FilterDimension::Tag => self.tags.iter().map(String::as_str).collect(),
            FilterDimension::Tracker => self.trackers.iter().map(String::as_str).collect(),
        }
    }

    /// Number of active facets, counting a non-empty search term as one.
    #[must_use]
    pub fn active_dimensions(&self) -> usize {
        [
            !self.search.trim().is_empty(),
            !self.status.is_empty(),
            !self.tags.is_empty(),
            !self.trackers.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_dimensions() > 0
    }
}

/// Returns `true` if `record` passes the given dimension.
///
/// An empty `accepted` slice is an inactive filter and accepts everything.
/// For [`FilterDimension::Tag`], the pseudo-tag `untagged` accepts records
/// without any tag.
#[must_use]
pub fn matches_dimension<S: AsRef<str>>(
    record: &TorrentRecord,
    dimension: FilterDimension,
    accepted: &[S],
) -> bool {
    if accepted.is_empty() {
        return true;
    }
    let is_accepted = |value: &str| accepted.iter().any(|a| a.as_ref() == value);

    match dimension {
        FilterDimension::Status => record.status.iter().any(|s| is_accepted(s.as_str())),
        FilterDimension::Tag => {
            (record.is_untagged() && is_accepted(UNTAGGED))
                || record.tags.iter().any(|tag| is_accepted(tag.as_str()))
        }
        FilterDimension::Tracker => record.tracker_uris.iter().any(|t| is_accepted(t.as_str())),
    }
}

/// Precompiled search term.
///
/// The term is lowercased and split on whitespace once; a single matcher
/// instance is reused across records.
pub struct TermMatcher {
    tokens: Vec<String>,
    fuzzy: Option<SkimMatcherV2>,
}

impl TermMatcher {
    #[must_use]
    pub fn new(term: &str, mode: TermMatchMode) -> Self {
        let tokens: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
        let fuzzy = match mode {
            TermMatchMode::Fuzzy if !tokens.is_empty() => Some(SkimMatcherV2::default()),
            _ => None,
        };
        Self { tokens, fuzzy }
    }

    /// `true` when the term has no tokens and therefore accepts everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let name_lower = name.to_lowercase();
        self.fuzzy.as_ref().map_or_else(
            || self.tokens.iter().all(|token| name_lower.contains(token.as_str())),
            |matcher| {
                self.tokens
                    .iter()
                    .all(|token| matcher.fuzzy_match(&name_lower, token).is_some())
            },
        )
    }
}

impl fmt::Debug for TermMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermMatcher")
            .field("tokens", &self.tokens)
            .field("fuzzy", &self.fuzzy.is_some())
            .finish()
    }
}

/// Returns `true` if the record's name matches `term`. An empty term matches.
#[must_use]
pub fn matches_term(record: &TorrentRecord, term: &str, mode: TermMatchMode) -> bool {
    TermMatcher::new(term, mode).matches(&record.name)
}

/// Narrows `records` by every active facet of `spec`, keeping input order.
pub fn filter_torrents<'a>(
    records: Vec<&'a TorrentRecord>,
    spec: &FilterSpec,
    mode: TermMatchMode,
) -> Vec<&'a TorrentRecord> {
    let _span = tracing::debug_span!(
        "filter_torrents",
        input = records.len(),
        active_dimensions = spec.active_dimensions(),
        search_mode = %mode
    )
    .entered();

    let mut filtered = records;

    let term = TermMatcher::new(&spec.search, mode);
    if !term.is_empty() {
        filtered.retain(|record| term.matches(&record.name));
        tracing::trace!(remaining = filtered.len(), "search term applied");
    }

    for dimension in [FilterDimension::Status, FilterDimension::Tag, FilterDimension::Tracker] {
        let accepted = spec.accepted(dimension);
        if accepted.is_empty() {
            continue;
        }
        filtered.retain(|record| matches_dimension(record, dimension, accepted.as_slice()));
        tracing::trace!(?dimension, remaining = filtered.len(), "dimension applied");
    }

    tracing::debug!(filtered_count = filtered.len(), "filters applied");
    filtered
}
