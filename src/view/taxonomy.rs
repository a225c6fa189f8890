//! Per-facet counts over the whole collection.
//!
//! Sidebars show how many torrents carry each status, tag and tracker, and
//! how much data each tag holds. Counts are taken over the full collection,
//! not the filtered view, so they stay stable while the user narrows the list.
//! Each count map also carries the collection total under the empty key.

use crate::domain::{TorrentRecord, TorrentStatus, UNTAGGED};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub status_counts: BTreeMap<String, usize>,
    pub tag_counts: BTreeMap<String, usize>,
    pub tag_sizes: BTreeMap<String, u64>,
    pub tracker_counts: BTreeMap<String, usize>,
}

impl Taxonomy {
    pub fn from_torrents<'a>(torrents: impl IntoIterator<Item = &'a TorrentRecord>) -> Self {
        let mut taxonomy = Self::default();
        let mut total = 0usize;

        for torrent in torrents {
            total += 1;

            for status in &torrent.status {
                *taxonomy.status_counts.entry(status.as_str().to_string()).or_default() += 1;
            }

            if torrent.is_untagged() {
                taxonomy.count_tag(UNTAGGED, torrent.size_bytes);
            }
            for tag in &torrent.tags {
                taxonomy.count_tag(tag, torrent.size_bytes);
            }

            for tracker in &torrent.tracker_uris {
                *taxonomy.tracker_counts.entry(tracker.clone()).or_default() += 1;
            }
        }

        for counts in [
            &mut taxonomy.status_counts,
            &mut taxonomy.tag_counts,
            &mut taxonomy.tracker_counts,
        ] {
            counts.insert(String::new(), total);
        }

        taxonomy
    }

    fn count_tag(&mut self, tag: &str, size_bytes: u64) {
        *self.tag_counts.entry(tag.to_string()).or_default() += 1;
        let size = self.tag_sizes.entry(tag.to_string()).or_default();
        *size = size.saturating_add(size_bytes);
    }

    #[must_use]
    pub fn status_count(&self, status: TorrentStatus) -> usize {
        self.status_counts.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Number of torrents the taxonomy was built from.
    #[must_use]
    pub fn total(&self) -> usize {
        self.status_counts.get("").copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_facet() {
        let torrents = [
            TorrentRecord::new("a", "a", 100)
                .with_status([TorrentStatus::Seeding, TorrentStatus::Complete])
                .with_tags(["linux"])
                .with_trackers(["t1"]),
            TorrentRecord::new("b", "b", 50)
                .with_status([TorrentStatus::Seeding])
                .with_tags(["linux", "iso"])
                .with_trackers(["t1", "t2"]),
            TorrentRecord::new("c", "c", 7).with_status([TorrentStatus::Stopped]),
        ];

        let taxonomy = Taxonomy::from_torrents(&torrents);

        assert_eq!(taxonomy.total(), 3);
        assert_eq!(taxonomy.status_count(TorrentStatus::Seeding), 2);
        assert_eq!(taxonomy.status_count(TorrentStatus::Error), 0);
        assert_eq!(taxonomy.tag_counts.get("linux"), Some(&2));
        assert_eq!(taxonomy.tag_counts.get(UNTAGGED), Some(&1));
        assert_eq!(taxonomy.tag_counts.get(""), Some(&3));
        assert_eq!(taxonomy.tag_sizes.get("linux"), Some(&150));
        assert_eq!(taxonomy.tag_sizes.get(UNTAGGED), Some(&7));
        assert_eq!(taxonomy.tracker_counts.get("t1"), Some(&2));
        assert_eq!(taxonomy.tracker_counts.get("t2"), Some(&1));
    }

    #[test]
    fn empty_collection_has_zero_totals() {
        let taxonomy = Taxonomy::from_torrents(std::iter::empty());
        assert_eq!(taxonomy.total(), 0);
        assert!(taxonomy.tag_sizes.is_empty());
    }
}
