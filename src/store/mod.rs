//! The torrent collection store.
//!
//! [`TorrentStore`] owns the canonical hash → record mapping and the current
//! selection. The collection only changes through [`TorrentStore::replace_all`]
//! (full snapshot) and [`TorrentStore::apply_diff`] (incremental patch); the
//! selection only changes through selection events and the select-all family.
//!
//! Sorted and filtered views are derived on every read from the collection and
//! the settings behind the store's [`ConfigSource`]. Nothing is cached, so a
//! settings change is visible on the next read.
//!
//! # Example
//!
//! ```
//! use torrent_mirror::domain::{TorrentList, TorrentRecord};
//! use torrent_mirror::settings::ViewSettings;
//! use torrent_mirror::store::TorrentStore;
//! use torrent_mirror::view::SelectionEvent;
//!
//! let mut store = TorrentStore::new(ViewSettings::default());
//! let snapshot: TorrentList = [
//!     TorrentRecord::new("h1", "debian.iso", 100),
//!     TorrentRecord::new("h2", "arch.iso", 250),
//! ]
//! .into_iter()
//! .map(|t| (t.hash.clone(), t))
//! .collect();
//!
//! store.replace_all(snapshot);
//! store.select_all();
//! assert_eq!(store.selected_total_size(), 350);
//!
//! store.set_selection(&SelectionEvent::simple("h1"));
//! assert_eq!(store.selected_count(), 1);
//! ```

pub mod patch;

pub use patch::{apply_operations, parse_json_patch, ElementIndex, PatchOperation, PatchPath, PatchTarget};

use crate::domain::{Result, TorrentList, TorrentRecord};
use crate::settings::ConfigSource;
use crate::view::{filter_torrents, resolve_selection, sort_torrents, SelectionEvent, Taxonomy};
use serde_json::Value;

/// Client-side mirror of the server's torrent collection.
#[derive(Debug, Clone)]
pub struct TorrentStore<C> {
    config: C,
    torrents: TorrentList,
    /// Set semantics; the last element is the range anchor.
    selected: Vec<String>,
}

impl<C: ConfigSource> TorrentStore<C> {
    /// Creates an empty store reading view settings from `config`.
    ///
    /// # Parameters
    ///
    /// * `config` - Source of the sort, filter and term-matching settings,
    ///   consulted on every view read
    ///
    /// # Returns
    ///
    /// A store with no torrents and an empty selection.
    pub fn new(config: C) -> Self {
        Self {
            config,
            torrents: TorrentList::new(),
            selected: Vec::new(),
        }
    }

    /// The settings source the views are computed from.
    pub const fn config(&self) -> &C {
        &self.config
    }

    /// Mutable access to the settings source. Changes apply to the next view
    /// read; the selection is not revalidated.
    pub fn config_mut(&mut self) -> &mut C {
        &mut self.config
    }

    /// Discards the collection and installs `snapshot` as is.
    ///
    /// The selection is left alone; keys that no longer exist become inert.
    pub fn replace_all(&mut self, snapshot: TorrentList) {
        let _span = tracing::debug_span!(
            "replace_all",
            previous = self.torrents.len(),
            incoming = snapshot.len()
        )
        .entered();

        self.torrents = snapshot;
        tracing::debug!(torrent_count = self.torrents.len(), "snapshot installed");
    }

    /// Applies `ops` in order as one unit.
    ///
    /// Operations are staged against a copy of the collection, which replaces
    /// the live one only after every operation succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::MalformedPatch`](crate::MirrorError::MalformedPatch)
    /// for the first operation that cannot be resolved. The collection is then
    /// exactly as it was before the call, and the caller should request a full
    /// snapshot.
    pub fn apply_diff(&mut self, ops: &[PatchOperation]) -> Result<()> {
        let _span = tracing::debug_span!("apply_diff", ops = ops.len(), torrents = self.torrents.len()).entered();

        if ops.is_empty() {
            return Ok(());
        }

        let mut staged = self.torrents.clone();
        if let Err(err) = apply_operations(&mut staged, ops) {
            tracing::warn!(error = %err, "diff rejected, collection unchanged");
            return Err(err);
        }

        self.torrents = staged;
        tracing::debug!(torrent_count = self.torrents.len(), "diff applied");
        Ok(())
    }

    /// Decodes a JSON Patch document and applies it with [`Self::apply_diff`].
    ///
    /// # Errors
    ///
    /// [`MirrorError::Decode`](crate::MirrorError::Decode) for a document that
    /// is not a list of patch objects, otherwise as [`Self::apply_diff`].
    pub fn apply_json_patch(&mut self, document: &Value) -> Result<()> {
        let ops = parse_json_patch(document)?;
        self.apply_diff(&ops)
    }

    /// The whole collection keyed by hash, in key order.
    ///
    /// Every record's `hash` equals its key.
    #[must_use]
    pub const fn torrents(&self) -> &TorrentList {
        &self.torrents
    }

    #[must_use]
    pub fn get(&self, hash: &str) -> Option<&TorrentRecord> {
        self.torrents.get(hash)
    }

    /// Number of torrents in the collection, ignoring filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }

    /// Every record, ordered by the configured sort spec.
    #[must_use]
    pub fn sorted_view(&self) -> Vec<&TorrentRecord> {
        let spec = self.config.sort_spec();
        let _span = tracing::debug_span!(
            "sorted_view",
            property = %spec.property,
            direction = ?spec.direction,
            torrents = self.torrents.len()
        )
        .entered();

        sort_torrents(self.torrents.values().collect(), &spec)
    }

    /// The sorted view narrowed by the configured filters.
    #[must_use]
    pub fn filtered_view(&self) -> Vec<&TorrentRecord> {
        let spec = self.config.filter_spec();
        filter_torrents(self.sorted_view(), &spec, self.config.term_match_mode())
    }

    fn filtered_hashes(&self) -> Vec<&str> {
        self.filtered_view().into_iter().map(|t| t.hash.as_str()).collect()
    }

    /// Applies a click-style selection event against the filtered view.
    pub fn set_selection(&mut self, event: &SelectionEvent) {
        let _span = tracing::debug_span!(
            "set_selection",
            hash = %event.hash,
            modifier = ?event.modifier,
            before = self.selected.len()
        )
        .entered();

        let next = resolve_selection(event, &self.selected, &self.filtered_hashes());
        self.selected = next;
        tracing::debug!(selected_count = self.selected.len(), "selection updated");
    }

    /// Selects exactly the keys of the filtered view.
    pub fn select_all(&mut self) {
        let next: Vec<String> = self.filtered_hashes().into_iter().map(String::from).collect();
        tracing::debug!(selected_count = next.len(), "select all");
        self.selected = next;
    }

    pub fn deselect_all(&mut self) {
        tracing::debug!(previous = self.selected.len(), "deselect all");
        self.selected.clear();
    }

    /// Deselects everything if [`Self::is_all_selected`], else selects all.
    pub fn toggle_select_all(&mut self) {
        if self.is_all_selected() {
            self.deselect_all();
        } else {
            self.select_all();
        }
    }

    /// Drops selected keys that are not in the filtered view.
    ///
    /// Stale keys are otherwise kept; this is the only place they are pruned.
    /// Returns the number of keys dropped.
    pub fn reconcile_selection(&mut self) -> usize {
        let visible = self.filtered_hashes();
        let before = self.selected.len();
        let kept: Vec<String> = self
            .selected
            .iter()
            .filter(|hash| visible.contains(&hash.as_str()))
            .cloned()
            .collect();
        self.selected = kept;

        let dropped = before - self.selected.len();
        tracing::debug!(dropped, remaining = self.selected.len(), "selection reconciled");
        dropped
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected keys, including stale ones.
    #[must_use]
    pub fn selected_hashes(&self) -> &[String] {
        &self.selected
    }

    /// Selected records that still exist in the collection.
    #[must_use]
    pub fn selected_torrents(&self) -> Vec<&TorrentRecord> {
        self.selected.iter().filter_map(|hash| self.torrents.get(hash)).collect()
    }

    /// Sum of `size_bytes` over the selection. Keys that are not in the
    /// collection contribute nothing.
    #[must_use]
    pub fn selected_total_size(&self) -> u64 {
        self.selected
            .iter()
            .map(|hash| {
                self.torrents.get(hash).map_or_else(
                    || {
                        tracing::trace!(%hash, "selected hash not in collection");
                        0
                    },
                    |t| t.size_bytes,
                )
            })
            .fold(0, u64::saturating_add)
    }

    /// Whether the selection is as large as the filtered view.
    ///
    /// This compares counts, not keys. A selection holding stale keys can
    /// match the view's size without matching its contents and still report
    /// `true`; call [`Self::reconcile_selection`] first when that matters.
    /// An empty view with an empty selection also reports `true`.
    #[must_use]
    pub fn is_all_selected(&self) -> bool {
        self.selected.len() == self.filtered_view().len()
    }

    /// Per-status, per-tag and per-tracker counts over the whole collection.
    #[must_use]
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::from_torrents(self.torrents.values())
    }
}
