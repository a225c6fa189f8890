//! Event handling for the torrent mirror.
//!
//! Events arrive from two directions: the server (snapshots and diffs, via
//! the transport) and the user (selection clicks and the select-all family).
//! [`handle_event`] routes each one to the store and reports whether the view
//! needs redrawing along with any [`Action`]s for the host.
//!
//! Events are plain serde data so that a session can be recorded as JSON
//! lines and replayed later:
//!
//! ```json
//! {"type":"fullUpdate","torrents":{"h1":{"hash":"h1","name":"a","sizeBytes":100}}}
//! {"type":"diffChange","ops":[{"op":"replace","path":"/h1/name","value":"b"}]}
//! {"type":"select","modifier":"range","hash":"h1"}
//! {"type":"selectAll"}
//! ```

use crate::app::Action;
use crate::domain::{Result, TorrentList};
use crate::settings::ConfigSource;
use crate::store::{PatchOperation, TorrentStore};
use crate::view::SelectionEvent;
use serde::{Deserialize, Serialize};

/// Inputs to the store, from the server or from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// Full snapshot of the server's collection.
    FullUpdate { torrents: TorrentList },
    /// Incremental change to apply on top of the current collection.
    DiffChange { ops: Vec<PatchOperation> },
    /// A click on a row, with its modifier state.
    Select(SelectionEvent),
    SelectAll,
    DeselectAll,
    /// The action bar's select button.
    ToggleSelectAll,
    /// Prune selected keys that left the filtered view.
    ReconcileSelection,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FullUpdate { .. } => "full_update",
            Self::DiffChange { .. } => "diff_change",
            Self::Select(_) => "select",
            Self::SelectAll => "select_all",
            Self::DeselectAll => "deselect_all",
            Self::ToggleSelectAll => "toggle_select_all",
            Self::ReconcileSelection => "reconcile_selection",
        }
    }
}

/// Processes an event against `store`.
///
/// Returns whether the visible list or selection changed, plus actions for
/// the host. A diff the store rejects is not an error here: the collection is
/// unchanged and the handler asks for a full resync instead.
///
/// # Errors
///
/// Propagates store errors other than a malformed patch.
///
/// # Example
///
/// ```
/// use torrent_mirror::app::{handle_event, Action, Event};
/// use torrent_mirror::settings::ViewSettings;
/// use torrent_mirror::store::{PatchOperation, TorrentStore};
///
/// let mut store = TorrentStore::new(ViewSettings::default());
/// let event = Event::DiffChange { ops: vec![PatchOperation::remove_torrent("missing")] };
///
/// let (changed, actions) = handle_event(&mut store, &event)?;
/// assert!(!changed);
/// assert!(matches!(actions[0], Action::RequestFullResync { .. }));
/// # Ok::<(), torrent_mirror::MirrorError>(())
/// ```
pub fn handle_event<C: ConfigSource>(store: &mut TorrentStore<C>, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = event.name()).entered();

    match event {
        Event::FullUpdate { torrents } => {
            store.replace_all(torrents.clone());
            Ok((true, selection_report(store)))
        }
        Event::DiffChange { ops } => match store.apply_diff(ops) {
            Ok(()) => Ok((true, selection_report(store))),
            Err(err) if err.is_malformed_patch() => {
                tracing::warn!(error = %err, "requesting full resync");
                Ok((
                    false,
                    vec![Action::RequestFullResync {
                        reason: err.to_string(),
                    }],
                ))
            }
            Err(err) => Err(err),
        },
        Event::Select(selection) => Ok(track_selection(store, |s| s.set_selection(selection))),
        Event::SelectAll => Ok(track_selection(store, TorrentStore::select_all)),
        Event::DeselectAll => Ok(track_selection(store, TorrentStore::deselect_all)),
        Event::ToggleSelectAll => Ok(track_selection(store, TorrentStore::toggle_select_all)),
        Event::ReconcileSelection => Ok(track_selection(store, |s| {
            s.reconcile_selection();
        })),
    }
}

fn track_selection<C: ConfigSource>(
    store: &mut TorrentStore<C>,
    mutate: impl FnOnce(&mut TorrentStore<C>),
) -> (bool, Vec<Action>) {
    let before = store.selected_hashes().to_vec();
    mutate(store);

    if store.selected_hashes() == before.as_slice() {
        tracing::trace!("selection unchanged");
        return (false, vec![]);
    }
    (true, vec![selection_changed(store)])
}

/// Collection changes can alter the size of an unchanged selection.
fn selection_report<C: ConfigSource>(store: &TorrentStore<C>) -> Vec<Action> {
    if store.selected_count() == 0 {
        vec![]
    } else {
        vec![selection_changed(store)]
    }
}

fn selection_changed<C: ConfigSource>(store: &TorrentStore<C>) -> Action {
    Action::SelectionChanged {
        selected_count: store.selected_count(),
        selected_size: store.selected_total_size(),
        all_selected: store.is_all_selected(),
    }
}
