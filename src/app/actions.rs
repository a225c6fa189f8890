//! Side effects requested by the event handler.
//!
//! The store itself never talks to the network or the UI. When handling an
//! event leaves something for the host to do, [`handle_event`](super::handle_event)
//! returns it as an [`Action`] and the host executes it.

use serde::Serialize;

/// Commands for the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// The mirror could not apply a diff and needs a full snapshot.
    ///
    /// The collection still holds its state from before the rejected diff.
    /// The transport should ask the server for the whole list and deliver it
    /// as a `FullUpdate`.
    RequestFullResync {
        /// Description of the rejected operation.
        reason: String,
    },

    /// The selection changed; action bars and counters should refresh.
    SelectionChanged {
        selected_count: usize,
        selected_size: u64,
        all_selected: bool,
    },
}
