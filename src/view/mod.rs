//! Pure derivation functions over torrent records.
//!
//! Nothing in this module holds state. The store composes these functions on
//! every read, feeding them the current collection and the settings read from
//! its configuration source.
//!
//! - [`filter`]: facet and search-term matching
//! - [`sort`]: stable comparator over record properties
//! - [`selection`]: click/shift/ctrl selection resolver
//! - [`taxonomy`]: per-status, per-tag and per-tracker counts

pub mod filter;
pub mod selection;
pub mod sort;
pub mod taxonomy;

pub use filter::{
    filter_torrents, matches_dimension, matches_term, FilterDimension, FilterSpec, TermMatchMode,
    TermMatcher,
};
pub use selection::{resolve_selection, SelectionEvent, SelectionModifier};
pub use sort::{compare_text, sort_torrents, SortDirection, SortProperty, SortSpec};
pub use taxonomy::Taxonomy;
