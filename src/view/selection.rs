//! Selection resolver for click-style multi-select.
//!
//! The resolver is a pure function from (event, current selection, ordered
//! candidate keys) to the next selection. The candidate list is the filtered
//! view, so ranges always follow what the user sees.
//!
//! The selection is kept as a vector with set semantics. Its last element is
//! the anchor for the next range extension: a plain click or a toggle-on makes
//! the clicked key the anchor, and a range is stored running from the clicked
//! key back to the anchor so that repeated shift-clicks pivot on the same key.

use serde::{Deserialize, Serialize};

/// Modifier state that accompanied a selection click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionModifier {
    /// Plain click: select exactly this key.
    #[default]
    None,
    /// Shift-click: select the contiguous run from the anchor.
    Range,
    /// Ctrl/Cmd-click: flip membership of this key.
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    #[serde(default)]
    pub modifier: SelectionModifier,
    pub hash: String,
}

impl SelectionEvent {
    /// Builds an event for a click on `hash` with the given modifier.
    ///
    /// [`Self::simple`], [`Self::range`] and [`Self::toggle`] are shorthands
    /// for the three modifiers.
    pub fn new(modifier: SelectionModifier, hash: impl Into<String>) -> Self {
        Self {
            modifier,
            hash: hash.into(),
        }
    }

    pub fn simple(hash: impl Into<String>) -> Self {
        Self::new(SelectionModifier::None, hash)
    }

    pub fn range(hash: impl Into<String>) -> Self {
        Self::new(SelectionModifier::Range, hash)
    }

    pub fn toggle(hash: impl Into<String>) -> Self {
        Self::new(SelectionModifier::Toggle, hash)
    }
}

/// Computes the selection that results from `event`.
///
/// A key that is not among `candidates` leaves the selection unchanged.
///
/// # Parameters
///
/// * `event` - The click and its modifier
/// * `current` - Selected keys, most recently clicked last
/// * `candidates` - Keys of the filtered view in display order
///
/// # Returns
///
/// The new selection, with the anchor for the next range event last.
///
/// # Examples
///
/// ```
/// use torrent_mirror::view::{resolve_selection, SelectionEvent};
///
/// let view = ["a", "b", "c", "d", "e"];
/// let selected = resolve_selection(&SelectionEvent::simple("c"), &[], &view);
/// let mut selected = resolve_selection(&SelectionEvent::range("a"), &selected, &view);
/// selected.sort();
/// assert_eq!(selected, vec!["a", "b", "c"]);
/// ```
#[must_use]
pub fn resolve_selection<S: AsRef<str>>(
    event: &SelectionEvent,
    current: &[String],
    candidates: &[S],
) -> Vec<String> {
    let position = |key: &str| candidates.iter().position(|c| c.as_ref() == key);

    let Some(target) = position(event.hash.as_str()) else {
        tracing::debug!(hash = %event.hash, "selection target not in view, ignoring");
        return current.to_vec();
    };

    match event.modifier {
        SelectionModifier::None => vec![event.hash.clone()],
        SelectionModifier::Toggle => {
            if current.contains(&event.hash) {
                current.iter().filter(|k| **k != event.hash).cloned().collect()
            } else {
                let mut next = current.to_vec();
                next.push(event.hash.clone());
                next
            }
        }
        SelectionModifier::Range => {
            let anchor = current
                .iter()
                .rev()
                .find_map(|key| position(key.as_str()))
                .unwrap_or(0);

            if target <= anchor {
                candidates[target..=anchor]
                    .iter()
                    .map(|c| c.as_ref().to_string())
                    .collect()
            } else {
                candidates[anchor..=target]
                    .iter()
                    .rev()
                    .map(|c| c.as_ref().to_string())
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: [&str; 5] = ["a", "b", "c", "d", "e"];

    fn sorted(mut keys: Vec<String>) -> Vec<String> {
        keys.sort();
        keys
    }

    #[test]
    fn simple_click_selects_only_the_key() {
        let current = vec!["a".to_string(), "b".to_string()];
        assert_eq!(resolve_selection(&SelectionEvent::simple("d"), &current, &VIEW), vec!["d"]);
    }

    #[test]
    fn range_extends_back_from_anchor() {
        let selected = resolve_selection(&SelectionEvent::simple("c"), &[], &VIEW);
        let selected = resolve_selection(&SelectionEvent::range("a"), &selected, &VIEW);
        assert_eq!(sorted(selected), vec!["a", "b", "c"]);
    }

    #[test]
    fn range_extends_forward_from_anchor() {
        let selected = resolve_selection(&SelectionEvent::simple("b"), &[], &VIEW);
        let selected = resolve_selection(&SelectionEvent::range("e"), &selected, &VIEW);
        assert_eq!(sorted(selected), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn repeated_range_pivots_on_the_same_anchor() {
        let selected = resolve_selection(&SelectionEvent::simple("b"), &[], &VIEW);
        let selected = resolve_selection(&SelectionEvent::range("e"), &selected, &VIEW);
        let selected = resolve_selection(&SelectionEvent::range("a"), &selected, &VIEW);
        assert_eq!(sorted(selected), vec!["a", "b"]);
    }

    #[test]
    fn range_without_visible_anchor_starts_at_first_key() {
        let stale = vec!["zz".to_string()];
        let selected = resolve_selection(&SelectionEvent::range("c"), &stale, &VIEW);
        assert_eq!(sorted(selected), vec!["a", "b", "c"]);
    }

    #[test]
    fn toggle_flips_membership() {
        let current = vec!["b".to_string()];
        let selected = resolve_selection(&SelectionEvent::toggle("b"), &current, &VIEW);
        assert!(selected.is_empty());
        let selected = resolve_selection(&SelectionEvent::toggle("b"), &selected, &VIEW);
        assert_eq!(selected, vec!["b"]);
    }

    #[test]
    fn toggled_key_becomes_the_anchor() {
        let selected = resolve_selection(&SelectionEvent::simple("a"), &[], &VIEW);
        let selected = resolve_selection(&SelectionEvent::toggle("d"), &selected, &VIEW);
        let selected = resolve_selection(&SelectionEvent::range("e"), &selected, &VIEW);
        assert_eq!(sorted(selected), vec!["d", "e"]);
    }

    #[test]
    fn key_outside_view_is_a_no_op() {
        let current = vec!["b".to_string()];
        for event in [
            SelectionEvent::simple("x"),
            SelectionEvent::range("x"),
            SelectionEvent::toggle("x"),
        ] {
            assert_eq!(resolve_selection(&event, &current, &VIEW), current);
        }
    }
}
