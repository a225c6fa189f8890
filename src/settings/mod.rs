//! View settings and the seam the store reads them through.
//!
//! The store never caches sort or filter settings. Every derived read calls
//! into a [`ConfigSource`], so a change made by another part of the
//! application is picked up on the next read without any notification.
//! [`ViewSettings`] is the plain value form; wrap it in a `RefCell` (shared
//! via `Rc`) or hand the store an `Arc` when something else edits it.

use crate::domain::{MirrorError, Result};
use crate::view::{FilterSpec, SortSpec, TermMatchMode};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// Read-only access to the current sort and filter settings.
pub trait ConfigSource {
    fn sort_spec(&self) -> SortSpec;

    fn filter_spec(&self) -> FilterSpec;

    fn term_match_mode(&self) -> TermMatchMode {
        TermMatchMode::default()
    }
}

/// Persisted sort, filter and search settings.
///
/// # Examples
///
/// ```
/// use torrent_mirror::settings::{ConfigSource, ViewSettings};
/// use torrent_mirror::view::{SortDirection, TermMatchMode};
///
/// let settings = ViewSettings::from_toml_str(r#"
///     searchMode = "fuzzy"
///
///     [sort]
///     property = "name"
///     direction = "asc"
///
///     [filters]
///     tags = ["linux"]
/// "#).unwrap();
///
/// assert_eq!(settings.sort_spec().direction, SortDirection::Asc);
/// assert_eq!(settings.filter_spec().tags, vec!["linux"]);
/// assert_eq!(settings.term_match_mode(), TermMatchMode::Fuzzy);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    pub search_mode: TermMatchMode,
    pub sort: SortSpec,
    pub filters: FilterSpec,
}

impl ViewSettings {
    /// Parses settings from TOML. Missing tables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] when the TOML is invalid or a value has
    /// the wrong shape.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MirrorError::Config(format!("Failed to parse settings TOML: {e}")))
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Io`] if the file cannot be read and
    /// [`MirrorError::Config`] if it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Writes settings as TOML, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Config`] if serialization fails and
    /// [`MirrorError::Io`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| MirrorError::Config(format!("Failed to serialize settings: {e}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        tracing::debug!(path = %path.display(), "view settings saved");
        Ok(())
    }
}

impl ConfigSource for ViewSettings {
    fn sort_spec(&self) -> SortSpec {
        self.sort.clone()
    }

    fn filter_spec(&self) -> FilterSpec {
        self.filters.clone()
    }

    fn term_match_mode(&self) -> TermMatchMode {
        self.search_mode
    }
}

impl ConfigSource for RefCell<ViewSettings> {
    fn sort_spec(&self) -> SortSpec {
        self.borrow().sort_spec()
    }

    fn filter_spec(&self) -> FilterSpec {
        self.borrow().filter_spec()
    }

    fn term_match_mode(&self) -> TermMatchMode {
        self.borrow().term_match_mode()
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn sort_spec(&self) -> SortSpec {
        (**self).sort_spec()
    }

    fn filter_spec(&self) -> FilterSpec {
        (**self).filter_spec()
    }

    fn term_match_mode(&self) -> TermMatchMode {
        (**self).term_match_mode()
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Rc<T> {
    fn sort_spec(&self) -> SortSpec {
        (**self).sort_spec()
    }

    fn filter_spec(&self) -> FilterSpec {
        (**self).filter_spec()
    }

    fn term_match_mode(&self) -> TermMatchMode {
        (**self).term_match_mode()
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn sort_spec(&self) -> SortSpec {
        (**self).sort_spec()
    }

    fn filter_spec(&self) -> FilterSpec {
        (**self).filter_spec()
    }

    fn term_match_mode(&self) -> TermMatchMode {
        (**self).term_match_mode()
    }
}
