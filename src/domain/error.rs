//! Error types for the torrent mirror.
//!
//! This module defines the centralized error type [`MirrorError`] and a type alias
//! [`Result`] used throughout the crate. Errors are implemented with `thiserror`.
//!
//! Only conditions that leave the caller with something to do are errors. A
//! selection or size lookup that references an unknown hash, or a sort spec
//! naming an unknown property, is handled in place (no-op or fallback order)
//! and only logged.

use thiserror::Error;

/// The main error type for torrent mirror operations.
///
/// # Examples
///
/// ```
/// use torrent_mirror::MirrorError;
///
/// let err = MirrorError::malformed_patch(0, "no torrent with hash abc");
/// assert!(err.is_malformed_patch());
/// ```
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A diff operation could not be resolved against the current collection.
    ///
    /// The collection is left exactly as it was before the diff. Callers are
    /// expected to request a full snapshot to restore consistency.
    #[error("Malformed patch at operation {index}: {reason}")]
    MalformedPatch {
        /// Zero-based position of the offending operation within the diff.
        index: usize,
        /// What could not be resolved.
        reason: String,
    },

    /// Incoming JSON (snapshot, diff, or replay event) could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MirrorError {
    /// Builds a [`MirrorError::MalformedPatch`] for the operation at `index`.
    pub fn malformed_patch(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPatch {
            index,
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`MirrorError::MalformedPatch`].
    #[must_use]
    pub const fn is_malformed_patch(&self) -> bool {
        matches!(self, Self::MalformedPatch { .. })
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A specialized `Result` type for torrent mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
