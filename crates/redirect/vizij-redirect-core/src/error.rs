//! Error types for the redirect core.
//!
//! Stale node handles are never errors: they surface as `is_deleted` flags or `None`.
//! Ambiguous and invalid auto-matches are counts, not errors.

use thiserror::Error;

use crate::ids::EntryId;

/// Failure reported by a curve store when persisting modified clips.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("curve store persist failed: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RedirectError {
    /// The clip scope resolved to no clips; there is nothing to track.
    #[error("clip scope contains no clips, nothing to track")]
    EmptyScope,

    /// The tracked root no longer denotes a live node.
    #[error("tracked root is not a live node")]
    RootNotFound,

    /// A fix target candidate lies outside the tracked subtree.
    #[error("fix target '{path}' is not the tracked root or one of its descendants")]
    Containment { path: String },

    #[error("no missing group with original path '{0}'")]
    UnknownGroup(String),

    #[error("no curve entry with id {0:?}")]
    UnknownEntry(EntryId),

    #[error("blend shape '{name}' is not available on the fix target of entry {entry:?}")]
    UnknownBlendShape { entry: EntryId, name: String },

    #[error("no tracking session is active")]
    NotTracking,

    #[error("a tracking session is already active; clear or apply it first")]
    AlreadyTracking,

    /// The rewrite pass completed but the store could not persist it.
    #[error(transparent)]
    Persist(#[from] StoreError),
}
