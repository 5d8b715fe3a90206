//! Vizij Redirect Core (engine-agnostic)
//!
//! Keeps animation curve bindings valid across hierarchy edits. A session snapshots the
//! path of every curve in a clip scope, reconciles those paths against the live tree as
//! it is edited (rename, move, delete, component stripping), lets the host or a
//! name-based heuristic pick replacement nodes for paths that no longer resolve, and
//! finally rewrites every affected clip in one pass.
//!
//! The host supplies two capabilities: a [`SceneTree`] to query its hierarchy and a
//! [`CurveStore`] to read and write curves. [`memory`] provides in-memory versions of both.

pub mod apply;
pub mod auto_match;
pub mod binding;
pub mod config;
pub mod curve;
pub mod error;
pub mod fix_target;
pub mod ids;
pub mod memory;
pub mod path;
pub mod reconcile;
pub mod scene;
pub mod session;
pub mod snapshot;
pub mod tracker;

// Re-exports for consumers (hosts)
pub use apply::ApplyReport;
pub use auto_match::AutoMatchReport;
pub use binding::{BindingClassifier, CurveBinding, CurveKind};
pub use config::Config;
pub use curve::{ClipScope, CurvePayload, CurveStore, LayerSelection, ObjectKey, ScalarKey};
pub use error::{RedirectError, StoreError};
pub use ids::{ClipId, EntryId, NodeHandle};
pub use memory::{MemoryCurveStore, MemoryScene, SceneDesc, StoreDesc};
pub use reconcile::ReconcileReport;
pub use scene::{ComponentSet, ComponentType, SceneTree};
pub use session::{
    BlendShapeInfo, CurveEntry, MissingGroup, PathChangeGroup, Session, SessionSummary,
};
pub use snapshot::SnapshotBuilder;
pub use tracker::{Tracker, TrackingState};
