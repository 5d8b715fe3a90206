//! Session: the aggregate tracking state between snapshot and apply.
//!
//! A session exclusively owns its groups and entries. Node handles stored here are
//! weak identities into the external tree and are revalidated on every use.
//! Groups only ever migrate from `missing_groups` to `path_change_groups`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::binding::{BindingClassifier, CurveBinding};
use crate::config::Config;
use crate::curve::{ClipScope, CurvePayload};
use crate::error::RedirectError;
use crate::ids::{ClipId, EntryId, IdAllocator, NodeHandle};
use crate::path;
use crate::scene::{ComponentType, SceneTree};

/// Blend-shape metadata of a captured curve.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendShapeInfo {
    /// Name in the captured property (`blendShape.<original_name>`).
    pub original_name: String,
    /// Name the curve will be written under on the fix target.
    pub candidate_name: Option<String>,
    /// Blend shapes offered by the current fix target's mesh.
    pub available_names: Vec<String>,
}

impl BlendShapeInfo {
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            candidate_name: None,
            available_names: Vec::new(),
        }
    }

    /// Replace the available names and choose a candidate: keep the current candidate
    /// while still offered, else the original name, else the first name.
    pub(crate) fn refresh(&mut self, available: Vec<String>) {
        self.available_names = available;
        let keep = self
            .candidate_name
            .as_ref()
            .filter(|c| self.available_names.contains(c))
            .cloned();
        self.candidate_name = keep
            .or_else(|| {
                self.available_names
                    .iter()
                    .find(|n| **n == self.original_name)
                    .cloned()
            })
            .or_else(|| self.available_names.first().cloned());
    }

    pub(crate) fn reset(&mut self) {
        self.available_names.clear();
        self.candidate_name = None;
    }
}

/// One captured curve whose path no longer resolved at snapshot time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveEntry {
    pub id: EntryId,
    pub clip: ClipId,
    pub binding: CurveBinding,
    /// Payload as captured; written back unchanged when the entry is fixed.
    pub payload: CurvePayload,
    /// Canonical group name from the classifier.
    pub group: String,
    pub blend_shape: Option<BlendShapeInfo>,
    pub marked_for_removal: bool,
    /// Derived from the group's fix target; never set directly by callers.
    pub ready_to_fix: bool,
}

impl CurveEntry {
    #[inline]
    pub fn is_blend_shape(&self) -> bool {
        self.blend_shape.is_some()
    }
}

/// Bindings whose path still resolved at snapshot time, tracked through a stable handle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PathChangeGroup {
    pub original_path: String,
    pub handle: NodeHandle,
    /// Recomputed on every reconciliation; `None` while deleted.
    pub current_path: Option<String>,
    pub is_deleted: bool,
    /// Deduplicated by binding triple.
    pub bindings: Vec<CurveBinding>,
}

impl PathChangeGroup {
    pub fn new(original_path: impl Into<String>, handle: NodeHandle) -> Self {
        let original_path = original_path.into();
        Self {
            current_path: Some(original_path.clone()),
            original_path,
            handle,
            is_deleted: false,
            bindings: Vec::new(),
        }
    }

    /// Append unless a binding with the same triple is already tracked.
    pub fn add_binding(&mut self, binding: CurveBinding) -> bool {
        if self.bindings.contains(&binding) {
            return false;
        }
        self.bindings.push(binding);
        true
    }

    /// Deleted, or moved/renamed since the snapshot.
    pub fn is_changed(&self) -> bool {
        self.is_deleted || self.current_path.as_deref() != Some(self.original_path.as_str())
    }
}

/// Curves whose path did not resolve, bucketed by component type.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MissingGroup {
    pub original_path: String,
    pub buckets: IndexMap<ComponentType, Vec<CurveEntry>>,
    pub fix_target: Option<NodeHandle>,
}

impl MissingGroup {
    pub fn new(original_path: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            buckets: IndexMap::new(),
            fix_target: None,
        }
    }

    /// Simple name of the missing node (last path segment).
    pub fn leaf_name(&self) -> &str {
        path::leaf_name(&self.original_path)
    }

    /// Append unless the same clip already contributed the same binding triple.
    pub fn add_entry(&mut self, entry: CurveEntry) -> bool {
        let bucket = self
            .buckets
            .entry(entry.binding.component_type.clone())
            .or_default();
        if bucket
            .iter()
            .any(|e| e.clip == entry.clip && e.binding == entry.binding)
        {
            return false;
        }
        bucket.push(entry);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &CurveEntry> {
        self.buckets.values().flatten()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut CurveEntry> {
        self.buckets.values_mut().flatten()
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Component types with at least one entry not marked for removal.
    pub fn required_types(&self) -> Vec<ComponentType> {
        self.buckets
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| !e.marked_for_removal))
            .map(|(ty, _)| ty.clone())
            .collect()
    }

    /// At least one entry is not marked for removal.
    pub fn has_live_entries(&self) -> bool {
        self.entries().any(|e| !e.marked_for_removal)
    }

    /// Every entry that is not marked for removal is ready to be written.
    pub fn is_fully_resolved(&self) -> bool {
        self.fix_target.is_some()
            && self
                .entries()
                .filter(|e| !e.marked_for_removal)
                .all(|e| e.ready_to_fix)
    }
}

/// Counts for host-side reporting of a session's current state.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub path_change_groups: usize,
    /// Groups moved or renamed (not deleted).
    pub changed: usize,
    pub deleted: usize,
    pub missing_groups: usize,
    /// Missing groups without a fix target that still hold live entries.
    pub unresolved: usize,
    pub ready_entries: usize,
    pub entries_marked_for_removal: usize,
}

/// Aggregate tracking state from snapshot to apply.
#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) cfg: Config,
    pub(crate) classifier: BindingClassifier,
    pub(crate) ids: IdAllocator,
    pub(crate) root: NodeHandle,
    pub(crate) scope: ClipScope,
    pub(crate) scoped_clips: Vec<ClipId>,
    pub(crate) path_change_groups: IndexMap<String, PathChangeGroup>,
    pub(crate) missing_groups: IndexMap<String, MissingGroup>,
    pub ignore_unresolved_missing: bool,
}

impl Session {
    pub(crate) fn empty(
        cfg: Config,
        root: NodeHandle,
        scope: ClipScope,
        scoped_clips: Vec<ClipId>,
    ) -> Self {
        Self {
            classifier: BindingClassifier::new(&cfg),
            ignore_unresolved_missing: cfg.ignore_unresolved_missing,
            cfg,
            ids: IdAllocator::new(),
            root,
            scope,
            scoped_clips,
            path_change_groups: IndexMap::new(),
            missing_groups: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn scope(&self) -> &ClipScope {
        &self.scope
    }

    /// Clips resolved from the scope at snapshot time.
    pub fn scoped_clips(&self) -> &[ClipId] {
        &self.scoped_clips
    }

    pub fn path_change_groups(&self) -> impl Iterator<Item = &PathChangeGroup> {
        self.path_change_groups.values()
    }

    pub fn missing_groups(&self) -> impl Iterator<Item = &MissingGroup> {
        self.missing_groups.values()
    }

    pub fn path_change_group(&self, original_path: &str) -> Option<&PathChangeGroup> {
        self.path_change_groups.get(original_path)
    }

    pub fn missing_group(&self, original_path: &str) -> Option<&MissingGroup> {
        self.missing_groups.get(original_path)
    }

    pub fn entry(&self, id: EntryId) -> Option<&CurveEntry> {
        self.missing_groups
            .values()
            .flat_map(|g| g.entries())
            .find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.path_change_groups.is_empty() && self.missing_groups.is_empty()
    }

    pub fn set_ignore_unresolved_missing(&mut self, ignore: bool) {
        self.ignore_unresolved_missing = ignore;
    }

    /// Flag (or unflag) entries for removal. Returns how many entries were found.
    /// Readiness of every touched group is recomputed against its fix target.
    pub fn mark_for_removal<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        entries: &[EntryId],
        marked: bool,
    ) -> Result<usize, RedirectError> {
        for id in entries {
            if self.entry(*id).is_none() {
                return Err(RedirectError::UnknownEntry(*id));
            }
        }
        let mut touched = 0;
        let keys: Vec<String> = self.missing_groups.keys().cloned().collect();
        for key in keys {
            let mut changed = false;
            if let Some(group) = self.missing_groups.get_mut(&key) {
                for entry in group.entries_mut().filter(|e| entries.contains(&e.id)) {
                    entry.marked_for_removal = marked;
                    touched += 1;
                    changed = true;
                }
            }
            if changed {
                self.refresh_readiness(tree, &key);
            }
        }
        Ok(touched)
    }

    /// Flag (or unflag) every entry of a missing group for removal.
    pub fn mark_group_for_removal<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        original_path: &str,
        marked: bool,
    ) -> Result<usize, RedirectError> {
        let ids: Vec<EntryId> = self
            .missing_groups
            .get(original_path)
            .ok_or_else(|| RedirectError::UnknownGroup(original_path.to_string()))?
            .entries()
            .map(|e| e.id)
            .collect();
        self.mark_for_removal(tree, &ids, marked)
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            path_change_groups: self.path_change_groups.len(),
            missing_groups: self.missing_groups.len(),
            ..SessionSummary::default()
        };
        for group in self.path_change_groups.values() {
            if group.is_deleted {
                summary.deleted += 1;
            } else if group.is_changed() {
                summary.changed += 1;
            }
        }
        for group in self.missing_groups.values() {
            if group.fix_target.is_none() && group.has_live_entries() {
                summary.unresolved += 1;
            }
            for entry in group.entries() {
                if entry.marked_for_removal {
                    summary.entries_marked_for_removal += 1;
                } else if entry.ready_to_fix {
                    summary.ready_entries += 1;
                }
            }
        }
        summary
    }
}
