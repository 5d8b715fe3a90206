//! Apply: the terminal bulk rewrite of a session.
//!
//! Steps, in order:
//! 1. reconcile once more (the tree may have changed since the last view),
//! 2. re-derive the clip set from the session's scope,
//! 3. plan redirects or removals for every changed path-change group,
//! 4. plan fixes or removals for every entry of every missing group (unless ignored),
//! 5. commit the plan: every old binding is cleared before any new one is written,
//! 6. persist touched clips.
//!
//! Planning only reads the store, so groups whose old and new paths overlap (swaps,
//! chains of renames) each carry their own original payload. No binding is ever left
//! pointing at a node that cannot be proven live: entries that cannot be fixed are
//! removed. The session is consumed whatever the outcome.

use std::fmt;

use hashbrown::HashSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::binding::CurveBinding;
use crate::curve::{CurvePayload, CurveStore};
use crate::error::RedirectError;
use crate::ids::ClipId;
use crate::path;
use crate::scene::SceneTree;
use crate::session::{CurveEntry, Session};

/// Aggregate outcome of an apply pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyReport {
    /// Curves rewritten at a moved/renamed node's current path.
    pub modified: usize,
    /// Missing curves rewritten at their fix target.
    pub fixed: usize,
    /// Curves cleared without replacement.
    pub removed: usize,
    /// Missing groups left untouched because unresolved groups were ignored.
    pub skipped_groups: usize,
    pub clips_touched: usize,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.modified == 0 && self.fixed == 0 && self.removed == 0
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modified, {} fixed, {} removed across {} clip(s)",
            self.modified, self.fixed, self.removed, self.clips_touched
        )?;
        if self.skipped_groups > 0 {
            write!(f, " ({} unresolved group(s) skipped)", self.skipped_groups)?;
        }
        Ok(())
    }
}

/// Store mutations gathered over every group, committed in one sweep.
#[derive(Debug, Default)]
struct RewriteBatch {
    clears: Vec<(ClipId, CurveBinding)>,
    writes: Vec<(ClipId, CurveBinding, CurvePayload)>,
}

impl RewriteBatch {
    fn clear(&mut self, clip: ClipId, binding: CurveBinding) {
        self.clears.push((clip, binding));
    }

    fn write(&mut self, clip: ClipId, binding: CurveBinding, payload: CurvePayload) {
        self.writes.push((clip, binding, payload));
    }

    /// Clears first, then writes; returns the set of clips touched.
    fn commit<S: CurveStore + ?Sized>(self, store: &mut S) -> HashSet<ClipId> {
        let mut touched = HashSet::new();
        for (clip, binding) in &self.clears {
            store.clear_curve(*clip, binding);
            touched.insert(*clip);
        }
        for (clip, binding, payload) in self.writes {
            store.write_curve(clip, &binding, payload);
            touched.insert(clip);
        }
        touched
    }
}

impl Session {
    /// Rewrite every clip in scope and end the session.
    ///
    /// Returns `RedirectError::Persist` when the rewrite completed but the store failed
    /// to persist it; the in-memory clips are modified either way.
    pub fn apply<T, S>(mut self, tree: &T, store: &mut S) -> Result<ApplyReport, RedirectError>
    where
        T: SceneTree + ?Sized,
        S: CurveStore + ?Sized,
    {
        self.reconcile(tree);
        let clips = store.resolve_scope(&self.scope);
        let mut report = ApplyReport::default();
        let mut batch = RewriteBatch::default();

        self.plan_path_changes(&*store, &clips, &mut report, &mut batch);
        self.plan_missing(tree, &mut report, &mut batch);

        let touched = batch.commit(&mut *store);
        report.clips_touched = touched.len();
        info!("apply: {report}");
        if self.cfg.persist_on_apply && !touched.is_empty() {
            store.persist().map_err(|e| {
                warn!("apply: {e}");
                RedirectError::from(e)
            })?;
        }
        Ok(report)
    }

    fn plan_path_changes<S: CurveStore + ?Sized>(
        &self,
        store: &S,
        clips: &[ClipId],
        report: &mut ApplyReport,
        batch: &mut RewriteBatch,
    ) {
        for group in self.path_change_groups.values().filter(|g| g.is_changed()) {
            let new_path = group.current_path.as_deref().filter(|_| !group.is_deleted);
            for binding in &group.bindings {
                for clip in clips {
                    let Some(payload) = store.read_curve(*clip, binding) else {
                        continue;
                    };
                    batch.clear(*clip, binding.clone());
                    match new_path {
                        Some(path) => {
                            batch.write(*clip, binding.with_path(path), payload);
                            report.modified += 1;
                        }
                        None => report.removed += 1,
                    }
                }
            }
        }
    }

    fn plan_missing<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        report: &mut ApplyReport,
        batch: &mut RewriteBatch,
    ) {
        let keys: Vec<String> = self.missing_groups.keys().cloned().collect();
        for key in keys {
            let Some(group) = self.missing_groups.get(&key) else {
                continue;
            };
            let unresolved = group.fix_target.is_none() && group.has_live_entries();
            if self.ignore_unresolved_missing && unresolved {
                report.skipped_groups += 1;
                continue;
            }
            let new_path = group
                .fix_target
                .and_then(|node| path::relative_path(tree, self.root, node));
            if new_path.is_some() {
                // the target's components may have changed since assignment
                self.refresh_readiness(tree, &key);
            }
            let Some(group) = self.missing_groups.get(&key) else {
                continue;
            };
            for entry in group.entries() {
                batch.clear(entry.clip, entry.binding.clone());
                match new_path.as_deref() {
                    Some(path) if !entry.marked_for_removal && entry.ready_to_fix => {
                        let binding = self.rewritten_binding(entry, path);
                        batch.write(entry.clip, binding, entry.payload.clone());
                        report.fixed += 1;
                    }
                    _ => report.removed += 1,
                }
            }
        }
    }

    fn rewritten_binding(&self, entry: &CurveEntry, path: &str) -> CurveBinding {
        let binding = entry.binding.with_path(path);
        match entry.blend_shape.as_ref().and_then(|bs| bs.candidate_name.as_deref()) {
            Some(name) => binding.with_property(self.classifier.blend_shape_property(name)),
            None => binding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::curve::{ClipScope, ScalarKey};
    use crate::ids::NodeHandle;
    use crate::memory::{MemoryCurveStore, MemoryScene};

    fn keys() -> CurvePayload {
        CurvePayload::Scalar(vec![ScalarKey::new(0.0, 0.0), ScalarKey::new(0.5, 1.0)])
    }

    fn start(
        scene: &MemoryScene,
        store: &MemoryCurveStore,
        root: NodeHandle,
        clip: ClipId,
    ) -> Session {
        Session::start(scene, store, root, ClipScope::Clips(vec![clip]), Config::default())
            .unwrap()
    }

    #[test]
    fn unchanged_groups_are_left_alone() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        scene.add_child(root, "Hips");
        let mut store = MemoryCurveStore::new();
        let clip = store.add_clip("Idle");
        let binding = CurveBinding::scalar("Hips", "Transform", "m_LocalPosition.y");
        store.write_curve(clip, &binding, keys());

        let session = start(&scene, &store, root, clip);
        let report = session.apply(&scene, &mut store).unwrap();
        assert!(report.is_noop());
        assert_eq!(report.clips_touched, 0);
        assert_eq!(store.persist_count(), 0);
        assert_eq!(store.read_curve(clip, &binding), Some(keys()));
    }

    #[test]
    fn swapped_names_keep_their_own_payloads() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let a = scene.add_child(root, "A");
        let b = scene.add_child(root, "B");
        let mut store = MemoryCurveStore::new();
        let clip = store.add_clip("Idle");
        let at = |p: &str| CurveBinding::scalar(p, "Transform", "m_LocalPosition.x");
        let one = CurvePayload::Scalar(vec![ScalarKey::new(0.0, 1.0)]);
        let two = CurvePayload::Scalar(vec![ScalarKey::new(0.0, 2.0)]);
        store.write_curve(clip, &at("A"), one.clone());
        store.write_curve(clip, &at("B"), two.clone());

        let session = start(&scene, &store, root, clip);
        scene.rename(a, "B");
        scene.rename(b, "A");
        let report = session.apply(&scene, &mut store).unwrap();
        assert_eq!(report.modified, 2);
        assert_eq!(store.read_curve(clip, &at("A")), Some(two));
        assert_eq!(store.read_curve(clip, &at("B")), Some(one));
        assert_eq!(store.curve_count(clip), 2);
    }

    #[test]
    fn ignored_unresolved_groups_keep_their_curves() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let mut store = MemoryCurveStore::new();
        let clip = store.add_clip("Idle");
        let kept = CurveBinding::scalar("Lost", "Transform", "m_LocalPosition.y");
        let dropped = CurveBinding::scalar("Dropped", "Transform", "m_LocalPosition.y");
        store.write_curve(clip, &kept, keys());
        store.write_curve(clip, &dropped, keys());

        let mut session = start(&scene, &store, root, clip);
        session.set_ignore_unresolved_missing(true);
        session.mark_group_for_removal(&scene, "Dropped", true).unwrap();

        let report = session.apply(&scene, &mut store).unwrap();
        assert_eq!(report.skipped_groups, 1);
        assert_eq!(report.removed, 1);
        assert!(store.read_curve(clip, &kept).is_some());
        assert!(store.read_curve(clip, &dropped).is_none());
        assert_eq!(
            report.to_string(),
            "0 modified, 0 fixed, 1 removed across 1 clip(s) (1 unresolved group(s) skipped)"
        );
    }

    #[test]
    fn persist_failure_is_reported_after_the_rewrite() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let mut store = MemoryCurveStore::new();
        let clip = store.add_clip("Idle");
        let binding = CurveBinding::scalar("Lost", "Transform", "m_LocalPosition.y");
        store.write_curve(clip, &binding, keys());
        store.fail_next_persist("disk full");

        let session = start(&scene, &store, root, clip);
        let err = session.apply(&scene, &mut store).unwrap_err();
        assert!(matches!(err, RedirectError::Persist(_)));
        assert!(store.read_curve(clip, &binding).is_none());
    }
}
