//! Snapshot: capture the baseline path of every curve in a clip scope.
//!
//! Bindings whose path resolves land in a `PathChangeGroup` holding a stable handle to
//! the resolved node; bindings whose path does not resolve land, with their payload,
//! in a `MissingGroup` bucket for their component type. Empty curves are dropped.

use log::{debug, info};

use crate::binding::CurveBinding;
use crate::config::Config;
use crate::curve::{ClipScope, CurveStore};
use crate::error::RedirectError;
use crate::ids::{ClipId, NodeHandle};
use crate::path;
use crate::scene::SceneTree;
use crate::session::{BlendShapeInfo, CurveEntry, MissingGroup, PathChangeGroup, Session};

/// Builds a populated [`Session`] from a clip scope and a tree root.
pub struct SnapshotBuilder<'a, T: SceneTree + ?Sized, S: CurveStore + ?Sized> {
    tree: &'a T,
    store: &'a S,
    cfg: Config,
}

impl<'a, T: SceneTree + ?Sized, S: CurveStore + ?Sized> SnapshotBuilder<'a, T, S> {
    pub fn new(tree: &'a T, store: &'a S) -> Self {
        Self::with_config(tree, store, Config::default())
    }

    pub fn with_config(tree: &'a T, store: &'a S, cfg: Config) -> Self {
        Self { tree, store, cfg }
    }

    /// Resolve `scope` through the store and capture every binding of every clip.
    pub fn build(&self, root: NodeHandle, scope: ClipScope) -> Result<Session, RedirectError> {
        let clips = self.store.resolve_scope(&scope);
        if clips.is_empty() {
            debug!("snapshot: scope {scope:?} resolved to no clips");
            return Err(RedirectError::EmptyScope);
        }
        if !self.tree.is_alive(root) {
            return Err(RedirectError::RootNotFound);
        }

        let mut session = Session::empty(self.cfg.clone(), root, scope, clips.clone());
        for clip in clips {
            for binding in self.store.bindings(clip) {
                self.capture(&mut session, clip, binding);
            }
        }

        info!(
            "snapshot: {} clip(s), {} resolved path(s), {} missing path(s)",
            session.scoped_clips.len(),
            session.path_change_groups.len(),
            session.missing_groups.len()
        );
        Ok(session)
    }

    fn capture(&self, session: &mut Session, clip: ClipId, binding: CurveBinding) {
        if let Some(node) = path::resolve(self.tree, session.root, &binding.path) {
            session
                .path_change_groups
                .entry(binding.path.clone())
                .or_insert_with(|| PathChangeGroup::new(binding.path.clone(), node))
                .add_binding(binding);
            return;
        }

        let payload = match self.store.read_curve(clip, &binding) {
            Some(payload) if !payload.is_empty() => payload,
            _ => return,
        };
        let classifier = &session.classifier;
        let (ty, prop) = (&binding.component_type, binding.property_name.as_str());
        let group = classifier.canonical_group(ty, prop);
        let blend_shape = if classifier.is_blend_shape_property(ty, prop) {
            classifier
                .blend_shape_name(&binding.property_name)
                .map(BlendShapeInfo::new)
        } else {
            None
        };
        let entry = CurveEntry {
            id: session.ids.alloc_entry(),
            clip,
            binding,
            payload,
            group,
            blend_shape,
            marked_for_removal: false,
            ready_to_fix: false,
        };
        session
            .missing_groups
            .entry(entry.binding.path.clone())
            .or_insert_with(|| MissingGroup::new(entry.binding.path.clone()))
            .add_entry(entry);
    }
}

impl Session {
    /// Snapshot `scope` under `root` with the given config.
    pub fn start<T, S>(
        tree: &T,
        store: &S,
        root: NodeHandle,
        scope: ClipScope,
        cfg: Config,
    ) -> Result<Session, RedirectError>
    where
        T: SceneTree + ?Sized,
        S: CurveStore + ?Sized,
    {
        SnapshotBuilder::with_config(tree, store, cfg).build(root, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurvePayload, ScalarKey};
    use crate::memory::{MemoryCurveStore, MemoryScene};

    fn keys() -> CurvePayload {
        CurvePayload::Scalar(vec![ScalarKey::new(0.0, 0.0), ScalarKey::new(1.0, 1.0)])
    }

    #[test]
    fn partitions_resolved_and_missing_paths() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let hips = scene.add_child(root, "Hips");
        scene.add_child(hips, "Arm");

        let mut store = MemoryCurveStore::new();
        let a = store.add_clip("Walk");
        let b = store.add_clip("Run");
        for clip in [a, b] {
            store.write_curve(
                clip,
                &CurveBinding::scalar("Hips/Arm", "Transform", "m_LocalPosition.x"),
                keys(),
            );
            store.write_curve(
                clip,
                &CurveBinding::scalar("Hips/Leg", "Transform", "m_LocalPosition.x"),
                keys(),
            );
        }
        // empty curves are not tracked
        store.write_curve(
            a,
            &CurveBinding::scalar("Gone", "Transform", "m_LocalScale.x"),
            CurvePayload::Scalar(vec![]),
        );

        let session =
            Session::start(&scene, &store, root, ClipScope::Clips(vec![a, b]), Config::default())
                .unwrap();

        let resolved = session.path_change_group("Hips/Arm").unwrap();
        assert_eq!(resolved.bindings.len(), 1, "dedup across clips by triple");
        let missing = session.missing_group("Hips/Leg").unwrap();
        assert_eq!(missing.entry_count(), 2, "one entry per clip");
        assert_eq!(missing.entries().next().unwrap().group, "Position");
        assert!(session.missing_group("Gone").is_none());
    }

    #[test]
    fn empty_scope_creates_no_session() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let store = MemoryCurveStore::new();
        let err =
            Session::start(&scene, &store, root, ClipScope::Clips(vec![]), Config::default())
                .unwrap_err();
        assert_eq!(err, RedirectError::EmptyScope);
    }

    #[test]
    fn blend_shape_metadata_is_precomputed() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Avatar");
        let mut store = MemoryCurveStore::new();
        let clip = store.add_clip("Face");
        store.write_curve(
            clip,
            &CurveBinding::scalar("Hips/Eye", "SkinnedMeshRenderer", "blendShape.Blink"),
            keys(),
        );

        let session =
            Session::start(&scene, &store, root, ClipScope::Clips(vec![clip]), Config::default())
                .unwrap();
        let entry = session.missing_group("Hips/Eye").unwrap().entries().next().unwrap();
        assert_eq!(entry.group, "BlendShape");
        assert_eq!(entry.blend_shape.as_ref().unwrap().original_name, "Blink");
        assert!(!entry.ready_to_fix);
    }
}
