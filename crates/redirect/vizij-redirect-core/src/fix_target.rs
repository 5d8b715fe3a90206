//! Fix targets: replacement nodes for missing groups and per-entry readiness.
//!
//! A candidate is accepted only when it is the tracked root or one of its descendants.
//! Readiness is derived: an entry is ready when the target carries its component type
//! (structural types always qualify) and, for blend-shape curves, the target's mesh
//! offers at least one blend shape.

use log::{debug, warn};

use crate::error::RedirectError;
use crate::ids::{EntryId, NodeHandle};
use crate::path;
use crate::scene::SceneTree;
use crate::session::Session;

impl Session {
    /// Assign (or clear, with `None`) the fix target of a missing group.
    ///
    /// On containment failure the group's current target is left untouched and the
    /// error names the offending node's path.
    pub fn assign_fix_target<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        original_path: &str,
        candidate: Option<NodeHandle>,
    ) -> Result<(), RedirectError> {
        if !self.missing_groups.contains_key(original_path) {
            return Err(RedirectError::UnknownGroup(original_path.to_string()));
        }
        if let Some(node) = candidate {
            if path::relative_path(tree, self.root, node).is_none() {
                let path = path::absolute_path(tree, node)
                    .unwrap_or_else(|| format!("<destroyed node {}>", node.0));
                warn!("fix target '{path}' for '{original_path}' lies outside the tracked root");
                return Err(RedirectError::Containment { path });
            }
        }
        if let Some(group) = self.missing_groups.get_mut(original_path) {
            group.fix_target = candidate;
        }
        self.refresh_readiness(tree, original_path);
        debug!("fix target for '{original_path}' set to {candidate:?}");
        Ok(())
    }

    /// Override the blend-shape name an entry will be written under.
    pub fn set_blend_shape_name(
        &mut self,
        entry: EntryId,
        name: &str,
    ) -> Result<(), RedirectError> {
        let target = self
            .missing_groups
            .values_mut()
            .flat_map(|g| g.entries_mut())
            .find(|e| e.id == entry)
            .ok_or(RedirectError::UnknownEntry(entry))?;
        match target.blend_shape.as_mut() {
            Some(bs) if bs.available_names.iter().any(|n| n == name) => {
                bs.candidate_name = Some(name.to_string());
                Ok(())
            }
            _ => Err(RedirectError::UnknownBlendShape {
                entry,
                name: name.to_string(),
            }),
        }
    }

    /// True when every required component type of the group is carried by its target.
    pub fn components_satisfied<T: SceneTree + ?Sized>(
        &self,
        tree: &T,
        original_path: &str,
    ) -> bool {
        let Some(group) = self.missing_groups.get(original_path) else {
            return false;
        };
        let Some(target) = group.fix_target.filter(|n| tree.is_alive(*n)) else {
            return false;
        };
        let components = tree.components_of(target);
        group
            .required_types()
            .iter()
            .all(|ty| self.cfg.is_structural(ty) || components.contains(ty))
    }

    /// Recompute `ready_to_fix` (and blend-shape candidates) for every entry of a group.
    pub(crate) fn refresh_readiness<T: SceneTree + ?Sized>(
        &mut self,
        tree: &T,
        original_path: &str,
    ) {
        let Some(group) = self.missing_groups.get_mut(original_path) else {
            return;
        };
        let target = group.fix_target.filter(|n| tree.is_alive(*n));
        let components = target.map(|n| tree.components_of(n));
        let blend_shapes = target.map(|n| tree.blend_shape_names(n)).unwrap_or_default();

        for (ty, entries) in group.buckets.iter_mut() {
            let satisfied = components
                .as_ref()
                .is_some_and(|c| self.cfg.is_structural(ty) || c.contains(ty));
            for entry in entries.iter_mut() {
                if let Some(bs) = entry.blend_shape.as_mut() {
                    if target.is_some() {
                        bs.refresh(blend_shapes.clone());
                    } else {
                        bs.reset();
                    }
                }
                entry.ready_to_fix = !entry.marked_for_removal
                    && satisfied
                    && entry
                        .blend_shape
                        .as_ref()
                        .map_or(true, |bs| bs.candidate_name.is_some());
            }
        }
    }
}
