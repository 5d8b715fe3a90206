//! Reconciliation: re-resolve tracked identities against the current tree.
//!
//! Run after every hierarchy edit (or once per host refresh) and before any decision
//! that reads `current_path` / `is_deleted`. The pass is idempotent.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ids::NodeHandle;
use crate::path;
use crate::scene::SceneTree;
use crate::session::{PathChangeGroup, Session};

/// What one reconciliation pass observed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Path-change groups whose node is gone (or left the tracked subtree).
    pub deleted: usize,
    /// Path-change groups whose node lives at a different path than captured.
    pub moved: usize,
    /// Missing groups that migrated to path-change groups in this pass.
    pub healed: usize,
}

impl Session {
    pub fn reconcile<T: SceneTree + ?Sized>(&mut self, tree: &T) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let root = self.root;

        for group in self.path_change_groups.values_mut() {
            match path::relative_path(tree, root, group.handle) {
                Some(current) => {
                    group.is_deleted = false;
                    group.current_path = Some(current);
                    if group.is_changed() {
                        report.moved += 1;
                    }
                }
                None => {
                    group.is_deleted = true;
                    group.current_path = None;
                    report.deleted += 1;
                }
            }
        }

        report.healed = self.heal_missing(tree);
        if report.healed > 0 || report.deleted > 0 || report.moved > 0 {
            debug!("reconcile: {report:?}");
        }
        report
    }

    /// Migrate missing groups whose original path reappeared carrying every required
    /// (non-structural) component type.
    fn heal_missing<T: SceneTree + ?Sized>(&mut self, tree: &T) -> usize {
        let root = self.root;
        let healable: Vec<(String, NodeHandle)> = self
            .missing_groups
            .values()
            .filter_map(|group| {
                let node = path::resolve(tree, root, &group.original_path)?;
                let components = tree.components_of(node);
                group
                    .required_types()
                    .iter()
                    .all(|ty| self.cfg.is_structural(ty) || components.contains(ty))
                    .then(|| (group.original_path.clone(), node))
            })
            .collect();

        for (key, node) in &healable {
            let Some(missing) = self.missing_groups.shift_remove(key) else {
                continue;
            };
            let target = self
                .path_change_groups
                .entry(key.clone())
                .or_insert_with(|| PathChangeGroup::new(key.clone(), *node));
            for entry in missing.entries() {
                target.add_binding(entry.binding.clone());
            }
            debug!("reconcile: '{key}' reappeared, tracking it as a path change");
        }
        healable.len()
    }
}
