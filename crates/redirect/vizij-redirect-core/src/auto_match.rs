//! Heuristic bulk resolution of missing groups by unique node name.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::path;
use crate::scene::SceneTree;
use crate::session::Session;

/// Outcome counts of one auto-match pass. Unmatched groups are a normal outcome.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoMatchReport {
    /// Exactly one same-named node, carrying every required component: assigned.
    pub matched: usize,
    /// Zero or several same-named nodes: left unassigned.
    pub ambiguous: usize,
    /// Exactly one same-named node lacking a required component: left unassigned.
    pub invalid: usize,
}

impl Session {
    /// For every missing group without a fix target, look for the one live node under the
    /// root named like the missing node and assign it when its components suffice.
    pub fn auto_match<T: SceneTree + ?Sized>(&mut self, tree: &T) -> AutoMatchReport {
        let mut report = AutoMatchReport::default();
        let pending: Vec<String> = self
            .missing_groups
            .values()
            .filter(|g| g.fix_target.is_none())
            .map(|g| g.original_path.clone())
            .collect();

        for key in pending {
            let name = path::leaf_name(&key).to_string();
            let candidates = path::find_by_name(tree, self.root, &name);
            let [candidate] = candidates.as_slice() else {
                debug!("auto-match: '{key}' has {} node(s) named '{name}'", candidates.len());
                report.ambiguous += 1;
                continue;
            };
            if self.assign_fix_target(tree, &key, Some(*candidate)).is_err() {
                report.invalid += 1;
                continue;
            }
            if self.components_satisfied(tree, &key) {
                report.matched += 1;
            } else {
                debug!("auto-match: '{key}' candidate lacks required components");
                if let Some(group) = self.missing_groups.get_mut(&key) {
                    group.fix_target = None;
                }
                self.refresh_readiness(tree, &key);
                report.invalid += 1;
            }
        }
        report
    }
}
